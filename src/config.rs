//! Analyzer configuration and the structural pattern table.
//!
//! Gin is recognised purely by names: the `gin` package alias, the `Context` type,
//! the `Group` method, the binding method family and so on. All of those names live
//! in [`FrameworkPatterns`] so the same analysis passes can be pointed at a router
//! with different naming conventions by swapping the table.
//!
//! A configuration file is YAML (or JSON, which YAML accepts). Every field is
//! optional; missing fields keep their defaults.
//!
//! ```yaml
//! info:
//!   title: Shop API
//! skip_prefixes: [api, open]
//! patterns:
//!   success_wrapper_methods: [SetResponseOK, Success, OK, Fail]
//! ```

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Top-level configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Document metadata
    pub info: InfoConfig,
    /// Directory names never descended into
    pub skip_dirs: Vec<String>,
    /// Path segments ignored when deriving an operation tag
    pub skip_prefixes: Vec<String>,
    /// Framework naming conventions
    pub patterns: FrameworkPatterns,
}

/// Title, description and version written into the document's `info` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoConfig {
    pub title: String,
    pub description: String,
    pub version: String,
}

/// Names used to recognise framework constructs structurally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkPatterns {
    /// Package alias qualifying the context type (`gin` in `*gin.Context`)
    pub framework_alias: String,
    /// Import path of the framework package
    pub framework_import: String,
    /// Per-request context type name
    pub context_type: String,
    /// Method creating a route group
    pub group_method: String,
    /// Route registration methods, one per HTTP verb
    pub http_methods: Vec<String>,
    /// Methods binding the request body into their first argument
    pub request_binding_methods: Vec<String>,
    /// Methods emitting a response payload as their second argument
    pub response_methods: Vec<String>,
    /// Project-level response helpers, `tool.SetResponseOK(c, data)`
    pub success_wrapper_methods: Vec<String>,
    /// Methods reading a query parameter
    pub query_methods: Vec<String>,
    /// Methods reading a path parameter
    pub path_param_methods: Vec<String>,
    /// Literal types that are untyped maps (`gin.H{...}`)
    pub map_shorthand_types: Vec<String>,
    /// Characters introducing a path placeholder segment
    pub path_param_sigils: Vec<char>,
    /// Struct tag carrying the serialized name and `omitempty`
    pub json_tag: String,
    /// Struct tag carrying validation rules
    pub validation_tag: String,
    /// Struct tag carrying a column comment
    pub comment_tag: String,
    /// Marker preceding the comment inside `comment_tag`
    pub comment_tag_marker: String,
    /// Directory name marking the service layer
    pub service_dir: String,
    /// Variable conventionally holding the response payload
    pub response_variable: String,
    /// Result types treated as error sentinels
    pub error_types: Vec<String>,
    /// Qualified external types with a fixed schema, `pkg.Name -> (type, format)`
    pub qualified_types: BTreeMap<String, QualifiedTypeSchema>,
    /// Directory/package name markers for each source layer
    pub layers: LayerPatterns,
}

/// Fixed schema for a qualified external type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedTypeSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Name fragments identifying the logical layer of a source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerPatterns {
    pub model: Vec<String>,
    pub service: Vec<String>,
    pub handler: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            info: InfoConfig::default(),
            skip_dirs: strings(&["vendor", "tools", "testdata", "node_modules"]),
            skip_prefixes: strings(&["api"]),
            patterns: FrameworkPatterns::default(),
        }
    }
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            title: "Auto-Generated API Documentation".to_string(),
            description: "Generated from code analysis".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

impl Default for FrameworkPatterns {
    fn default() -> Self {
        let mut qualified_types = BTreeMap::new();
        qualified_types.insert(
            "time.Time".to_string(),
            QualifiedTypeSchema {
                schema_type: "string".to_string(),
                format: Some("date-time".to_string()),
            },
        );

        Self {
            framework_alias: "gin".to_string(),
            framework_import: "github.com/gin-gonic/gin".to_string(),
            context_type: "Context".to_string(),
            group_method: "Group".to_string(),
            http_methods: strings(&["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"]),
            request_binding_methods: strings(&[
                "ShouldBindJSON",
                "BindJSON",
                "ShouldBind",
                "Bind",
                "ShouldBindQuery",
            ]),
            response_methods: strings(&["JSON"]),
            success_wrapper_methods: strings(&["SetResponseOK", "Success", "OK"]),
            query_methods: strings(&["Query", "DefaultQuery"]),
            path_param_methods: strings(&["Param"]),
            map_shorthand_types: strings(&["H"]),
            path_param_sigils: vec![':', '*'],
            json_tag: "json".to_string(),
            validation_tag: "binding".to_string(),
            comment_tag: "gorm".to_string(),
            comment_tag_marker: "comment:".to_string(),
            service_dir: "service".to_string(),
            response_variable: "data".to_string(),
            error_types: strings(&["error"]),
            qualified_types,
            layers: LayerPatterns::default(),
        }
    }
}

impl Default for LayerPatterns {
    fn default() -> Self {
        Self {
            model: strings(&["model", "dao"]),
            service: strings(&["service"]),
            handler: strings(&["handler", "controller", "api", "router"]),
        }
    }
}

impl AnalyzerConfig {
    /// Loads a configuration file, filling every absent field with its default.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AnalyzerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

impl FrameworkPatterns {
    pub fn is_http_method(&self, name: &str) -> bool {
        self.http_methods.iter().any(|m| m == name)
    }

    pub fn is_request_binding(&self, name: &str) -> bool {
        self.request_binding_methods.iter().any(|m| m == name)
    }

    pub fn is_response_method(&self, name: &str) -> bool {
        self.response_methods.iter().any(|m| m == name)
    }

    pub fn is_success_wrapper(&self, name: &str) -> bool {
        self.success_wrapper_methods.iter().any(|m| m == name)
    }

    pub fn is_query_method(&self, name: &str) -> bool {
        self.query_methods.iter().any(|m| m == name)
    }

    pub fn is_path_param_method(&self, name: &str) -> bool {
        self.path_param_methods.iter().any(|m| m == name)
    }

    pub fn is_map_shorthand(&self, name: &str) -> bool {
        self.map_shorthand_types.iter().any(|m| m == name)
    }

    pub fn is_error_type(&self, name: &str) -> bool {
        self.error_types.iter().any(|m| m == name)
    }
}
