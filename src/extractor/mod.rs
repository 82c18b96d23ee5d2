//! Route extraction module for parsing router registration calls.
//!
//! This module provides the interface for extracting route information from a web
//! framework's registration calls, plus the route and type model shared by the analysis
//! passes. Gin is the only implementation; see [`gin::GinExtractor`].
//!
//! # Example
//!
//! ```no_run
//! use gin_openapi::config::FrameworkPatterns;
//! use gin_openapi::extractor::{gin::GinExtractor, RouteExtractor};
//! use gin_openapi::parser::AstParser;
//! use std::path::Path;
//!
//! let parsed = AstParser::parse_file(Path::new("main.go")).unwrap();
//! let extractor = GinExtractor::new(FrameworkPatterns::default());
//! let routes = extractor.extract_routes(&[parsed]);
//! println!("Found {} routes", routes.len());
//! ```

pub mod gin;

use crate::parser::ParsedFile;
use std::fmt;

/// Trait for extracting route information from parsed Go files.
///
/// Implementations know how a specific router registers routes and groups.
pub trait RouteExtractor {
    /// Extracts all route information from parsed Go files.
    ///
    /// # Returns
    ///
    /// Returns a vector of `RouteInfo` structs, one for each discovered route across all
    /// files, in file order then source order.
    fn extract_routes(&self, parsed_files: &[ParsedFile]) -> Vec<RouteInfo>;
}

/// Complete information about a single API endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    /// The document path, group prefixes applied (e.g. "/api/v1/users/{id}")
    pub path: String,
    /// The HTTP method for this route
    pub method: HttpMethod,
    /// The name of the handler function
    pub handler_name: String,
    /// Path placeholders, then query parameters once handler info is linked
    pub parameters: Vec<Parameter>,
    /// Resolved request body type, if known
    pub request_body: Option<TypeInfo>,
    /// Resolved response payload type, if known
    pub response_type: Option<TypeInfo>,
}

/// HTTP methods supported by route extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// Parses an upper- or lower-case verb name.
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            "OPTIONS" => Some(HttpMethod::Options),
            "HEAD" => Some(HttpMethod::Head),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Whether requests with this method conventionally carry a body.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

/// Information about a single route parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// The parameter name
    pub name: String,
    /// Where the parameter is read from
    pub location: ParameterLocation,
    /// Whether the parameter is required
    pub required: bool,
}

/// The location where a parameter value is extracted from in an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    /// Path placeholder (e.g., `/users/{id}`)
    Path,
    /// Query string parameter (e.g., `?page=1`)
    Query,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
        }
    }
}

/// A Go type as recovered from source, qualifier stripped.
///
/// Slices and maps keep their element types in `generic_args`, so `[]model.User` is a
/// slice of `User` and `map[string]interface{}` is a map from `string` to `interface{}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// The base type name (e.g. "User", "string"); for slices the element's name
    pub name: String,
    /// Element type for slices; key and value types for maps
    pub generic_args: Vec<TypeInfo>,
    /// Whether this is a slice or array type
    pub is_slice: bool,
    /// Whether this is a map type
    pub is_map: bool,
}

/// Name used for the empty interface and `any`.
pub const UNTYPED: &str = "interface{}";

impl TypeInfo {
    /// Create a new TypeInfo for a named type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generic_args: Vec::new(),
            is_slice: false,
            is_map: false,
        }
    }

    /// Create a TypeInfo for a `[]T` type
    pub fn slice(inner: TypeInfo) -> Self {
        Self {
            name: inner.name.clone(),
            generic_args: vec![inner],
            is_slice: true,
            is_map: false,
        }
    }

    /// Create a TypeInfo for a `map[K]V` type
    pub fn map(key: TypeInfo, value: TypeInfo) -> Self {
        Self {
            name: "map".to_string(),
            generic_args: vec![key, value],
            is_slice: false,
            is_map: true,
        }
    }

    /// Create a TypeInfo for `interface{}`
    pub fn untyped() -> Self {
        Self::new(UNTYPED)
    }

    /// Element type of a slice
    pub fn element(&self) -> Option<&TypeInfo> {
        if self.is_slice {
            self.generic_args.first()
        } else {
            None
        }
    }

    /// Value type of a map
    pub fn map_value(&self) -> Option<&TypeInfo> {
        if self.is_map {
            self.generic_args.get(1)
        } else {
            None
        }
    }

    /// Whether this type carries no usable shape: `interface{}`, `any`, or a map of them.
    pub fn is_generic_object(&self) -> bool {
        if self.is_map {
            return self.map_value().map_or(true, TypeInfo::is_generic_object);
        }
        !self.is_slice && (self.name == UNTYPED || self.name == "any")
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_map {
            let key = self.generic_args.first();
            let value = self.generic_args.get(1);
            return match (key, value) {
                (Some(k), Some(v)) => write!(f, "map[{}]{}", k, v),
                _ => write!(f, "map"),
            };
        }
        match self.element() {
            Some(inner) => write!(f, "[]{}", inner),
            None => write!(f, "{}", self.name),
        }
    }
}

impl RouteInfo {
    /// Create a new RouteInfo with minimal required fields
    pub fn new(path: String, method: HttpMethod, handler_name: String) -> Self {
        Self {
            path,
            method,
            handler_name,
            parameters: Vec::new(),
            request_body: None,
            response_type: None,
        }
    }

    /// Names of the path parameters, in path order
    pub fn path_parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Path)
            .map(|p| p.name.as_str())
    }
}

impl Parameter {
    /// Create a new Parameter
    pub fn new(name: String, location: ParameterLocation, required: bool) -> Self {
        Self {
            name,
            location,
            required,
        }
    }
}
