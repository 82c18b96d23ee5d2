//! Service-layer function resolution.
//!
//! Files below a directory named like the service marker (`service` by default) are read
//! for their exported functions. Each function gets its declared return type and, when
//! the body fills a conventionally named variable (`data`), the concrete type stored in it.

use crate::config::FrameworkPatterns;
use crate::extractor::TypeInfo;
use crate::handler_analyzer::{bindings, BoundValue, ServiceCall};
use crate::parser::{descendants, named_children, node_text, ParsedFile};
use crate::type_resolver::TypeResolver;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Component, Path};
use tree_sitter::Node;

/// Return and data types of one exported service function.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceFuncInfo {
    pub package: String,
    pub function: String,
    /// First result type that is not an error sentinel
    pub return_type: Option<TypeInfo>,
    /// Type assigned to the response variable inside the body
    pub data_type: Option<TypeInfo>,
}

impl ServiceFuncInfo {
    /// The most specific usable type: the data type, else the return type. Generic
    /// objects are rejected at both levels.
    pub fn best_type(&self) -> Option<TypeInfo> {
        self.data_type
            .iter()
            .chain(self.return_type.iter())
            .find(|t| !t.is_generic_object())
            .cloned()
    }
}

/// Service function index keyed by `(package, function)`.
pub struct ServiceResolver {
    patterns: FrameworkPatterns,
    services: BTreeMap<(String, String), ServiceFuncInfo>,
}

impl ServiceResolver {
    pub fn new(patterns: FrameworkPatterns) -> Self {
        Self {
            patterns,
            services: BTreeMap::new(),
        }
    }

    /// Package a file contributes to, if it lives under the service directory.
    ///
    /// The package is the directory right after the marker (`service/user/x.go` belongs
    /// to `user`); a file directly inside the marker directory uses its package clause.
    pub fn service_package(&self, relative_path: &Path, package_name: &str) -> Option<String> {
        let segments: Vec<String> = relative_path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();
        let dir_count = segments.len().saturating_sub(1);
        let marker = segments[..dir_count]
            .iter()
            .position(|s| *s == self.patterns.service_dir)?;

        if marker + 1 < dir_count {
            Some(segments[marker + 1].clone())
        } else if !package_name.is_empty() {
            Some(package_name.to_string())
        } else {
            None
        }
    }

    /// Records every exported function of a service file.
    pub fn analyze_file(&mut self, file: &ParsedFile, relative_path: &Path) {
        let Some(package) = self.service_package(relative_path, &file.package_name) else {
            return;
        };
        let source = file.source.as_str();

        for func in descendants(file.root())
            .into_iter()
            .filter(|n| matches!(n.kind(), "function_declaration" | "method_declaration"))
        {
            let Some(name) = func.child_by_field_name("name") else {
                continue;
            };
            let function = node_text(name, source).to_string();
            if !function.chars().next().map_or(false, char::is_uppercase) {
                continue;
            }

            let return_type = func
                .child_by_field_name("result")
                .and_then(|result| self.return_type(result, source));
            let data_type = func
                .child_by_field_name("body")
                .and_then(|body| self.data_type(body, source));

            debug!(
                "Service {}.{}: returns {:?}, data {:?}",
                package, function, return_type, data_type
            );
            self.services.insert(
                (package.clone(), function.clone()),
                ServiceFuncInfo {
                    package: package.clone(),
                    function,
                    return_type,
                    data_type,
                },
            );
        }
    }

    pub fn get(&self, package: &str, function: &str) -> Option<&ServiceFuncInfo> {
        self.services.get(&(package.to_string(), function.to_string()))
    }

    /// Resolves a deferred handler response.
    pub fn resolve(&self, call: &ServiceCall) -> Option<TypeInfo> {
        self.get(&call.package, &call.function)
            .and_then(ServiceFuncInfo::best_type)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// First result that is not an error sentinel: `(*User, error)` -> `User`.
    fn return_type(&self, result: Node, source: &str) -> Option<TypeInfo> {
        let candidates: Vec<Node> = if result.kind() == "parameter_list" {
            named_children(result)
                .into_iter()
                .filter_map(|p| p.child_by_field_name("type"))
                .collect()
        } else {
            vec![result]
        };

        candidates
            .into_iter()
            .filter_map(|t| TypeResolver::resolve(t, source))
            .find(|t| t.is_slice || t.is_map || !self.patterns.is_error_type(&t.name))
    }

    /// Type stored in the response variable; the first concrete type wins, a generic
    /// object is only kept when nothing concrete turns up.
    fn data_type(&self, body: Node, source: &str) -> Option<TypeInfo> {
        let mut fallback = None;

        for node in descendants(body) {
            for (variable, value) in bindings(node) {
                if node_text(variable, source) != self.patterns.response_variable {
                    continue;
                }
                let candidate = match value {
                    BoundValue::Declared(type_node) => TypeResolver::resolve(type_node, source),
                    BoundValue::Expression(expr) => TypeResolver::literal_type(expr, source, &self.patterns)
                        .or_else(|| allocation_type(expr, source)),
                };
                match candidate {
                    Some(t) if !t.is_generic_object() => return Some(t),
                    Some(t) => {
                        fallback.get_or_insert(t);
                    }
                    None => {}
                }
            }
        }

        fallback
    }
}

/// `make(T, ..)` or `new(T)`.
fn allocation_type(expr: Node, source: &str) -> Option<TypeInfo> {
    if expr.kind() != "call_expression" {
        return None;
    }
    let function = expr.child_by_field_name("function")?;
    if !matches!(node_text(function, source), "make" | "new") {
        return None;
    }
    let arguments = expr.child_by_field_name("arguments")?;
    let first = named_children(arguments).into_iter().next()?;
    // `new(pkg.T)` parses as a selector expression rather than a qualified type
    if first.kind() == "selector_expression" {
        return first
            .child_by_field_name("field")
            .map(|field| TypeInfo::new(node_text(field, source)));
    }
    TypeResolver::resolve(first, source)
}
