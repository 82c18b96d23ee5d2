use crate::config::FrameworkPatterns;
use crate::extractor::{HttpMethod, Parameter, ParameterLocation, RouteExtractor, RouteInfo};
use crate::handler_analyzer::{bindings, BoundValue};
use crate::parser::{descendants, named_children, node_text, string_literal_value, ParsedFile};
use log::{debug, warn};
use std::collections::HashMap;
use tree_sitter::Node;

/// Handler name used when the handler argument has an unexpected shape
const HANDLER_PLACEHOLDER: &str = "handler";

/// Gin route extractor
///
/// Group prefixes are tracked per function: `v1 := r.Group("/api/v1")` binds `/api/v1`
/// to `v1` for the rest of the enclosing function only.
pub struct GinExtractor {
    patterns: FrameworkPatterns,
}

impl RouteExtractor for GinExtractor {
    fn extract_routes(&self, parsed_files: &[ParsedFile]) -> Vec<RouteInfo> {
        let mut routes = Vec::new();

        for parsed_file in parsed_files {
            for func in descendants(parsed_file.root())
                .into_iter()
                .filter(|n| matches!(n.kind(), "function_declaration" | "method_declaration"))
            {
                if let Some(body) = func.child_by_field_name("body") {
                    self.extract_from_scope(body, &parsed_file.source, &mut routes);
                }
            }
        }

        debug!("Extracted {} gin routes", routes.len());
        routes
    }
}

impl GinExtractor {
    pub fn new(patterns: FrameworkPatterns) -> Self {
        Self { patterns }
    }

    fn extract_from_scope(&self, body: Node, source: &str, routes: &mut Vec<RouteInfo>) {
        let mut prefixes: HashMap<String, String> = HashMap::new();

        for node in descendants(body) {
            if node.kind() == "call_expression" {
                if let Some(route) = self.parse_route_call(node, &prefixes, source) {
                    debug!(
                        "Found route: {} {} -> {}",
                        route.method.as_str(),
                        route.path,
                        route.handler_name
                    );
                    routes.push(route);
                }
                continue;
            }

            for (variable, value) in bindings(node) {
                let BoundValue::Expression(expr) = value else {
                    continue;
                };
                if let Some(prefix) = self.group_prefix(expr, &prefixes, source) {
                    let variable = node_text(variable, source).to_string();
                    debug!("Group {} -> {}", variable, prefix);
                    prefixes.insert(variable, prefix);
                }
            }
        }
    }

    /// `receiver.VERB("/path", [middleware..,] handler)`
    fn parse_route_call(
        &self,
        call: Node,
        prefixes: &HashMap<String, String>,
        source: &str,
    ) -> Option<RouteInfo> {
        let function = call.child_by_field_name("function")?;
        if function.kind() != "selector_expression" {
            return None;
        }
        let verb = node_text(function.child_by_field_name("field")?, source);
        if !self.patterns.is_http_method(verb) {
            return None;
        }
        let method = HttpMethod::parse(verb)?;

        let args = named_children(call.child_by_field_name("arguments")?);
        if args.len() < 2 {
            return None;
        }
        let path = string_literal_value(args[0], source)?;

        let prefix = function
            .child_by_field_name("operand")
            .map(|receiver| self.receiver_prefix(receiver, prefixes, source))
            .unwrap_or_default();
        let full_path = self.convert_path_format(&combine_paths(&prefix, &path));

        let handler_name = args
            .last()
            .map(|arg| self.extract_handler_name(*arg, source))
            .unwrap_or_else(|| HANDLER_PLACEHOLDER.to_string());

        let mut route = RouteInfo::new(full_path, method, handler_name);
        route.parameters = extract_path_parameters(&route.path);
        Some(route)
    }

    /// Prefix established by `receiver.Group("/literal")`, relative to the receiver's own
    /// prefix.
    fn group_prefix(
        &self,
        expr: Node,
        prefixes: &HashMap<String, String>,
        source: &str,
    ) -> Option<String> {
        if expr.kind() != "call_expression" {
            return None;
        }
        let function = expr.child_by_field_name("function")?;
        if function.kind() != "selector_expression" {
            return None;
        }
        let method = node_text(function.child_by_field_name("field")?, source);
        if method != self.patterns.group_method {
            return None;
        }
        let args = named_children(expr.child_by_field_name("arguments")?);
        let path = string_literal_value(*args.first()?, source)?;

        let parent = function
            .child_by_field_name("operand")
            .map(|receiver| self.receiver_prefix(receiver, prefixes, source))
            .unwrap_or_default();
        Some(combine_paths(&parent, &path))
    }

    /// Prefix of a route or group receiver: a bound variable, or an inline group call.
    fn receiver_prefix(&self, receiver: Node, prefixes: &HashMap<String, String>, source: &str) -> String {
        match receiver.kind() {
            "identifier" => prefixes
                .get(node_text(receiver, source))
                .cloned()
                .unwrap_or_default(),
            "call_expression" => self
                .group_prefix(receiver, prefixes, source)
                .unwrap_or_default(),
            "parenthesized_expression" => named_children(receiver)
                .first()
                .map(|inner| self.receiver_prefix(*inner, prefixes, source))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Extract handler name from the last argument: `GetUser`, `handler.GetUser`,
    /// `h.user.GetUser`
    fn extract_handler_name(&self, arg: Node, source: &str) -> String {
        match arg.kind() {
            "identifier" => node_text(arg, source).to_string(),
            "selector_expression" => arg
                .child_by_field_name("field")
                .map(|f| node_text(f, source).to_string())
                .unwrap_or_else(|| HANDLER_PLACEHOLDER.to_string()),
            other => {
                warn!("Unrecognised handler argument ({}), using placeholder", other);
                HANDLER_PLACEHOLDER.to_string()
            }
        }
    }

    /// Convert gin path format (:id, *path) to OpenAPI format ({id}, {path})
    fn convert_path_format(&self, path: &str) -> String {
        path.split('/')
            .map(|segment| {
                let mut chars = segment.chars();
                match chars.next() {
                    Some(sigil) if self.patterns.path_param_sigils.contains(&sigil) && segment.len() > 1 => {
                        format!("{{{}}}", chars.as_str())
                    }
                    _ => segment.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Combine a prefix and path, handling slashes correctly
pub fn combine_paths(prefix: &str, path: &str) -> String {
    let combined = if prefix.is_empty() {
        path.to_string()
    } else {
        let prefix = prefix.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            prefix.to_string()
        } else {
            format!("{}/{}", prefix, path)
        }
    };

    if combined.is_empty() {
        "/".to_string()
    } else if combined.starts_with('/') {
        combined
    } else {
        format!("/{}", combined)
    }
}

/// Extract path parameters from a converted path (e.g., "/users/{id}" -> id)
fn extract_path_parameters(path: &str) -> Vec<Parameter> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .map(|name| Parameter::new(name.to_string(), ParameterLocation::Path, true))
        .collect()
}
