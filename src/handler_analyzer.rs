//! Handler signature analysis.
//!
//! A handler is any function or method taking a pointer to the framework's context type
//! (`*gin.Context` by default). Inside each handler two ordered passes run over the body:
//! first every local binding gets a best-effort type, then the context calls are read
//! for the bound request type, the emitted response and the declared parameters.

use crate::config::FrameworkPatterns;
use crate::extractor::TypeInfo;
use crate::parser::{descendants, named_children, node_text, string_literal_value, ParsedFile};
use crate::type_resolver::TypeResolver;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use tree_sitter::Node;

/// What is known about one handler function.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerInfo {
    /// Function or method name
    pub name: String,
    /// Type bound from the request body, if resolved
    pub request_type: Option<TypeInfo>,
    /// Type emitted as the response payload
    pub response: ResponseBinding,
    /// Query parameter names, first occurrence order, deduplicated
    pub query_params: Vec<String>,
    /// Path parameter names read from the context, deduplicated
    pub path_params: Vec<String>,
    /// Every `pkg.Func(..)` result bound to a local variable, in source order
    pub service_calls: Vec<ServiceCall>,
}

/// Response payload of a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBinding {
    /// Nothing recognisable was emitted
    Unresolved,
    /// The payload type is known locally
    Resolved(TypeInfo),
    /// The payload is the result of a service call, resolved once services are known
    PendingServiceCall(ServiceCall),
}

/// A `variable := package.Function(..)` site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCall {
    pub package: String,
    pub function: String,
    pub variable: String,
}

/// Best-effort type of a local variable.
#[derive(Debug, Clone)]
enum LocalBinding {
    Type(TypeInfo),
    ServiceResult(ServiceCall),
}

impl HandlerInfo {
    fn new(name: String) -> Self {
        Self {
            name,
            request_type: None,
            response: ResponseBinding::Unresolved,
            query_params: Vec::new(),
            path_params: Vec::new(),
            service_calls: Vec::new(),
        }
    }
}

/// Collects [`HandlerInfo`] for every handler in a set of files.
pub struct HandlerAnalyzer {
    patterns: FrameworkPatterns,
    handlers: BTreeMap<String, HandlerInfo>,
}

impl HandlerAnalyzer {
    pub fn new(patterns: FrameworkPatterns) -> Self {
        Self {
            patterns,
            handlers: BTreeMap::new(),
        }
    }

    /// Analyzes every handler declared in `file`. A later handler with the same name
    /// replaces an earlier one.
    pub fn analyze_file(&mut self, file: &ParsedFile) {
        let source = file.source.as_str();

        for func in descendants(file.root())
            .into_iter()
            .filter(|n| matches!(n.kind(), "function_declaration" | "method_declaration"))
        {
            let (Some(name), Some(params), Some(body)) = (
                func.child_by_field_name("name"),
                func.child_by_field_name("parameters"),
                func.child_by_field_name("body"),
            ) else {
                continue;
            };
            let Some(context_name) = self.context_parameter(params, source) else {
                continue;
            };

            let name = node_text(name, source).to_string();
            let info = self.analyze_handler(name.clone(), &context_name, body, source);
            debug!(
                "Handler {}: request {:?}, response {:?}",
                name, info.request_type, info.response
            );
            self.handlers.insert(name, info);
        }
    }

    pub fn get_handler(&self, name: &str) -> Option<&HandlerInfo> {
        self.handlers.get(name)
    }

    pub fn into_handlers(self) -> BTreeMap<String, HandlerInfo> {
        self.handlers
    }

    /// Name of the parameter typed `*gin.Context`; empty when it is unnamed.
    fn context_parameter(&self, params: Node, source: &str) -> Option<String> {
        named_children(params)
            .into_iter()
            .filter(|p| p.kind() == "parameter_declaration")
            .find(|p| {
                p.child_by_field_name("type")
                    .map_or(false, |t| self.is_context_pointer(t, source))
            })
            .map(|p| {
                p.child_by_field_name("name")
                    .map(|n| node_text(n, source).to_string())
                    .unwrap_or_default()
            })
    }

    /// A single-level pointer to `<alias>.<Context>`.
    fn is_context_pointer(&self, type_node: Node, source: &str) -> bool {
        if type_node.kind() != "pointer_type" {
            return false;
        }
        let Some(inner) = named_children(type_node).first().copied() else {
            return false;
        };
        if inner.kind() != "qualified_type" {
            return false;
        }
        let field = |name: &str| {
            inner
                .child_by_field_name(name)
                .map(|n| node_text(n, source))
                .unwrap_or_default()
        };
        field("package") == self.patterns.framework_alias
            && field("name") == self.patterns.context_type
    }

    fn analyze_handler(&self, name: String, context_name: &str, body: Node, source: &str) -> HandlerInfo {
        let mut info = HandlerInfo::new(name);
        let nodes = descendants(body);

        let mut locals: HashMap<String, LocalBinding> = HashMap::new();
        for node in &nodes {
            for (variable, value) in bindings(*node) {
                let variable = node_text(variable, source);
                if variable == "_" {
                    continue;
                }
                match value {
                    BoundValue::Declared(type_node) => {
                        if let Some(type_info) = TypeResolver::resolve(type_node, source) {
                            locals.insert(variable.to_string(), LocalBinding::Type(type_info));
                        }
                    }
                    BoundValue::Expression(expr) => {
                        if let Some(call) = service_call(expr, variable, context_name, source) {
                            info.service_calls.push(call.clone());
                            locals.insert(variable.to_string(), LocalBinding::ServiceResult(call));
                        } else if let Some(type_info) =
                            TypeResolver::literal_type(expr, source, &self.patterns)
                        {
                            locals.insert(variable.to_string(), LocalBinding::Type(type_info));
                        }
                    }
                }
            }
        }

        for call in nodes.iter().filter(|n| n.kind() == "call_expression") {
            self.inspect_call(*call, &locals, source, &mut info);
        }

        info
    }

    fn inspect_call(
        &self,
        call: Node,
        locals: &HashMap<String, LocalBinding>,
        source: &str,
        info: &mut HandlerInfo,
    ) {
        let Some(function) = call.child_by_field_name("function") else {
            return;
        };
        let (method, is_selector) = match function.kind() {
            "selector_expression" => match function.child_by_field_name("field") {
                Some(field) => (node_text(field, source), true),
                None => return,
            },
            "identifier" => (node_text(function, source), false),
            _ => return,
        };
        let args = call
            .child_by_field_name("arguments")
            .map(named_children)
            .unwrap_or_default();

        if is_selector && self.patterns.is_request_binding(method) {
            if info.request_type.is_none() {
                info.request_type = args
                    .first()
                    .and_then(|arg| self.request_type(*arg, locals, source));
            }
        } else if is_selector && self.patterns.is_response_method(method) {
            if info.response == ResponseBinding::Unresolved {
                if let Some(payload) = args.get(1) {
                    info.response = self.json_response(*payload, locals, source);
                }
            }
        } else if self.patterns.is_success_wrapper(method) {
            if let Some(payload) = args.get(1) {
                if let Some(response) = self.wrapped_response(*payload, locals, source) {
                    info.response = response;
                }
            }
        } else if is_selector && self.patterns.is_query_method(method) {
            record_literal(args.first(), source, &mut info.query_params);
        } else if is_selector && self.patterns.is_path_param_method(method) {
            record_literal(args.first(), source, &mut info.path_params);
        }
    }

    /// `&req` with a known local type, `req` bound to a known type, or `&T{..}`.
    fn request_type(
        &self,
        arg: Node,
        locals: &HashMap<String, LocalBinding>,
        source: &str,
    ) -> Option<TypeInfo> {
        let variable = if TypeResolver::is_address_of(arg, source) {
            arg.child_by_field_name("operand")
                .filter(|operand| operand.kind() == "identifier")
        } else {
            Some(arg).filter(|a| a.kind() == "identifier")
        };

        if let Some(variable) = variable {
            return match locals.get(node_text(variable, source)) {
                Some(LocalBinding::Type(type_info)) => Some(type_info.clone()),
                _ => None,
            };
        }
        TypeResolver::literal_type(arg, source, &self.patterns)
    }

    /// Second argument of `c.JSON(status, payload)`. `&resp` resolves through `resp`.
    fn json_response(
        &self,
        payload: Node,
        locals: &HashMap<String, LocalBinding>,
        source: &str,
    ) -> ResponseBinding {
        let variable = if TypeResolver::is_address_of(payload, source) {
            payload
                .child_by_field_name("operand")
                .filter(|operand| operand.kind() == "identifier")
        } else {
            Some(payload).filter(|p| p.kind() == "identifier")
        };

        if let Some(variable) = variable {
            return match locals.get(node_text(variable, source)) {
                Some(LocalBinding::Type(type_info)) => ResponseBinding::Resolved(type_info.clone()),
                Some(LocalBinding::ServiceResult(call)) => {
                    ResponseBinding::PendingServiceCall(call.clone())
                }
                None => ResponseBinding::Unresolved,
            };
        }
        match TypeResolver::literal_type(payload, source, &self.patterns) {
            Some(type_info) => ResponseBinding::Resolved(type_info),
            None => ResponseBinding::Unresolved,
        }
    }

    /// Second argument of `tool.SetResponseOK(c, payload)`. Unknown identifiers stand for
    /// themselves.
    fn wrapped_response(
        &self,
        payload: Node,
        locals: &HashMap<String, LocalBinding>,
        source: &str,
    ) -> Option<ResponseBinding> {
        if payload.kind() == "identifier" {
            let name = node_text(payload, source);
            return Some(match locals.get(name) {
                Some(LocalBinding::Type(type_info)) => ResponseBinding::Resolved(type_info.clone()),
                Some(LocalBinding::ServiceResult(call)) => {
                    ResponseBinding::PendingServiceCall(call.clone())
                }
                None => ResponseBinding::Resolved(TypeInfo::new(name)),
            });
        }
        TypeResolver::literal_type(payload, source, &self.patterns).map(ResponseBinding::Resolved)
    }
}

/// Right-hand side of a binding.
pub(crate) enum BoundValue<'tree> {
    /// `var x T`
    Declared(Node<'tree>),
    /// `x := expr`, `x = expr`, `var x = expr`
    Expression(Node<'tree>),
}

/// Variables bound by an assignment, short declaration or var spec, paired with what
/// they are bound to. With a single call on the right, only the first variable receives
/// it (`data, err := svc.Get()`).
pub(crate) fn bindings(node: Node) -> Vec<(Node, BoundValue)> {
    let (names, values, declared) = match node.kind() {
        "short_var_declaration" | "assignment_statement" => {
            let (Some(left), Some(right)) = (
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
            ) else {
                return Vec::new();
            };
            (named_children(left), named_children(right), None)
        }
        "var_spec" => {
            let mut cursor = node.walk();
            let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
            let values = node
                .child_by_field_name("value")
                .map(named_children)
                .unwrap_or_default();
            (names, values, node.child_by_field_name("type"))
        }
        _ => return Vec::new(),
    };

    let names: Vec<Node> = names.into_iter().filter(|n| n.kind() == "identifier").collect();

    if let Some(type_node) = declared {
        return names
            .into_iter()
            .map(|name| (name, BoundValue::Declared(type_node)))
            .collect();
    }
    if values.len() == 1 && names.len() > 1 {
        return vec![(names[0], BoundValue::Expression(values[0]))];
    }
    names
        .into_iter()
        .zip(values)
        .map(|(name, value)| (name, BoundValue::Expression(value)))
        .collect()
}

/// `pkg.Func(..)` where `pkg` is a plain identifier other than the context parameter.
fn service_call(expr: Node, variable: &str, context_name: &str, source: &str) -> Option<ServiceCall> {
    if expr.kind() != "call_expression" {
        return None;
    }
    let function = expr.child_by_field_name("function")?;
    if function.kind() != "selector_expression" {
        return None;
    }
    let operand = function.child_by_field_name("operand")?;
    let field = function.child_by_field_name("field")?;
    if operand.kind() != "identifier" {
        return None;
    }
    let package = node_text(operand, source);
    if package == context_name {
        return None;
    }
    Some(ServiceCall {
        package: package.to_string(),
        function: node_text(field, source).to_string(),
        variable: variable.to_string(),
    })
}

fn record_literal(arg: Option<&Node>, source: &str, into: &mut Vec<String>) {
    let Some(value) = arg.and_then(|a| string_literal_value(*a, source)) else {
        return;
    };
    if !into.contains(&value) {
        into.push(value);
    }
}
