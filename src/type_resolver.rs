//! Resolution of Go type expressions and literal expressions to [`TypeInfo`].
//!
//! There is no type checker here: a type is whatever the syntax spells, with package
//! qualifiers dropped (`model.User` and `User` are the same name) and pointers unwrapped.

use crate::config::FrameworkPatterns;
use crate::extractor::TypeInfo;
use crate::parser::{named_children, node_text};
use log::debug;
use tree_sitter::Node;

/// Type resolver - turns syntax nodes into structured type information
pub struct TypeResolver;

impl TypeResolver {
    /// Resolves a type node such as `*model.User`, `[]User` or `map[string]int`.
    ///
    /// Returns `None` for shapes without a name: anonymous structs, functions, channels.
    pub fn resolve(node: Node, source: &str) -> Option<TypeInfo> {
        match node.kind() {
            "type_identifier" | "identifier" | "field_identifier" => {
                Some(TypeInfo::new(node_text(node, source)))
            }
            "qualified_type" => node
                .child_by_field_name("name")
                .map(|name| TypeInfo::new(node_text(name, source))),
            "pointer_type" | "parenthesized_type" => named_children(node)
                .first()
                .and_then(|inner| Self::resolve(*inner, source)),
            "slice_type" | "array_type" | "implicit_length_array_type" => node
                .child_by_field_name("element")
                .and_then(|element| Self::resolve(element, source))
                .map(TypeInfo::slice),
            "map_type" => {
                let key = node
                    .child_by_field_name("key")
                    .and_then(|k| Self::resolve(k, source))?;
                let value = node
                    .child_by_field_name("value")
                    .and_then(|v| Self::resolve(v, source))
                    .unwrap_or_else(TypeInfo::untyped);
                Some(TypeInfo::map(key, value))
            }
            "interface_type" => Some(TypeInfo::untyped()),
            "generic_type" => node
                .child_by_field_name("type")
                .and_then(|base| Self::resolve(base, source)),
            other => {
                debug!("Unresolvable type node: {}", other);
                None
            }
        }
    }

    /// Name of the type behind an embedded struct field: `Base`, `*Base`, `pkg.Base`.
    pub fn embedded_type_name(node: Node, source: &str) -> Option<String> {
        match node.kind() {
            "type_identifier" => Some(node_text(node, source).to_string()),
            "qualified_type" => node
                .child_by_field_name("name")
                .map(|name| node_text(name, source).to_string()),
            "pointer_type" => named_children(node)
                .first()
                .and_then(|inner| Self::embedded_type_name(*inner, source)),
            "generic_type" => node
                .child_by_field_name("type")
                .and_then(|base| Self::embedded_type_name(base, source)),
            _ => None,
        }
    }

    /// Type of a composite literal or the address of one: `User{..}`, `&dto.User{..}`,
    /// `[]User{..}`.
    ///
    /// Map literals, including the framework's map shorthand (`gin.H{..}`), carry no
    /// payload shape and resolve to `None`.
    pub fn literal_type(expr: Node, source: &str, patterns: &FrameworkPatterns) -> Option<TypeInfo> {
        match expr.kind() {
            "composite_literal" => {
                let type_node = expr.child_by_field_name("type")?;
                if Self::is_map_literal_type(type_node, source, patterns) {
                    return None;
                }
                Self::resolve(type_node, source)
            }
            "unary_expression" if Self::is_address_of(expr, source) => expr
                .child_by_field_name("operand")
                .and_then(|operand| Self::literal_type(operand, source, patterns)),
            "parenthesized_expression" => named_children(expr)
                .first()
                .and_then(|inner| Self::literal_type(*inner, source, patterns)),
            _ => None,
        }
    }

    /// Whether a unary expression is `&operand`.
    pub fn is_address_of(expr: Node, source: &str) -> bool {
        expr.kind() == "unary_expression"
            && expr
                .child_by_field_name("operator")
                .map_or(false, |op| node_text(op, source) == "&")
    }

    fn is_map_literal_type(type_node: Node, source: &str, patterns: &FrameworkPatterns) -> bool {
        match type_node.kind() {
            "map_type" => true,
            "qualified_type" | "type_identifier" => Self::resolve(type_node, source)
                .map_or(false, |t| patterns.is_map_shorthand(&t.name)),
            _ => false,
        }
    }
}
