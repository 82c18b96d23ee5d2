use crate::config::{FrameworkPatterns, LayerPatterns};
use crate::parser::{descendants, named_children, node_text, string_literal_value, ParsedFile};
use crate::type_resolver::TypeResolver;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tree_sitter::Node;

/// Schema generator - converts Go struct declarations to OpenAPI schemas
///
/// Every struct in every file is extracted eagerly. When the same type name is declared
/// in several files, the declaration from the most authoritative [`Layer`] wins; within one
/// layer the file with the greatest path wins, so the outcome does not depend on the order
/// files are visited in.
pub struct SchemaGenerator {
    patterns: FrameworkPatterns,
    /// Extracted schemas by type name
    schemas: BTreeMap<String, Schema>,
    /// Which extraction currently owns each type name
    provenance: HashMap<String, Provenance>,
    /// Owner type name -> embedded type names, for the winning extraction
    embedded: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
struct Provenance {
    layer: Layer,
    path: PathBuf,
}

/// Logical code layer a source file belongs to, lowest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// No recognised naming convention
    Other,
    /// Presentation layer: handlers, controllers, routers
    Handler,
    /// Business-logic layer
    Service,
    /// Data layer: models and DAOs
    Model,
}

impl Layer {
    /// Classifies a file by its directory names (innermost first), then its package name.
    ///
    /// `relative_path` should be relative to the project root so that directories above
    /// the project never influence the result.
    pub fn classify(relative_path: &Path, package_name: &str, patterns: &LayerPatterns) -> Layer {
        let dirs: Vec<String> = relative_path
            .parent()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        dirs.iter()
            .rev()
            .map(String::as_str)
            .chain(std::iter::once(package_name))
            .find_map(|name| Self::match_name(&name.to_lowercase(), patterns))
            .unwrap_or(Layer::Other)
    }

    fn match_name(name: &str, patterns: &LayerPatterns) -> Option<Layer> {
        if name.is_empty() {
            return None;
        }
        let hit = |markers: &[String]| markers.iter().any(|m| name.contains(m.as_str()));
        if hit(&patterns.model) {
            Some(Layer::Model)
        } else if hit(&patterns.service) {
            Some(Layer::Service)
        } else if hit(&patterns.handler) {
            Some(Layer::Handler)
        } else {
            None
        }
    }
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "date-time", "email", "uri")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Properties for object types
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    /// Required property names for object types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Value schema for map types
    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Schema>>,
}

impl Schema {
    /// A schema with only a `type`
    pub fn typed(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Default::default()
        }
    }

    /// The generic object schema used whenever nothing better is known
    pub fn object() -> Self {
        Self::typed("object")
    }

    /// An array of `items`
    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// A `$ref` to a named component schema
    pub fn reference(type_name: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{}", type_name)),
            ..Default::default()
        }
    }

    /// Builder-style description setter
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Schema for a Go predeclared scalar type, if `name` is one.
pub fn primitive_schema(name: &str) -> Option<Schema> {
    let schema_type = match name {
        "string" => "string",
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32"
        | "uint64" | "uintptr" | "byte" | "rune" => "integer",
        "float32" | "float64" => "number",
        "bool" => "boolean",
        _ => return None,
    };
    Some(Schema::typed(schema_type))
}

/// Serialization options read from the `json` struct tag.
#[derive(Debug, Default, PartialEq, Eq)]
struct JsonTag {
    name: Option<String>,
    omitempty: bool,
    skip: bool,
}

impl SchemaGenerator {
    /// Create a new SchemaGenerator
    pub fn new(patterns: FrameworkPatterns) -> Self {
        debug!("Initializing SchemaGenerator");
        Self {
            patterns,
            schemas: BTreeMap::new(),
            provenance: HashMap::new(),
            embedded: BTreeMap::new(),
        }
    }

    /// Extracts every struct type declared in `file`.
    pub fn analyze_file(&mut self, file: &ParsedFile, layer: Layer) {
        debug!("Extracting structs from {} ({:?} layer)", file.path.display(), layer);

        for type_spec in descendants(file.root())
            .into_iter()
            .filter(|n| n.kind() == "type_spec")
        {
            let (Some(name_node), Some(type_node)) = (
                type_spec.child_by_field_name("name"),
                type_spec.child_by_field_name("type"),
            ) else {
                continue;
            };
            if type_node.kind() != "struct_type" {
                continue;
            }

            let type_name = file.text(name_node).to_string();
            let (mut schema, embedded) = self.extract_struct_schema(file, type_node);
            schema.description = doc_comment(type_spec, &file.source).or_else(|| {
                type_spec
                    .parent()
                    .filter(|p| p.kind() == "type_declaration")
                    .and_then(|p| doc_comment(p, &file.source))
            });

            self.insert_schema(type_name, schema, embedded, layer, &file.path);
        }
    }

    fn insert_schema(
        &mut self,
        type_name: String,
        schema: Schema,
        embedded: Vec<String>,
        layer: Layer,
        path: &Path,
    ) {
        if let Some(existing) = self.provenance.get(&type_name) {
            let wins = layer > existing.layer
                || (layer == existing.layer && path >= existing.path.as_path());
            if !wins {
                debug!(
                    "Keeping {} from {} ({:?}) over {} ({:?})",
                    type_name,
                    existing.path.display(),
                    existing.layer,
                    path.display(),
                    layer
                );
                return;
            }
        }

        debug!("Registered schema {} from {}", type_name, path.display());
        if embedded.is_empty() {
            self.embedded.remove(&type_name);
        } else {
            self.embedded.insert(type_name.clone(), embedded);
        }
        self.provenance.insert(
            type_name.clone(),
            Provenance {
                layer,
                path: path.to_path_buf(),
            },
        );
        self.schemas.insert(type_name, schema);
    }

    /// Copies the properties of embedded types into their owners.
    ///
    /// Properties the owner already declares are kept. Required names are copied for the
    /// properties that were copied. Chains of embedding are expanded innermost first.
    pub fn expand_embedded_fields(&mut self) {
        let owners: Vec<String> = self.embedded.keys().cloned().collect();
        let mut done = HashSet::new();
        for owner in owners {
            self.expand_owner(&owner, &mut done, &mut HashSet::new());
        }
    }

    fn expand_owner(
        &mut self,
        owner: &str,
        done: &mut HashSet<String>,
        in_progress: &mut HashSet<String>,
    ) {
        if done.contains(owner) || !in_progress.insert(owner.to_string()) {
            return;
        }

        let embedded = self.embedded.get(owner).cloned().unwrap_or_default();
        for embedded_type in &embedded {
            if embedded_type == owner {
                continue;
            }
            self.expand_owner(embedded_type, done, in_progress);

            let Some(source) = self.schemas.get(embedded_type).cloned() else {
                debug!("Embedded type {} of {} is unknown", embedded_type, owner);
                continue;
            };
            let Some(target) = self.schemas.get_mut(owner) else {
                break;
            };

            let declared: HashSet<String> = target.properties.keys().cloned().collect();
            for (name, property) in source.properties {
                target.properties.entry(name).or_insert(property);
            }
            for name in source.required {
                if !declared.contains(&name) && !target.required.contains(&name) {
                    target.required.push(name);
                }
            }
        }

        in_progress.remove(owner);
        done.insert(owner.to_string());
    }

    /// Get the schema extracted for a type
    pub fn get_schema(&self, type_name: &str) -> Option<&Schema> {
        self.schemas.get(type_name)
    }

    /// Get all extracted schemas
    pub fn get_schemas(&self) -> &BTreeMap<String, Schema> {
        &self.schemas
    }

    /// Consume the generator, returning all schemas
    pub fn into_schemas(self) -> BTreeMap<String, Schema> {
        self.schemas
    }

    /// Converts one struct body, returning its schema and the embedded type names.
    fn extract_struct_schema(&self, file: &ParsedFile, struct_node: Node) -> (Schema, Vec<String>) {
        let mut schema = Schema::object();
        let mut embedded = Vec::new();

        let Some(field_list) = named_children(struct_node)
            .into_iter()
            .find(|n| n.kind() == "field_declaration_list")
        else {
            return (schema, embedded);
        };

        for field in named_children(field_list)
            .into_iter()
            .filter(|n| n.kind() == "field_declaration")
        {
            let Some(type_node) = field.child_by_field_name("type") else {
                continue;
            };

            let mut cursor = field.walk();
            let names: Vec<String> = field
                .children_by_field_name("name", &mut cursor)
                .map(|n| file.text(n).to_string())
                .collect();

            // Anonymous field, expanded after all files are scanned
            if names.is_empty() {
                if let Some(embedded_name) = TypeResolver::embedded_type_name(type_node, &file.source) {
                    if !embedded.contains(&embedded_name) {
                        embedded.push(embedded_name);
                    }
                }
                continue;
            }

            let tag = field
                .child_by_field_name("tag")
                .and_then(|t| string_literal_value(t, &file.source))
                .unwrap_or_default();
            let json = parse_json_tag(&tag, &self.patterns.json_tag);
            if json.skip {
                continue;
            }

            for field_name in names.iter().filter(|n| is_exported(n)) {
                let property_name = json
                    .name
                    .clone()
                    .unwrap_or_else(|| to_lower_camel_case(field_name));

                let mut property = self.field_schema(type_node, &file.source);
                if let Some(comment) = trailing_comment(field, &file.source)
                    .or_else(|| doc_comment(field, &file.source))
                {
                    property.description = Some(comment);
                }
                self.apply_validation_tags(&tag, &mut property);
                self.apply_comment_tag(&tag, &mut property);

                if !json.omitempty && !schema.required.contains(&property_name) {
                    schema.required.push(property_name.clone());
                }
                schema.properties.insert(property_name, property);
            }
        }

        (schema, embedded)
    }

    /// Determines the schema for a field's declared type
    fn field_schema(&self, type_node: Node, source: &str) -> Schema {
        match type_node.kind() {
            "type_identifier" => self.ident_to_schema(node_text(type_node, source)),
            "pointer_type" | "parenthesized_type" => match named_children(type_node).first() {
                Some(inner) => self.field_schema(*inner, source),
                None => Schema::object(),
            },
            "slice_type" | "array_type" | "implicit_length_array_type" => {
                match type_node.child_by_field_name("element") {
                    Some(element) => Schema::array(self.field_schema(element, source)),
                    None => Schema::object(),
                }
            }
            "qualified_type" => {
                let package = type_node
                    .child_by_field_name("package")
                    .map(|n| node_text(n, source))
                    .unwrap_or_default();
                let name = type_node
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source))
                    .unwrap_or_default();
                self.qualified_type_to_schema(&format!("{}.{}", package, name))
            }
            "map_type" => {
                let value = type_node
                    .child_by_field_name("value")
                    .map(|v| self.field_schema(v, source))
                    .unwrap_or_else(Schema::object);
                Schema {
                    schema_type: Some("object".to_string()),
                    additional_properties: Some(Box::new(value)),
                    ..Default::default()
                }
            }
            _ => Schema::object(),
        }
    }

    /// Converts a bare type name: scalar, already-known struct (inlined), or reference
    fn ident_to_schema(&self, type_name: &str) -> Schema {
        if let Some(schema) = primitive_schema(type_name) {
            return schema;
        }
        if type_name == "any" {
            return Schema::object();
        }
        if let Some(known) = self.schemas.get(type_name) {
            return known.clone();
        }
        Schema::reference(type_name)
    }

    /// Handles types like time.Time
    fn qualified_type_to_schema(&self, qualified_name: &str) -> Schema {
        match self.patterns.qualified_types.get(qualified_name) {
            Some(fixed) => Schema {
                schema_type: Some(fixed.schema_type.clone()),
                format: fixed.format.clone(),
                ..Default::default()
            },
            None => Schema::object(),
        }
    }

    /// Applies binding validation rules.
    ///
    /// `required`, `min` and `max` are recognised but not encoded.
    fn apply_validation_tags(&self, tag: &str, schema: &mut Schema) {
        let Some(rules) = struct_tag_lookup(tag, &self.patterns.validation_tag) else {
            return;
        };

        for rule in rules.split(',').map(str::trim) {
            if rule == "email" {
                schema.format = Some("email".to_string());
            } else if rule == "url" {
                schema.format = Some("uri".to_string());
            } else if let Some(bound) = rule.strip_prefix("gte=") {
                if schema.description.is_none() {
                    schema.description = Some(format!("Must be greater than or equal to {}", bound));
                }
            } else if let Some(bound) = rule.strip_prefix("gt=") {
                if schema.description.is_none() {
                    schema.description = Some(format!("Must be greater than {}", bound));
                }
            }
        }
    }

    /// Uses a column comment (`gorm:"comment:..."`) when no description is set yet
    fn apply_comment_tag(&self, tag: &str, schema: &mut Schema) {
        if schema.description.is_some() {
            return;
        }
        let Some(value) = struct_tag_lookup(tag, &self.patterns.comment_tag) else {
            return;
        };
        let Some((_, rest)) = value.split_once(self.patterns.comment_tag_marker.as_str()) else {
            return;
        };
        let comment = rest
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches(|c| c == '"' || c == '\'');
        if !comment.is_empty() {
            schema.description = Some(comment.to_string());
        }
    }
}

/// Parse the `json` tag: `json:"name,omitempty"`, `json:"-"`
fn parse_json_tag(tag: &str, key: &str) -> JsonTag {
    let Some(value) = struct_tag_lookup(tag, key) else {
        return JsonTag::default();
    };
    if value == "-" {
        return JsonTag {
            skip: true,
            ..Default::default()
        };
    }

    let mut parts = value.split(',');
    let name = parts.next().unwrap_or_default();
    JsonTag {
        name: (!name.is_empty()).then(|| name.to_string()),
        omitempty: parts.any(|option| option == "omitempty"),
        skip: false,
    }
}

/// Looks up `key` in a conventional struct tag string (`key:"value" other:"value"`).
pub fn struct_tag_lookup(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        let name_len = rest
            .find(|c: char| c == ':' || c == '"' || c == ' ' || c.is_control())
            .unwrap_or(rest.len());
        if name_len == 0 || !rest[name_len..].starts_with(":\"") {
            return None;
        }
        let name = &rest[..name_len];
        rest = &rest[name_len + 2..];

        // Scan to the closing quote, honouring backslash escapes
        let mut end = None;
        let mut escaped = false;
        for (i, c) in rest.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    end = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let end = end?;
        let value = &rest[..end];
        rest = &rest[end + 1..];

        if name == key {
            return Some(value.replace("\\\"", "\"").replace("\\\\", "\\"));
        }
    }
}

/// Go visibility: exported identifiers start with an upper-case letter
fn is_exported(name: &str) -> bool {
    name.chars().next().map_or(false, char::is_uppercase)
}

/// Converts PascalCase to camelCase, lowering a leading acronym as a unit
/// (`ID` -> `id`, `UserID` -> `userID`, `HTTPServer` -> `httpServer`).
fn to_lower_camel_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let upper_run = chars.iter().take_while(|c| c.is_uppercase()).count();
    let lower_count = match upper_run {
        0 => return name.to_string(),
        1 => 1,
        n if n == chars.len() => n,
        n if chars[n].is_lowercase() => n - 1,
        n => n,
    };

    chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i < lower_count {
                c.to_lowercase().to_string()
            } else {
                c.to_string()
            }
        })
        .collect()
}

fn comment_text(raw: &str) -> String {
    let text = if let Some(line) = raw.strip_prefix("//") {
        line
    } else {
        raw.trim_start_matches("/*").trim_end_matches("*/")
    };
    text.trim().to_string()
}

fn join_comments(comments: &[Node], source: &str) -> Option<String> {
    let parts: Vec<String> = comments
        .iter()
        .map(|c| comment_text(node_text(*c, source)))
        .filter(|t| !t.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Comment on the same line as the end of `node`
fn trailing_comment(node: Node, source: &str) -> Option<String> {
    let row = node.end_position().row;
    let mut comments: Vec<Node> = named_children_with_comments(node)
        .into_iter()
        .filter(|n| n.kind() == "comment")
        .collect();

    let mut next = node.next_named_sibling();
    while let Some(sibling) = next {
        if sibling.kind() != "comment" || sibling.start_position().row != row {
            break;
        }
        comments.push(sibling);
        next = sibling.next_named_sibling();
    }

    join_comments(&comments, source)
}

/// Comment block directly above `node`, without blank lines in between
fn doc_comment(node: Node, source: &str) -> Option<String> {
    let mut comments = Vec::new();
    let mut expected_row = node.start_position().row;
    let mut prev = node.prev_named_sibling();

    while let Some(sibling) = prev {
        if sibling.kind() != "comment" || sibling.end_position().row + 1 != expected_row {
            break;
        }
        // A comment trailing the previous declaration is not documentation
        if let Some(before) = sibling.prev_named_sibling() {
            if before.kind() != "comment" && before.end_position().row == sibling.start_position().row {
                break;
            }
        }
        comments.push(sibling);
        expected_row = sibling.start_position().row;
        prev = sibling.prev_named_sibling();
    }

    comments.reverse();
    join_comments(&comments, source)
}

fn named_children_with_comments(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;
    use pretty_assertions::assert_eq;

    fn parse_at(path: &str, code: &str) -> ParsedFile {
        AstParser::parse_source(Path::new(path), code.to_string()).unwrap()
    }

    fn generate(code: &str) -> SchemaGenerator {
        let mut generator = SchemaGenerator::new(FrameworkPatterns::default());
        generator.analyze_file(&parse_at("model/user.go", code), Layer::Model);
        generator.expand_embedded_fields();
        generator
    }

    #[test]
    fn test_untagged_scalar_fields_are_all_required() {
        let generator = generate(
            r#"
package model

type User struct {
    Name   string
    Age    int
    Active bool
}
"#,
        );

        let schema = generator.get_schema("User").unwrap();
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert_eq!(
            schema.properties.keys().cloned().collect::<Vec<_>>(),
            vec!["active", "age", "name"]
        );
        assert_eq!(schema.required, vec!["name", "age", "active"]);
        assert_eq!(schema.properties["age"], Schema::typed("integer"));
        assert_eq!(schema.properties["active"], Schema::typed("boolean"));
    }

    #[test]
    fn test_json_tags_rename_skip_and_omitempty() {
        let generator = generate(
            r#"
package model

type User struct {
    ID       int64   `json:"id"`
    Nickname string  `json:"nick_name,omitempty"`
    Password string  `json:"-"`
    Score    float64 `json:",omitempty"`
    secret   string
}
"#,
        );

        let schema = generator.get_schema("User").unwrap();
        assert_eq!(
            schema.properties.keys().cloned().collect::<Vec<_>>(),
            vec!["id", "nick_name", "score"]
        );
        assert_eq!(schema.required, vec!["id"]);
        assert_eq!(schema.properties["score"], Schema::typed("number"));
    }

    #[test]
    fn test_composite_field_types() {
        let generator = generate(
            r#"
package model

import "time"

type Order struct {
    Items     []Item            `json:"items"`
    Owner     *User             `json:"owner"`
    Labels    map[string]string `json:"labels"`
    CreatedAt time.Time         `json:"createdAt"`
    Extra     decimal.Decimal   `json:"extra"`
    Raw       interface{}       `json:"raw"`
}
"#,
        );

        let schema = generator.get_schema("Order").unwrap();
        assert_eq!(schema.properties["items"], Schema::array(Schema::reference("Item")));
        assert_eq!(schema.properties["owner"], Schema::reference("User"));
        assert_eq!(
            schema.properties["labels"],
            Schema {
                schema_type: Some("object".to_string()),
                additional_properties: Some(Box::new(Schema::typed("string"))),
                ..Default::default()
            }
        );
        assert_eq!(
            schema.properties["createdAt"],
            Schema {
                schema_type: Some("string".to_string()),
                format: Some("date-time".to_string()),
                ..Default::default()
            }
        );
        assert_eq!(schema.properties["extra"], Schema::object());
        assert_eq!(schema.properties["raw"], Schema::object());
    }

    #[test]
    fn test_known_type_is_inlined() {
        let generator = generate(
            r#"
package model

type Address struct {
    City string `json:"city"`
}

type User struct {
    Home Address `json:"home"`
}
"#,
        );

        let user = generator.get_schema("User").unwrap();
        let home = &user.properties["home"];
        assert!(home.reference.is_none());
        assert!(home.properties.contains_key("city"));
    }

    #[test]
    fn test_comments_and_tags_fill_descriptions() {
        let generator = generate(
            r#"
package model

// User is an account holder.
type User struct {
    // Login name
    Name  string `json:"name"`
    Email string `json:"email" binding:"required,email"` // contact address
    Site  string `json:"site" binding:"url"`
    Age   int    `json:"age" binding:"gt=0"`
    Level int    `json:"level" binding:"gte=1" gorm:"comment:ignored"`
    Title string `json:"title" gorm:"column:title;comment:'job title'"`
}
"#,
        );

        let schema = generator.get_schema("User").unwrap();
        assert_eq!(schema.description.as_deref(), Some("User is an account holder."));
        assert_eq!(schema.properties["name"].description.as_deref(), Some("Login name"));
        assert_eq!(schema.properties["email"].description.as_deref(), Some("contact address"));
        assert_eq!(schema.properties["email"].format.as_deref(), Some("email"));
        assert_eq!(schema.properties["site"].format.as_deref(), Some("uri"));
        assert!(schema.properties["site"].description.is_none());
        assert_eq!(
            schema.properties["age"].description.as_deref(),
            Some("Must be greater than 0")
        );
        assert_eq!(
            schema.properties["level"].description.as_deref(),
            Some("Must be greater than or equal to 1")
        );
        assert_eq!(schema.properties["title"].description.as_deref(), Some("job title"));
    }

    #[test]
    fn test_trailing_comment_is_not_next_fields_doc() {
        let generator = generate(
            r#"
package model

type User struct {
    Name string `json:"name"` // display name
    Age  int    `json:"age"`
}
"#,
        );

        let schema = generator.get_schema("User").unwrap();
        assert_eq!(schema.properties["name"].description.as_deref(), Some("display name"));
        assert!(schema.properties["age"].description.is_none());
    }

    #[test]
    fn test_multi_name_fields() {
        let generator = generate(
            r#"
package model

type Point struct {
    X, Y float64
}
"#,
        );

        let schema = generator.get_schema("Point").unwrap();
        assert_eq!(schema.required, vec!["x", "y"]);
        assert_eq!(schema.properties["y"], Schema::typed("number"));
    }

    #[test]
    fn test_embedded_fields_are_expanded() {
        let generator = generate(
            r#"
package model

type User struct {
    Base
    Name string `json:"name"`
    ID   string `json:"id,omitempty"`
}

type Base struct {
    ID        int64 `json:"id"`
    CreatedBy string `json:"createdBy"`
    Audit
}

type Audit struct {
    Trace string `json:"trace"`
}
"#,
        );

        let user = generator.get_schema("User").unwrap();
        assert_eq!(
            user.properties.keys().cloned().collect::<Vec<_>>(),
            vec!["createdBy", "id", "name", "trace"]
        );
        // User declares its own optional id; Base's required id does not leak in
        assert_eq!(user.properties["id"], Schema::typed("string"));
        assert_eq!(user.required, vec!["name", "createdBy", "trace"]);
    }

    #[test]
    fn test_self_embedding_terminates() {
        let generator = generate(
            r#"
package model

type A struct {
    B
    X string
}

type B struct {
    A
    Y string
}
"#,
        );

        assert!(generator.get_schema("A").unwrap().properties.contains_key("y"));
        assert!(generator.get_schema("B").unwrap().properties.contains_key("x"));
    }

    #[test]
    fn test_layer_priority_is_order_independent() {
        let handler_src = "package handler\n\ntype User struct {\n    Token string `json:\"token\"`\n}\n";
        let model_src = "package model\n\ntype User struct {\n    Name string `json:\"name\"`\n}\n";

        let run = |files: &[(&str, &str, Layer)]| {
            let mut generator = SchemaGenerator::new(FrameworkPatterns::default());
            for (path, code, layer) in files {
                generator.analyze_file(&parse_at(path, code), *layer);
            }
            generator.get_schema("User").unwrap().clone()
        };

        let forward = run(&[
            ("handler/user.go", handler_src, Layer::Handler),
            ("model/user.go", model_src, Layer::Model),
        ]);
        let backward = run(&[
            ("model/user.go", model_src, Layer::Model),
            ("handler/user.go", handler_src, Layer::Handler),
        ]);

        assert_eq!(forward, backward);
        assert!(forward.properties.contains_key("name"));
        assert!(!forward.properties.contains_key("token"));
    }

    #[test]
    fn test_same_layer_is_order_independent() {
        let a = "package dto\n\ntype Page struct {\n    A int\n}\n";
        let b = "package dto\n\ntype Page struct {\n    B int\n}\n";

        let run = |first: (&str, &str), second: (&str, &str)| {
            let mut generator = SchemaGenerator::new(FrameworkPatterns::default());
            generator.analyze_file(&parse_at(first.0, first.1), Layer::Other);
            generator.analyze_file(&parse_at(second.0, second.1), Layer::Other);
            generator.get_schema("Page").unwrap().clone()
        };

        assert_eq!(
            run(("a/page.go", a), ("b/page.go", b)),
            run(("b/page.go", b), ("a/page.go", a))
        );
    }

    #[test]
    fn test_layer_classification() {
        let patterns = LayerPatterns::default();
        assert_eq!(
            Layer::classify(Path::new("internal/model/user.go"), "model", &patterns),
            Layer::Model
        );
        assert_eq!(
            Layer::classify(Path::new("internal/dao/user.go"), "dao", &patterns),
            Layer::Model
        );
        assert_eq!(
            Layer::classify(Path::new("internal/service/user/user.go"), "user", &patterns),
            Layer::Service
        );
        assert_eq!(
            Layer::classify(Path::new("internal/handler/user.go"), "handler", &patterns),
            Layer::Handler
        );
        assert_eq!(Layer::classify(Path::new("main.go"), "main", &patterns), Layer::Other);
        assert_eq!(Layer::classify(Path::new("pkg/x.go"), "models", &patterns), Layer::Model);
        assert!(Layer::Model > Layer::Service);
        assert!(Layer::Service > Layer::Handler);
        assert!(Layer::Handler > Layer::Other);
    }

    #[test]
    fn test_struct_tag_lookup() {
        let tag = r#"json:"name,omitempty" binding:"required,min=1" gorm:"comment:\"quoted\"""#;
        assert_eq!(struct_tag_lookup(tag, "json").as_deref(), Some("name,omitempty"));
        assert_eq!(struct_tag_lookup(tag, "binding").as_deref(), Some("required,min=1"));
        assert_eq!(struct_tag_lookup(tag, "gorm").as_deref(), Some("comment:\"quoted\""));
        assert_eq!(struct_tag_lookup(tag, "xml"), None);
        assert_eq!(struct_tag_lookup("not a tag", "json"), None);
        assert_eq!(struct_tag_lookup("", "json"), None);
    }

    #[test]
    fn test_lower_camel_case() {
        assert_eq!(to_lower_camel_case("Name"), "name");
        assert_eq!(to_lower_camel_case("UserName"), "userName");
        assert_eq!(to_lower_camel_case("ID"), "id");
        assert_eq!(to_lower_camel_case("UserID"), "userID");
        assert_eq!(to_lower_camel_case("HTTPServer"), "httpServer");
    }
}
