use crate::config::InfoConfig;
use crate::extractor::{HttpMethod, ParameterLocation, RouteInfo, TypeInfo};
use crate::schema_generator::{primitive_schema, Schema};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag used when a path has no usable segment
const DEFAULT_TAG: &str = "Default";
/// Name of the reusable response envelope component
pub const API_RESPONSE_SCHEMA: &str = "ApiResponse";
const JSON_CONTENT_TYPE: &str = "application/json";

/// OpenAPI document builder
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    /// Paths collection (URL path -> PathItem)
    paths: BTreeMap<String, PathItem>,
    /// Component schemas
    schemas: BTreeMap<String, Schema>,
    /// Path segments never used as a tag
    skip_prefixes: Vec<String>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// API version
    pub version: String,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

impl PathItem {
    /// Operation registered for a method, if any
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
        }
    }

    fn set_operation(&mut self, method: HttpMethod, operation: Operation) {
        let slot = match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
        };
        *slot = Some(operation);
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation summary
    pub summary: String,
    /// Grouping tags
    pub tags: Vec<String>,
    /// Parameters (path, query)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    /// Request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses by status code
    pub responses: BTreeMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path, query)
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter is required
    pub required: bool,
    /// Parameter schema
    pub schema: Schema,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Whether the request body is required
    pub required: bool,
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions
    pub schemas: BTreeMap<String, Schema>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    /// API paths
    pub paths: BTreeMap<String, PathItem>,
    /// Components (schemas)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl From<&InfoConfig> for Info {
    fn from(config: &InfoConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: (!config.description.is_empty()).then(|| config.description.clone()),
            version: config.version.clone(),
        }
    }
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info::from(&InfoConfig::default()),
            paths: BTreeMap::new(),
            schemas: BTreeMap::new(),
            skip_prefixes: vec!["api".to_string()],
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, info: &InfoConfig) -> Self {
        self.info = Info::from(info);
        self
    }

    /// Set the path segments that never become tags
    pub fn with_skip_prefixes(mut self, skip_prefixes: Vec<String>) -> Self {
        self.skip_prefixes = skip_prefixes;
        self
    }

    /// Add a linked route to the OpenAPI document
    pub fn add_route(&mut self, route: &RouteInfo) {
        debug!("Adding route: {} {}", route.method.as_str(), route.path);

        let parameters: Vec<Parameter> = route
            .parameters
            .iter()
            .map(|p| Parameter {
                name: p.name.clone(),
                location: p.location.as_str().to_string(),
                required: p.location == ParameterLocation::Path || p.required,
                schema: Schema::typed("string"),
            })
            .collect();

        let request_body = route.method.has_body().then(|| RequestBody {
            required: true,
            content: json_content(
                route
                    .request_body
                    .as_ref()
                    .map(schema_for_type)
                    .unwrap_or_else(Schema::object),
            ),
        });

        let operation = Operation {
            summary: format_handler_name(&route.handler_name),
            tags: vec![extract_tag(&route.path, &self.skip_prefixes)],
            parameters: (!parameters.is_empty()).then_some(parameters),
            request_body,
            responses: standard_responses(route.response_type.as_ref()),
        };

        self.paths
            .entry(route.path.clone())
            .or_default()
            .set_operation(route.method, operation);
    }

    /// Add extracted type schemas to the components section
    pub fn add_schemas(&mut self, schemas: BTreeMap<String, Schema>) {
        debug!("Adding {} component schemas", schemas.len());
        self.schemas.extend(schemas);
    }

    /// Build the final OpenAPI document
    pub fn build(mut self) -> OpenApiDocument {
        debug!("Building final OpenAPI document");

        self.schemas
            .entry(API_RESPONSE_SCHEMA.to_string())
            .or_insert_with(api_response_schema);

        OpenApiDocument {
            openapi: "3.0.0".to_string(),
            info: self.info,
            paths: self.paths,
            components: Some(Components {
                schemas: self.schemas,
            }),
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Schema for a resolved payload type: primitives inline, slices as arrays, maps and
/// untyped values as a generic object, anything else by reference.
pub fn schema_for_type(type_info: &TypeInfo) -> Schema {
    if let Some(element) = type_info.element() {
        return Schema::array(schema_for_type(element));
    }
    if type_info.is_map || type_info.is_generic_object() {
        return Schema::object();
    }
    primitive_schema(&type_info.name).unwrap_or_else(|| Schema::reference(&type_info.name))
}

/// `GetUserList` -> `Get User List`
pub fn format_handler_name(name: &str) -> String {
    let mut summary = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            summary.push(' ');
        }
        summary.push(c);
    }
    summary
}

/// First path segment that is not a placeholder, a version (`v1`) or a skipped prefix,
/// capitalized.
pub fn extract_tag(path: &str, skip_prefixes: &[String]) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .filter(|s| !(s.starts_with('{') && s.ends_with('}')))
        .filter(|s| !is_version_segment(s))
        .find(|s| !skip_prefixes.iter().any(|p| p == s))
        .map(capitalize)
        .unwrap_or_else(|| DEFAULT_TAG.to_string())
}

fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .map_or(false, |rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn json_content(schema: Schema) -> BTreeMap<String, MediaType> {
    let mut content = BTreeMap::new();
    content.insert(JSON_CONTENT_TYPE.to_string(), MediaType { schema });
    content
}

/// The `{code, message, data}` envelope around a payload schema
fn envelope(data: Schema) -> Schema {
    let mut schema = Schema::object();
    schema.properties.insert("code".to_string(), Schema::typed("integer"));
    schema.properties.insert("message".to_string(), Schema::typed("string"));
    schema.properties.insert("data".to_string(), data);
    schema
}

fn api_response_schema() -> Schema {
    let mut schema = Schema::object();
    schema.properties.insert(
        "code".to_string(),
        Schema::typed("integer").with_description("Response code"),
    );
    schema.properties.insert(
        "message".to_string(),
        Schema::typed("string").with_description("Response message"),
    );
    schema.properties.insert(
        "data".to_string(),
        Schema::object().with_description("Response data"),
    );
    schema
}

fn standard_responses(response_type: Option<&TypeInfo>) -> BTreeMap<String, Response> {
    let payload = response_type.map(schema_for_type).unwrap_or_else(Schema::object);

    let mut responses = BTreeMap::new();
    responses.insert(
        "200".to_string(),
        Response {
            description: "Successful response".to_string(),
            content: Some(json_content(envelope(payload))),
        },
    );
    for (code, description) in [
        ("400", "Bad request"),
        ("404", "Not found"),
        ("500", "Internal server error"),
    ] {
        responses.insert(
            code.to_string(),
            Response {
                description: description.to_string(),
                content: None,
            },
        );
    }
    responses
}
