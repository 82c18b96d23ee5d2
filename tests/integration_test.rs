use gin_openapi::{
    analyze,
    config::AnalyzerConfig,
    extractor::HttpMethod,
    openapi_builder::{OpenApiDocument, Operation},
    schema_generator::Schema,
    serializer::{serialize_json, serialize_yaml},
    Analyzer,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Helper function to create a temporary test project
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

/// The shop project under `tests/fixtures/gin_project`
fn shop_project() -> TempDir {
    create_test_project(vec![
        ("main.go", include_str!("fixtures/gin_project/main.go")),
        ("router/router.go", include_str!("fixtures/gin_project/router/router.go")),
        ("handler/user.go", include_str!("fixtures/gin_project/handler/user.go")),
        ("handler/product.go", include_str!("fixtures/gin_project/handler/product.go")),
        ("model/user.go", include_str!("fixtures/gin_project/model/user.go")),
        (
            "service/product/product.go",
            include_str!("fixtures/gin_project/service/product/product.go"),
        ),
        ("dto/product.go", include_str!("fixtures/gin_project/dto/product.go")),
    ])
}

fn operation<'a>(doc: &'a OpenApiDocument, path: &str, method: HttpMethod) -> &'a Operation {
    doc.paths
        .get(path)
        .and_then(|item| item.operation(method))
        .unwrap_or_else(|| panic!("missing {} {}", method.as_str(), path))
}

fn response_data(operation: &Operation) -> &Schema {
    &operation.responses["200"].content.as_ref().expect("200 has content")["application/json"]
        .schema
        .properties["data"]
}

fn request_schema(operation: &Operation) -> &Schema {
    &operation.request_body.as_ref().expect("request body").content["application/json"].schema
}

fn schema<'a>(doc: &'a OpenApiDocument, name: &str) -> &'a Schema {
    &doc.components.as_ref().expect("components").schemas[name]
}

#[test]
fn test_gin_end_to_end_generation() {
    let temp_dir = shop_project();
    let doc = analyze(temp_dir.path()).expect("analysis succeeds");

    assert_eq!(doc.openapi, "3.0.0");
    assert_eq!(doc.info.title, "Auto-Generated API Documentation");
    assert_eq!(
        doc.paths.keys().cloned().collect::<Vec<_>>(),
        vec![
            "/api/v1/products",
            "/api/v1/products/{id}",
            "/api/v1/users",
            "/api/v1/users/{id}",
            "/health",
            "/static/{filepath}",
        ]
    );

    let users = &doc.paths["/api/v1/users/{id}"];
    assert!(users.get.is_some());
    assert!(users.put.is_some());
    assert!(users.post.is_none());

    let get_user = operation(&doc, "/api/v1/users/{id}", HttpMethod::Get);
    assert_eq!(get_user.summary, "Get User");
    assert_eq!(get_user.tags, vec!["Users"]);
    let params = get_user.parameters.as_ref().unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name, "id");
    assert_eq!(params[0].location, "path");
    assert!(params[0].required);
    assert_eq!(response_data(get_user), &Schema::reference("User"));
    assert!(get_user.request_body.is_none());

    let serve = operation(&doc, "/static/{filepath}", HttpMethod::Get);
    assert_eq!(serve.tags, vec!["Static"]);
    assert_eq!(serve.parameters.as_ref().unwrap()[0].name, "filepath");
}

#[test]
fn test_request_and_response_linking() {
    let temp_dir = shop_project();
    let doc = analyze(temp_dir.path()).unwrap();

    let create = operation(&doc, "/api/v1/users", HttpMethod::Post);
    assert_eq!(request_schema(create), &Schema::reference("CreateUserRequest"));
    assert!(create.request_body.as_ref().unwrap().required);
    assert_eq!(response_data(create), &Schema::reference("User"));

    let update = operation(&doc, "/api/v1/users/{id}", HttpMethod::Put);
    assert_eq!(request_schema(update), &Schema::reference("UpdateUserRequest"));
    assert_eq!(response_data(update), &Schema::object());
}

#[test]
fn test_service_results_are_resolved() {
    let temp_dir = shop_project();
    let doc = analyze(temp_dir.path()).unwrap();

    let list = operation(&doc, "/api/v1/products", HttpMethod::Get);
    assert_eq!(response_data(list), &Schema::reference("ProductPage"));
    let query: Vec<(&str, &str, bool)> = list
        .parameters
        .as_ref()
        .unwrap()
        .iter()
        .map(|p| (p.name.as_str(), p.location.as_str(), p.required))
        .collect();
    assert_eq!(
        query,
        vec![("page", "query", false), ("size", "query", false), ("keyword", "query", false)]
    );

    let detail = operation(&doc, "/api/v1/products/{id}", HttpMethod::Get);
    assert_eq!(response_data(detail), &Schema::reference("ProductDetail"));
}

#[test]
fn test_unresolvable_response_falls_back_to_object() {
    let temp_dir = shop_project();
    let doc = analyze(temp_dir.path()).unwrap();

    let health = operation(&doc, "/health", HttpMethod::Get);
    assert_eq!(health.tags, vec!["Health"]);
    assert_eq!(response_data(health), &Schema::object());
    assert_eq!(
        health.responses.keys().cloned().collect::<Vec<_>>(),
        vec!["200", "400", "404", "500"]
    );
    assert_eq!(health.responses["500"].description, "Internal server error");
}

#[test]
fn test_component_schemas() {
    let temp_dir = shop_project();
    let doc = analyze(temp_dir.path()).unwrap();

    let names: Vec<String> = doc.components.as_ref().unwrap().schemas.keys().cloned().collect();
    assert_eq!(
        names,
        vec![
            "ApiResponse",
            "Base",
            "CreateUserRequest",
            "ProductDetail",
            "ProductItem",
            "ProductPage",
            "Profile",
            "UpdateUserRequest",
            "User",
        ]
    );

    // The model layer wins over the handler layer's User
    let user = schema(&doc, "User");
    assert!(!user.properties.contains_key("token"));
    assert!(!user.properties.contains_key("password"));
    assert_eq!(user.required, vec!["name", "email", "id", "createdAt"]);
    assert_eq!(user.description.as_deref(), Some("User is a registered account."));
    assert_eq!(user.properties["name"].description.as_deref(), Some("display name"));
    assert_eq!(user.properties["id"].description.as_deref(), Some("primary key"));
    assert_eq!(user.properties["createdAt"].format.as_deref(), Some("date-time"));
    assert_eq!(user.properties["roles"], Schema::array(Schema::typed("string")));
    assert_eq!(user.properties["profile"], Schema::reference("Profile"));

    let request = schema(&doc, "CreateUserRequest");
    assert_eq!(request.required, vec!["name", "email"]);
    assert_eq!(request.properties["email"].format.as_deref(), Some("email"));
    assert_eq!(
        request.properties["age"].description.as_deref(),
        Some("Must be greater than or equal to 18")
    );

    let profile = schema(&doc, "Profile");
    assert_eq!(profile.required, vec!["bio", "website"]);
    assert_eq!(profile.properties["website"].format.as_deref(), Some("uri"));

    let detail = schema(&doc, "ProductDetail");
    assert_eq!(detail.required, vec!["id", "title", "price"]);
    assert_eq!(
        detail.properties["price"].description.as_deref(),
        Some("Must be greater than 0")
    );
}

#[test]
fn test_output_is_byte_identical_across_runs() {
    let temp_dir = shop_project();

    let first = analyze(temp_dir.path()).unwrap();
    let second = analyze(temp_dir.path()).unwrap();

    assert_eq!(serialize_yaml(&first).unwrap(), serialize_yaml(&second).unwrap());
    assert_eq!(serialize_json(&first).unwrap(), serialize_json(&second).unwrap());
}

#[test]
fn test_model_layer_wins_regardless_of_visit_order() {
    let handler_user = "package handler\n\ntype User struct {\n\tToken string `json:\"token\"`\n}\n";
    let model_user = "package model\n\ntype User struct {\n\tName string `json:\"name\"`\n}\n";

    // "handler" sorts before "model"; "amodel" sorts before "controller"
    let handler_first = create_test_project(vec![
        ("handler/user.go", handler_user),
        ("model/user.go", model_user),
    ]);
    let model_first = create_test_project(vec![
        ("amodel/user.go", model_user),
        ("controller/user.go", handler_user),
    ]);

    let a = analyze(handler_first.path()).unwrap();
    let b = analyze(model_first.path()).unwrap();

    assert_eq!(schema(&a, "User"), schema(&b, "User"));
    assert!(schema(&a, "User").properties.contains_key("name"));
}

#[test]
fn test_empty_project_handling() {
    let temp_dir = create_test_project(vec![("README.md", "# nothing here")]);

    let doc = analyze(temp_dir.path()).unwrap();

    assert!(doc.paths.is_empty());
    assert_eq!(
        doc.components.unwrap().schemas.keys().cloned().collect::<Vec<_>>(),
        vec!["ApiResponse"]
    );
}

#[test]
fn test_vendor_and_test_files_are_ignored() {
    let temp_dir = create_test_project(vec![
        (
            "main.go",
            "package main\n\nfunc main() {\n\tr := gin.New()\n\tr.GET(\"/ping\", Ping)\n}\n",
        ),
        (
            "main_test.go",
            "package main\n\nfunc routes() {\n\tr := gin.New()\n\tr.GET(\"/test-only\", Ping)\n}\n",
        ),
        (
            "vendor/github.com/x/y/y.go",
            "package y\n\nfunc routes() {\n\tr := gin.New()\n\tr.GET(\"/vendored\", Ping)\n}\n",
        ),
    ]);

    let doc = analyze(temp_dir.path()).unwrap();
    assert_eq!(doc.paths.keys().cloned().collect::<Vec<_>>(), vec!["/ping"]);
}

#[test]
fn test_custom_pattern_table() {
    let temp_dir = create_test_project(vec![(
        "main.go",
        r#"
package main

import web "github.com/gin-gonic/gin"

func main() {
    r := web.New()
    open := r.Group("/open")
    open.GET("/orders/:id", GetOrder)
}

func GetOrder(ctx *web.Context) {
    result := &Order{}
    resp.Reply(ctx, result)
}

type Order struct {
    Serial string `json:"serial"`
}
"#,
    )]);

    let mut config = AnalyzerConfig::default();
    config.patterns.framework_alias = "web".to_string();
    config.patterns.success_wrapper_methods = vec!["Reply".to_string()];
    config.skip_prefixes = vec!["open".to_string()];
    config.info.title = "Orders".to_string();

    let doc = Analyzer::new(config).analyze(temp_dir.path()).unwrap();

    assert_eq!(doc.info.title, "Orders");
    let get = operation(&doc, "/open/orders/{id}", HttpMethod::Get);
    assert_eq!(get.tags, vec!["Orders"]);
    assert_eq!(response_data(get), &Schema::reference("Order"));
}

#[test]
fn test_json_serialization_format() {
    let temp_dir = shop_project();
    let doc = analyze(temp_dir.path()).unwrap();

    let json = serialize_json(&doc).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    let post = &parsed["paths"]["/api/v1/users"]["post"];
    assert_eq!(post["summary"], "Create User");
    assert_eq!(
        post["requestBody"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/CreateUserRequest"
    );
    assert_eq!(
        post["responses"]["200"]["content"]["application/json"]["schema"]["properties"]["code"]["type"],
        "integer"
    );
    assert!(post["responses"]["404"].get("content").is_none());
    assert_eq!(parsed["components"]["schemas"]["User"]["type"], "object");
}

#[test]
fn test_yaml_serialization_format() {
    let temp_dir = shop_project();
    let doc = analyze(temp_dir.path()).unwrap();

    let yaml = serialize_yaml(&doc).unwrap();
    assert!(yaml.contains("openapi:"));
    assert!(yaml.contains("paths:"));
    assert!(yaml.contains("/api/v1/products/{id}"));
    assert!(yaml.contains("components:"));

    let reparsed: OpenApiDocument = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(reparsed, doc);
}
