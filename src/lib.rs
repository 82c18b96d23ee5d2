//! Gin OpenAPI Generator - OpenAPI documentation from Go gin projects by static analysis.
//!
//! The library parses every Go file of a project with `tree-sitter`, then recovers the
//! API surface without a type checker: route registrations and their group prefixes,
//! the request and response types of each handler, the return types of service-layer
//! functions, and the shape of every struct. The pieces are joined into one OpenAPI 3.0
//! document.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Recursively scans project directories for Go files
//! 2. [`parser`] - Parses Go source files into syntax trees
//! 3. [`detector`] - Checks that (and how) the gin package is imported
//! 4. [`schema_generator`] - Converts struct declarations to OpenAPI schemas
//! 5. [`handler_analyzer`] - Recovers request/response types of handler functions
//! 6. [`service_resolver`] - Records return and data types of service functions
//! 7. [`extractor`] - Extracts routes and group prefixes from registration calls
//! 8. [`openapi_builder`] - Constructs the complete OpenAPI document
//! 9. [`serializer`] - Serializes the document to YAML or JSON
//!
//! [`analyzer::Analyzer`] runs them in that order for one project. Framework names
//! (`gin`, `Context`, `Group`, `ShouldBindJSON`, ...) come from [`config::FrameworkPatterns`].
//!
//! # Example Usage
//!
//! ```no_run
//! use gin_openapi::{config::AnalyzerConfig, serializer::serialize_yaml, Analyzer};
//! use std::path::Path;
//!
//! let analyzer = Analyzer::new(AnalyzerConfig::default());
//! let document = analyzer.analyze(Path::new("./my-service")).unwrap();
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod extractor;
pub mod handler_analyzer;
pub mod openapi_builder;
pub mod parser;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod service_resolver;
pub mod type_resolver;

pub use analyzer::{analyze, Analyzer};
