//! The analysis pipeline for one project directory.
//!
//! [`Analyzer`] owns its configuration; every call to [`Analyzer::analyze`] builds fresh
//! schema, handler and service maps, so independent runs never share state.

use crate::config::AnalyzerConfig;
use crate::detector::FrameworkDetector;
use crate::extractor::gin::GinExtractor;
use crate::extractor::{Parameter, ParameterLocation, RouteExtractor, RouteInfo, TypeInfo};
use crate::handler_analyzer::{HandlerAnalyzer, HandlerInfo, ResponseBinding};
use crate::openapi_builder::{OpenApiBuilder, OpenApiDocument};
use crate::parser::{AstParser, ParsedFile};
use crate::scanner::FileScanner;
use crate::schema_generator::{Layer, SchemaGenerator};
use crate::service_resolver::ServiceResolver;
use anyhow::Result;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Counters describing a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    pub files_scanned: usize,
    pub files_parsed: usize,
    pub routes: usize,
    pub schemas: usize,
    pub handlers: usize,
    pub services: usize,
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub document: OpenApiDocument,
    pub stats: AnalysisStats,
}

/// Static analyzer turning a gin project into an OpenAPI document
pub struct Analyzer {
    config: AnalyzerConfig,
}

/// Analyzes `root` with the default configuration.
pub fn analyze(root: &Path) -> Result<OpenApiDocument> {
    Analyzer::new(AnalyzerConfig::default()).analyze(root)
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Runs every pass over the project rooted at `root`.
    ///
    /// # Errors
    ///
    /// Fails only when the root directory cannot be walked. Unparseable files are
    /// skipped with a warning.
    pub fn analyze(&self, root: &Path) -> Result<OpenApiDocument> {
        Ok(self.analyze_with_stats(root)?.document)
    }

    /// Like [`Analyzer::analyze`], also reporting what was found.
    pub fn analyze_with_stats(&self, root: &Path) -> Result<AnalysisOutput> {
        let patterns = &self.config.patterns;

        info!("Scanning directory: {}", root.display());
        let scanner = FileScanner::new(root.to_path_buf(), self.config.skip_dirs.clone());
        let scan_result = scanner.scan()?;
        info!("Found {} Go files", scan_result.go_files.len());

        let parsed_files: Vec<ParsedFile> = AstParser::parse_files(&scan_result.go_files)
            .into_iter()
            .filter_map(|r| r.ok())
            .collect();
        info!("Successfully parsed {} files", parsed_files.len());

        let detection = FrameworkDetector::detect(&parsed_files, patterns);
        if !detection.imported {
            warn!(
                "No file imports {}; routes may be missing",
                patterns.framework_import
            );
        } else if detection.has_foreign_alias(&patterns.framework_alias) {
            warn!(
                "{} is imported as {:?}; handlers are only recognised through the `{}` alias",
                patterns.framework_import, detection.aliases, patterns.framework_alias
            );
        }

        let relative: Vec<PathBuf> = parsed_files
            .iter()
            .map(|f| relative_path(root, &f.path))
            .collect();

        info!("Extracting type schemas");
        let mut schema_gen = SchemaGenerator::new(patterns.clone());
        for (file, rel) in parsed_files.iter().zip(&relative) {
            let layer = Layer::classify(rel, &file.package_name, &patterns.layers);
            schema_gen.analyze_file(file, layer);
        }
        schema_gen.expand_embedded_fields();

        info!("Resolving service functions");
        let mut services = ServiceResolver::new(patterns.clone());
        for (file, rel) in parsed_files.iter().zip(&relative) {
            services.analyze_file(file, rel);
        }

        info!("Analyzing handlers");
        let mut handler_analyzer = HandlerAnalyzer::new(patterns.clone());
        for file in &parsed_files {
            handler_analyzer.analyze_file(file);
        }
        let handlers = handler_analyzer.into_handlers();

        info!("Extracting routes");
        let extractor = GinExtractor::new(patterns.clone());
        let mut routes = extractor.extract_routes(&parsed_files);
        for route in &mut routes {
            self.link_route(route, &handlers, &services);
        }

        let stats = AnalysisStats {
            files_scanned: scan_result.go_files.len(),
            files_parsed: parsed_files.len(),
            routes: routes.len(),
            schemas: schema_gen.get_schemas().len(),
            handlers: handlers.len(),
            services: services.len(),
        };

        info!("Generating OpenAPI document");
        let mut builder = OpenApiBuilder::new()
            .with_info(&self.config.info)
            .with_skip_prefixes(self.config.skip_prefixes.clone());
        for route in &routes {
            builder.add_route(route);
        }
        builder.add_schemas(schema_gen.into_schemas());

        Ok(AnalysisOutput {
            document: builder.build(),
            stats,
        })
    }

    /// Copies handler findings onto a route and settles deferred service responses.
    fn link_route(
        &self,
        route: &mut RouteInfo,
        handlers: &BTreeMap<String, HandlerInfo>,
        services: &ServiceResolver,
    ) {
        let Some(handler) = handlers.get(&route.handler_name) else {
            warn!(
                "No handler info for {} ({} {})",
                route.handler_name,
                route.method.as_str(),
                route.path
            );
            return;
        };

        route.request_body = handler.request_type.clone();
        route.response_type = self.resolve_response(&handler.response, services);

        for name in &handler.query_params {
            route
                .parameters
                .push(Parameter::new(name.clone(), ParameterLocation::Query, false));
        }

        debug!(
            "Linked {} {}: request {:?}, response {:?}",
            route.method.as_str(),
            route.path,
            route.request_body,
            route.response_type
        );
    }

    fn resolve_response(&self, response: &ResponseBinding, services: &ServiceResolver) -> Option<TypeInfo> {
        match response {
            ResponseBinding::Resolved(type_info) => Some(type_info.clone()),
            ResponseBinding::PendingServiceCall(call)
                if call.variable == self.config.patterns.response_variable =>
            {
                let resolved = services.resolve(call);
                if resolved.is_none() {
                    debug!("Service {}.{} did not resolve", call.package, call.function);
                }
                resolved
            }
            ResponseBinding::PendingServiceCall(_) | ResponseBinding::Unresolved => None,
        }
    }
}

fn relative_path(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
