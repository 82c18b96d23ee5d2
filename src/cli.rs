use crate::analyzer::Analyzer;
use crate::config::AnalyzerConfig;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Gin OpenAPI Generator - Generate OpenAPI documentation from Go gin projects by static analysis
#[derive(Parser, Debug)]
#[command(name = "gin-openapi")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Go project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Configuration file (YAML or JSON) with document info and framework patterns
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Document title
    #[arg(long = "title")]
    pub title: Option<String>,

    /// Document version
    #[arg(long = "api-version", value_name = "VERSION")]
    pub api_version: Option<String>,

    /// Document description
    #[arg(long = "description")]
    pub description: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }
    if let Some(ref config) = args.config_path {
        info!("Config file: {}", config.display());
    }

    Ok(args)
}

/// Builds the analyzer configuration: the config file (or defaults), then command-line
/// overrides.
pub fn load_config(args: &CliArgs) -> Result<AnalyzerConfig> {
    let mut config = match &args.config_path {
        Some(path) => AnalyzerConfig::from_file(path)?,
        None => AnalyzerConfig::default(),
    };

    if let Some(title) = &args.title {
        config.info.title = title.clone();
    }
    if let Some(version) = &args.api_version {
        config.info.version = version.clone();
    }
    if let Some(description) = &args.description {
        config.info.description = description.clone();
    }

    Ok(config)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    let config = load_config(&args)?;
    let analyzer = Analyzer::new(config);
    let output = analyzer.analyze_with_stats(&args.project_path)?;

    if output.stats.files_scanned == 0 {
        warn!("No Go files found in the project directory");
    }
    if output.stats.routes == 0 {
        warn!("No routes found in the project");
    }

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&output.document)?,
        OutputFormat::Json => serialize_json(&output.document)?,
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    let stats = &output.stats;
    info!("Generation complete!");
    info!("Summary:");
    info!("  - Files scanned: {}", stats.files_scanned);
    info!("  - Files parsed: {}", stats.files_parsed);
    info!("  - Routes found: {}", stats.routes);
    info!("  - Handlers analyzed: {}", stats.handlers);
    info!("  - Service functions: {}", stats.services);
    info!("  - Schemas: {}", stats.schemas);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args_for(path: &std::path::Path, extra: &[&str]) -> CliArgs {
        let mut argv = vec!["gin-openapi".to_string(), path.display().to_string()];
        argv.extend(extra.iter().map(|s| s.to_string()));
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let args = args_for(temp_dir.path(), &[]);

        assert!(matches!(args.output_format, OutputFormat::Yaml));
        assert!(args.output_path.is_none());
        assert!(args.config_path.is_none());
        assert!(!args.verbose);
        assert!(parse_args_from_parsed(args).is_ok());
    }

    #[test]
    fn test_all_flags() {
        let temp_dir = TempDir::new().unwrap();
        let args = args_for(
            temp_dir.path(),
            &[
                "-f", "json", "-o", "out/api.json", "--title", "Shop", "--api-version", "2.1.0",
                "--description", "Shop API", "-v",
            ],
        );

        assert!(matches!(args.output_format, OutputFormat::Json));
        assert_eq!(args.output_path, Some(PathBuf::from("out/api.json")));
        assert!(args.verbose);

        let config = load_config(&args).unwrap();
        assert_eq!(config.info.title, "Shop");
        assert_eq!(config.info.version, "2.1.0");
        assert_eq!(config.info.description, "Shop API");
    }

    #[test]
    fn test_invalid_format_is_rejected() {
        let result = CliArgs::try_parse_from(["gin-openapi", ".", "-f", "xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_project_path_is_rejected() {
        let args = CliArgs::try_parse_from(["gin-openapi", "/nonexistent/project"]).unwrap();
        let err = parse_args_from_parsed(args).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_file_project_path_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("main.go");
        fs::write(&file, "package main").unwrap();

        let err = parse_args_from_parsed(args_for(&file, &[])).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_config_file_then_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("gin-openapi.yaml");
        fs::write(
            &config_path,
            "info:\n  title: From File\n  version: 0.9.0\npatterns:\n  response_variable: result\n",
        )
        .unwrap();

        let args = args_for(
            temp_dir.path(),
            &["-c", config_path.to_str().unwrap(), "--api-version", "1.2.3"],
        );
        let config = load_config(&args).unwrap();

        assert_eq!(config.info.title, "From File");
        assert_eq!(config.info.version, "1.2.3");
        assert_eq!(config.patterns.response_variable, "result");
    }

    #[test]
    fn test_run_writes_output_file() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("project");
        fs::create_dir(&project).unwrap();
        fs::write(
            project.join("main.go"),
            "package main\n\nfunc main() {\n    r := gin.Default()\n    r.GET(\"/ping\", Ping)\n}\n",
        )
        .unwrap();
        let output = temp_dir.path().join("docs/openapi.json");

        let args = args_for(&project, &["-f", "json", "-o", output.to_str().unwrap()]);
        run(args).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert!(written["paths"]["/ping"]["get"].is_object());
    }
}
