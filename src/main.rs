//! Gin OpenAPI Generator - Command-line tool for generating OpenAPI documentation.
//!
//! This binary statically analyzes a Go project built on the gin router and writes an
//! OpenAPI 3.0 document describing its routes, request/response payloads and struct types.
//!
//! # Usage
//!
//! ```bash
//! gin-openapi [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! gin-openapi ./my-service -o openapi.yaml
//! ```
//!
//! Generate JSON documentation with a custom pattern table:
//! ```bash
//! gin-openapi ./my-service -f json -c gin-openapi.yaml -o openapi.json
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! gin-openapi ./my-service -v
//! ```

use anyhow::Result;
use clap::Parser;
use gin_openapi::cli;
use log::info;

fn main() -> Result<()> {
    // Parse once to read the verbose flag, validate after the logger is up
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();

    info!("Gin OpenAPI Generator starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
