use crate::config::FrameworkPatterns;
use crate::parser::{descendants, string_literal_value, ParsedFile};
use log::debug;
use std::collections::BTreeSet;

/// Framework detector for checking that a Go project imports the routing framework.
///
/// Handler detection matches the context type by its package alias, so the detector
/// also reports every alias the framework is imported under. Nothing here is fatal;
/// the analyzer turns surprises into warnings.
pub struct FrameworkDetector;

/// Result of framework detection.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DetectionResult {
    /// Whether any file imports the framework package
    pub imported: bool,
    /// Local names the framework is imported under (`gin` unless renamed)
    pub aliases: BTreeSet<String>,
    /// Number of files importing the framework
    pub importing_files: usize,
}

impl DetectionResult {
    /// Whether the framework is imported under a name other than `expected`
    pub fn has_foreign_alias(&self, expected: &str) -> bool {
        self.aliases.iter().any(|a| a != expected)
    }
}

impl FrameworkDetector {
    /// Scans every import spec of the provided parsed files.
    ///
    /// # Arguments
    ///
    /// * `parsed_files` - Slice of successfully parsed Go files to analyze
    /// * `patterns` - Pattern table naming the framework's import path
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gin_openapi::config::FrameworkPatterns;
    /// use gin_openapi::detector::FrameworkDetector;
    /// use gin_openapi::parser::AstParser;
    /// use std::path::Path;
    ///
    /// let parsed = AstParser::parse_file(Path::new("main.go")).unwrap();
    /// let result = FrameworkDetector::detect(&[parsed], &FrameworkPatterns::default());
    /// println!("gin imported: {}", result.imported);
    /// ```
    pub fn detect(parsed_files: &[ParsedFile], patterns: &FrameworkPatterns) -> DetectionResult {
        debug!("Detecting {} in {} files", patterns.framework_import, parsed_files.len());

        let mut result = DetectionResult::default();

        for parsed_file in parsed_files {
            let mut found_in_file = false;

            for spec in descendants(parsed_file.root())
                .into_iter()
                .filter(|n| n.kind() == "import_spec")
            {
                let Some(path) = spec
                    .child_by_field_name("path")
                    .and_then(|p| string_literal_value(p, &parsed_file.source))
                else {
                    continue;
                };
                if path != patterns.framework_import {
                    continue;
                }

                found_in_file = true;
                let alias = spec
                    .child_by_field_name("name")
                    .map(|n| parsed_file.text(n).to_string())
                    .unwrap_or_else(|| default_package_name(&path));
                // Blank and dot imports do not name the package
                if alias != "_" && alias != "." {
                    result.aliases.insert(alias);
                }
            }

            if found_in_file {
                result.importing_files += 1;
            }
        }

        result.imported = result.importing_files > 0;
        debug!("Detection result: {:?}", result);
        result
    }
}

/// Last path element, which is the package name for conventional module layouts
fn default_package_name(import_path: &str) -> String {
    import_path
        .rsplit('/')
        .next()
        .unwrap_or(import_path)
        .to_string()
}
