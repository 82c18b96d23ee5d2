use crate::error::Error;
use anyhow::Result;
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

/// File scanner for traversing project directories.
///
/// The `FileScanner` recursively walks through a project directory to find all Go source files.
/// It skips hidden entries (those starting with `.`, which covers `.git`), any directory whose
/// name is in the skip list (vendored dependencies, build tooling) and `_test.go` files.
///
/// # Example
///
/// ```no_run
/// use gin_openapi::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-service"), vec!["vendor".to_string()]);
/// let result = scanner.scan().unwrap();
/// println!("Found {} Go files", result.go_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    skip_dirs: Vec<String>,
}

/// Result of directory scanning operation.
///
/// Contains the list of discovered Go files and any warnings encountered during scanning.
#[derive(Debug)]
pub struct ScanResult {
    /// Paths to all discovered `.go` files, in a stable order
    pub go_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory.
    ///
    /// # Arguments
    ///
    /// * `root_path` - The root directory to scan for Go files
    /// * `skip_dirs` - Directory names that are never descended into
    pub fn new(root_path: PathBuf, skip_dirs: Vec<String>) -> Self {
        Self {
            root_path,
            skip_dirs,
        }
    }

    /// Scans the directory tree and collects all `.go` files.
    ///
    /// Entries are visited sorted by file name so that two scans of an unchanged tree
    /// return the same list in the same order.
    ///
    /// If any directories or files below the root cannot be accessed, warnings are logged and
    /// added to the result, but scanning continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be accessed or is not a directory.
    pub fn scan(&self) -> Result<ScanResult> {
        let metadata = fs::metadata(&self.root_path).map_err(|e| {
            Error::InvalidArgument(format!(
                "cannot access {}: {}",
                self.root_path.display(),
                e
            ))
        })?;
        if !metadata.is_dir() {
            return Err(Error::InvalidArgument(format!(
                "{} is not a directory",
                self.root_path.display()
            ))
            .into());
        }

        let mut go_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.depth() == 0 {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_skipped =
                    e.file_type().is_dir() && self.skip_dirs.iter().any(|d| d.as_str() == file_name.as_ref());

                !is_hidden && !is_skipped
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    let file_name = entry.file_name().to_string_lossy();

                    if entry.file_type().is_file()
                        && file_name.ends_with(".go")
                        && !file_name.ends_with("_test.go")
                    {
                        go_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        debug!(
            "Scanned {}: {} Go files, {} warnings",
            self.root_path.display(),
            go_files.len(),
            warnings.len()
        );

        Ok(ScanResult { go_files, warnings })
    }
}
