use crate::error::Error;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// AST (Abstract Syntax Tree) parser for Go source files.
///
/// The `AstParser` uses `tree-sitter` with the Go grammar to parse source code into a
/// concrete syntax tree, which the analysis passes walk to extract routes, handler
/// signatures, service functions and struct schemas.
///
/// # Example
///
/// ```no_run
/// use gin_openapi::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("main.go")).unwrap();
/// println!("package {}", parsed.package_name);
/// ```
pub struct AstParser;

/// A successfully parsed Go file with its syntax tree.
///
/// The tree's nodes only carry byte ranges, so the source text is kept next to it.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The file content
    pub source: String,
    /// The parsed syntax tree
    pub tree: Tree,
    /// Name from the `package` clause, empty if absent
    pub package_name: String,
}

impl ParsedFile {
    /// Root node of the syntax tree.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by a node of this file.
    pub fn text(&self, node: Node) -> &str {
        node_text(node, &self.source)
    }
}

impl AstParser {
    /// Parses a single Go source file into a syntax tree.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid Go syntax
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Self::parse_source(path, content)
    }

    /// Parses Go source text that is already in memory.
    ///
    /// `path` is only recorded; it is used for layer classification and diagnostics.
    pub fn parse_source(path: &Path, source: String) -> Result<ParsedFile> {
        let mut parser = Parser::new();
        let language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(Error::from)
            .context("Failed to load Go grammar")?;

        let tree = parser.parse(&source, None).ok_or_else(|| Error::ParseError {
            file: path.to_path_buf(),
            message: "parser returned no tree".to_string(),
        })?;

        if tree.root_node().has_error() {
            return Err(Error::ParseError {
                file: path.to_path_buf(),
                message: "Failed to parse Go syntax".to_string(),
            }
            .into());
        }

        let package_name = package_clause_name(tree.root_node(), &source);
        debug!(
            "Successfully parsed file: {} (package {})",
            path.display(),
            package_name
        );

        Ok(ParsedFile {
            path: path.to_path_buf(),
            source,
            tree,
            package_name,
        })
    }

    /// Parses multiple Go source files, continuing even if some fail.
    ///
    /// Files that fail to parse are logged as warnings, but parsing continues for remaining
    /// files, so a document can still be generated when some files have syntax errors.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| match Self::parse_file(path) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Err(e)
                }
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

fn package_clause_name(root: Node, source: &str) -> String {
    let mut cursor = root.walk();
    let clause = root
        .named_children(&mut cursor)
        .find(|n| n.kind() == "package_clause");

    clause
        .and_then(|c| {
            let mut cursor = c.walk();
            let name = c
                .named_children(&mut cursor)
                .find(|n| n.kind() == "package_identifier");
            name
        })
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default()
}

/// Source text of a node; empty when the range is not valid UTF-8.
pub fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Named children of a node without interleaved comments.
pub fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

/// Every descendant of `node` (including itself) in source order.
pub fn descendants(node: Node) -> Vec<Node> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        out.push(current);
        let mut cursor = current.walk();
        let children: Vec<Node> = current.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

/// Value of a Go string literal (interpreted or raw) without its delimiters.
pub fn string_literal_value(node: Node, source: &str) -> Option<String> {
    let text = node_text(node, source);
    match node.kind() {
        "interpreted_string_literal" => Some(
            text.trim_start_matches('"')
                .trim_end_matches('"')
                .replace("\\\"", "\""),
        ),
        "raw_string_literal" => Some(text.trim_matches('`').to_string()),
        _ => None,
    }
}
