//! Error types for loading API descriptions and emitting sources.

use std::path::PathBuf;

use thiserror::Error;

use crate::loader::ValidationError;

/// Errors raised while reading an API description from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File I/O failure.
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `$ref` points at nothing the document defines.
    #[error("unresolvable reference: {0}")]
    Reference(String),

    /// The file extension is not one of `json`, `yaml` or `yml`.
    #[error("unsupported document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The document parsed but is structurally unusable.
    #[error("invalid document: {}", format_issues(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_issues(issues: &[ValidationError]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while turning a parsed document into files.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Neither an explicit server URL nor a usable document server exists.
    #[error("no server URL defined in the document and no --server-url provided")]
    MissingServerUrl,

    /// A destination file could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two commands would be written to the same file.
    #[error("paths {first} and {second} both map to {file}")]
    DuplicateDestination {
        file: String,
        first: String,
        second: String,
    },

    /// Model generation failed.
    #[error("model generation failed: {0}")]
    Model(String),

    /// Manifest serialization failure.
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// The tree carries no global context.
    #[error("command tree has no global context")]
    MissingContext,
}

/// Convenience alias for results with [`CodegenError`].
pub type Result<T> = std::result::Result<T, CodegenError>;
