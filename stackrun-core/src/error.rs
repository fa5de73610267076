//! Error types for definition loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for definition loading
pub type Result<T> = std::result::Result<T, DefinitionError>;

/// Problems with stack, pipeline or template definitions
///
/// All of these are detected before any remote call and abort the whole
/// invocation.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// A definition file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A definition file is not valid YAML for its expected shape
    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The pipeline references a stack the stack file does not define
    #[error("{stack} was not found in your stack file {file}.")]
    UnknownStack { stack: String, file: String },

    /// A required stack property is absent
    #[error("The {field} property is missing from the stack {stack} in stack file {file}.{hint}")]
    MissingField {
        stack: String,
        field: &'static str,
        file: String,
        hint: &'static str,
    },

    /// A stack property has an unusable value
    #[error("The {field} property of stack {stack} is invalid: {message}")]
    InvalidField {
        stack: String,
        field: &'static str,
        message: String,
    },

    /// The template does not declare any resources
    #[error("The template {path} for stack {stack} does not contain any Resources.")]
    EmptyTemplate { stack: String, path: PathBuf },

    /// The stack file is structurally wrong
    #[error("Invalid stack file: {0}")]
    InvalidStackFile(String),

    /// The pipeline file is structurally wrong
    #[error("Invalid pipeline definition: {0}")]
    InvalidPipeline(String),
}
