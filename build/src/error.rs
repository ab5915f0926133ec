//! Error types for build orchestration.

use restcmd_codegen::CodegenError;
use restcmd_compiler::{CompileError, InstallError};
use thiserror::Error;

use crate::state::{EventKind, State};

/// Errors raised by a build, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The configuration was rejected before the pipeline started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("parse failed: {0}")]
    Parse(#[source] CodegenError),

    #[error("code generation failed: {0}")]
    Generate(#[source] CodegenError),

    #[error("compilation failed: {0}")]
    Compile(#[source] CompileError),

    #[error("installation failed: {0}")]
    Install(#[source] InstallError),

    /// An event arrived that the current state does not accept.
    #[error("event {event:?} is not accepted in state {state}")]
    Protocol { state: State, event: EventKind },
}

/// Configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("module name is required")]
    MissingModule,

    #[error("input path is required")]
    MissingInput,

    /// Compilation was requested without a target OS or architecture.
    #[error("target {0} is required when compiling")]
    MissingTarget(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`BuildError`].
pub type Result<T> = std::result::Result<T, BuildError>;
