//! Error types for compilation and installation.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by a compiler backend.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The backend name is not recognized.
    #[error("unknown compiler backend: {0} (expected native, cargo, container or docker)")]
    UnknownBackend(String),

    /// No Rust target triple exists for the OS / architecture pair.
    #[error("unsupported target: {os}/{arch}")]
    UnsupportedTarget { os: String, arch: String },

    /// The binary name was never set.
    #[error("binary name is empty")]
    EmptyBinaryName,

    /// The external tool could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool did not finish in time and was killed.
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    /// The external tool exited unsuccessfully.
    #[error("{program} failed{}: {stderr}", exit_suffix(.code))]
    ToolFailed {
        program: String,
        code: Option<i32>,
        /// Tail of the tool's diagnostic output.
        stderr: String,
    },

    /// The build reported success but produced no binary.
    #[error("build produced no binary at {}", .0.display())]
    MissingArtifact(PathBuf),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => String::new(),
    }
}

/// Errors raised while installing a built binary.
#[derive(Debug, Error)]
pub enum InstallError {
    /// No install directory was configured and none could be derived.
    #[error("no install directory: set --install-dir, CARGO_HOME or HOME")]
    NoInstallDir,

    /// The binary to install does not exist.
    #[error("binary not found: {}", .0.display())]
    MissingBinary(PathBuf),

    /// Copying or permission changes failed.
    #[error("failed to install {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
