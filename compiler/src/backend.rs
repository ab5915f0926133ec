//! Backend selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::CompilerConfig;
use crate::container::ContainerCompiler;
use crate::error::CompileError;
use crate::native::NativeCompiler;

/// A build backend turning the generated crate into an executable.
pub trait Compiler {
    /// Builds the binary described by [`Compiler::config`].
    fn compile(&mut self) -> Result<(), CompileError>;

    fn config(&self) -> &CompilerConfig;

    /// Mutable access, used to set the binary name right before compiling.
    fn config_mut(&mut self) -> &mut CompilerConfig;

    fn kind(&self) -> CompilerKind;
}

/// The available backends.
///
/// # Examples
///
/// ```
/// use restcmd_compiler::CompilerKind;
///
/// assert_eq!("cargo".parse::<CompilerKind>().unwrap(), CompilerKind::Native);
/// assert_eq!("docker".parse::<CompilerKind>().unwrap(), CompilerKind::Container);
/// assert!("podman".parse::<CompilerKind>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerKind {
    /// `cargo` on the host.
    #[default]
    #[serde(alias = "cargo")]
    Native,
    /// `cargo` inside a container started with `docker`.
    #[serde(alias = "docker")]
    Container,
}

impl CompilerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CompilerKind::Native => "native",
            CompilerKind::Container => "container",
        }
    }
}

impl fmt::Display for CompilerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompilerKind {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "cargo" => Ok(CompilerKind::Native),
            "container" | "docker" => Ok(CompilerKind::Container),
            other => Err(CompileError::UnknownBackend(other.to_string())),
        }
    }
}

/// Instantiates the backend for `kind`.
pub fn new_compiler(kind: CompilerKind, config: CompilerConfig) -> Box<dyn Compiler> {
    match kind {
        CompilerKind::Native => Box::new(NativeCompiler::new(config)),
        CompilerKind::Container => Box::new(ContainerCompiler::new(config)),
    }
}
