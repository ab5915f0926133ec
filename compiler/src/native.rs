//! Host `cargo` backend.

use std::ffi::OsString;
use std::process::Command;

use tracing::{debug, info};

use crate::backend::{Compiler, CompilerKind};
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::process;

/// Builds the generated crate with the host's `cargo`.
///
/// Runs `cargo build --release --target <triple>` inside the output
/// directory and copies the release binary next to the sources.
#[derive(Debug, Clone)]
pub struct NativeCompiler {
    config: CompilerConfig,
    program: OsString,
}

impl NativeCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            program: OsString::from("cargo"),
        }
    }

    /// Uses `program` instead of `cargo`.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }
}

impl Compiler for NativeCompiler {
    fn compile(&mut self) -> Result<(), CompileError> {
        let config = &self.config;
        if config.binary_name.is_empty() {
            return Err(CompileError::EmptyBinaryName);
        }
        let triple = config.target.triple()?;
        info!(triple = %triple, binary = %config.binary_name, "compiling with cargo");

        let mut command = Command::new(&self.program);
        command
            .args(["build", "--release", "--target", triple.as_str()])
            .current_dir(&config.output_dir);
        let output = process::run_checked(&mut command, config.timeout)?;
        debug!(stderr = %output.diagnostic_tail(), "cargo finished");

        let file_name = config.target.executable_name(&config.binary_name);
        let built = config
            .output_dir
            .join("target")
            .join(&triple)
            .join("release")
            .join(&file_name);
        if !built.is_file() {
            return Err(CompileError::MissingArtifact(built));
        }

        let dest = config.binary_path();
        std::fs::copy(&built, &dest)?;
        info!(path = %dest.display(), "binary ready");
        Ok(())
    }

    fn config(&self) -> &CompilerConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut CompilerConfig {
        &mut self.config
    }

    fn kind(&self) -> CompilerKind {
        CompilerKind::Native
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetSpec;

    #[test]
    fn test_empty_binary_name() {
        let mut compiler = NativeCompiler::new(CompilerConfig::new("out"));
        assert!(matches!(
            compiler.compile(),
            Err(CompileError::EmptyBinaryName)
        ));
    }

    #[test]
    fn test_unsupported_target_fails_before_spawning() {
        let config = CompilerConfig::new("out")
            .with_binary_name("petctl")
            .with_target(TargetSpec::new("solaris", "sparc"));
        let mut compiler = NativeCompiler::new(config).with_program("restcmd-missing-cargo");
        assert!(matches!(
            compiler.compile(),
            Err(CompileError::UnsupportedTarget { .. })
        ));
    }

    #[test]
    fn test_missing_cargo_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = CompilerConfig::new(dir.path())
            .with_binary_name("petctl")
            .with_target(TargetSpec::new("linux", "x86_64"));
        let mut compiler = NativeCompiler::new(config).with_program("restcmd-missing-cargo");
        assert!(matches!(compiler.compile(), Err(CompileError::Spawn { .. })));
    }
}
