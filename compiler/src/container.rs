//! Containerized backend driven through the `docker` CLI.
//!
//! The lifecycle is pull, create, start, wait, logs and remove. The output
//! directory is bind-mounted at `/work`, so the binary copied there by the
//! container shows up next to the generated sources.

use std::ffi::OsString;
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::backend::{Compiler, CompilerKind};
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::process;

/// Mount point of the output directory inside the container.
const WORKDIR: &str = "/work";

/// Builds the generated crate inside a throwaway Rust container.
#[derive(Debug, Clone)]
pub struct ContainerCompiler {
    config: CompilerConfig,
    program: OsString,
}

impl ContainerCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            program: OsString::from("docker"),
        }
    }

    /// Uses `program` instead of `docker`.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    fn docker(&self) -> Command {
        Command::new(&self.program)
    }

    fn build_script(&self, triple: &str) -> String {
        let exe = self.config.target.executable_name(&self.config.binary_name);
        format!(
            "rustup target add {triple} && cargo build --release --target {triple} && cp target/{triple}/release/{exe} {WORKDIR}/{exe}"
        )
    }
}

/// Removes the container when dropped, whatever happened to the build.
struct ContainerGuard {
    program: OsString,
    id: String,
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        let result = Command::new(&self.program)
            .args(["rm", "-f", self.id.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match result {
            Ok(status) if status.success() => debug!(container = %self.id, "container removed"),
            Ok(status) => warn!(container = %self.id, code = ?status.code(), "failed to remove container"),
            Err(e) => warn!(container = %self.id, error = %e, "failed to remove container"),
        }
    }
}

impl Compiler for ContainerCompiler {
    fn compile(&mut self) -> Result<(), CompileError> {
        let config = &self.config;
        if config.binary_name.is_empty() {
            return Err(CompileError::EmptyBinaryName);
        }
        let triple = config.target.triple()?;
        let timeout = config.timeout;
        let mount = std::fs::canonicalize(&config.output_dir)?;
        info!(image = %config.container_image, triple = %triple, "compiling in container");

        let mut pull = self.docker();
        pull.args(["pull", config.container_image.as_str()]);
        process::run_checked(&mut pull, timeout)?;

        let mut create = self.docker();
        create
            .arg("create")
            .arg("-v")
            .arg(format!("{}:{WORKDIR}", mount.display()))
            .args(["-w", WORKDIR])
            .arg(&config.container_image)
            .args(["sh", "-c"])
            .arg(self.build_script(&triple));
        let created = process::run_checked(&mut create, timeout)?;
        let id = created.stdout.trim().to_string();
        debug!(container = %id, "container created");
        let guard = ContainerGuard {
            program: self.program.clone(),
            id,
        };

        let mut start = self.docker();
        start.args(["start", guard.id.as_str()]);
        process::run_checked(&mut start, timeout)?;

        let mut wait = self.docker();
        wait.args(["wait", guard.id.as_str()]);
        let waited = match process::run_checked(&mut wait, timeout) {
            Ok(output) => output,
            Err(err @ CompileError::Timeout { .. }) => {
                warn!(container = %guard.id, "build timed out, killing container");
                let mut kill = self.docker();
                kill.args(["kill", guard.id.as_str()]);
                if let Err(e) = process::run(&mut kill, None) {
                    warn!(container = %guard.id, error = %e, "failed to kill container");
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        let code: i32 = waited.stdout.trim().parse().unwrap_or(-1);

        let mut logs = self.docker();
        logs.args(["logs", guard.id.as_str()]);
        let logs = process::run(&mut logs, timeout)?;
        for line in logs.stdout.lines().chain(logs.stderr.lines()) {
            debug!(container = %guard.id, "{line}");
        }

        if code != 0 {
            return Err(CompileError::ToolFailed {
                program: process::program_name(&wait),
                code: Some(code),
                stderr: logs.diagnostic_tail(),
            });
        }

        let binary = config.binary_path();
        if !binary.is_file() {
            return Err(CompileError::MissingArtifact(binary));
        }
        info!(path = %binary.display(), "binary ready");
        Ok(())
    }

    fn config(&self) -> &CompilerConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut CompilerConfig {
        &mut self.config
    }

    fn kind(&self) -> CompilerKind {
        CompilerKind::Container
    }
}
