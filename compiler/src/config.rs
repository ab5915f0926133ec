//! Compiler configuration and target resolution.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::CompileError;

/// Image used by the container backend unless overridden.
pub const DEFAULT_CONTAINER_IMAGE: &str = "rust:1-bookworm";

/// Operating system and architecture of the binary to build.
///
/// Accepts both Rust names (`x86_64`, `macos`) and the common aliases used
/// by other toolchains (`amd64`, `arm64`, `darwin`).
///
/// # Examples
///
/// ```
/// use restcmd_compiler::TargetSpec;
///
/// let target = TargetSpec::new("linux", "amd64");
/// assert_eq!(target.triple().unwrap(), "x86_64-unknown-linux-gnu");
///
/// let mac = TargetSpec::new("darwin", "arm64");
/// assert_eq!(mac.triple().unwrap(), "aarch64-apple-darwin");
///
/// assert!(TargetSpec::new("plan9", "amd64").triple().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub os: String,
    pub arch: String,
}

impl TargetSpec {
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    /// The machine this process runs on.
    pub fn host() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    fn normalized_arch(&self) -> Option<&'static str> {
        match self.arch.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some("x86_64"),
            "aarch64" | "arm64" => Some("aarch64"),
            "i686" | "386" | "x86" => Some("i686"),
            _ => None,
        }
    }

    /// Rust target triple for this OS / architecture pair.
    pub fn triple(&self) -> Result<String, CompileError> {
        let unsupported = || CompileError::UnsupportedTarget {
            os: self.os.clone(),
            arch: self.arch.clone(),
        };
        let arch = self.normalized_arch().ok_or_else(unsupported)?;

        let vendor_os = match self.os.to_ascii_lowercase().as_str() {
            "linux" => "unknown-linux-gnu",
            "macos" | "darwin" if arch != "i686" => "apple-darwin",
            "windows" => "pc-windows-gnu",
            _ => return Err(unsupported()),
        };
        Ok(format!("{arch}-{vendor_os}"))
    }

    pub fn is_windows(&self) -> bool {
        self.os.eq_ignore_ascii_case("windows")
    }

    /// File name of an executable called `name` on this target.
    pub fn executable_name(&self, name: &str) -> String {
        if self.is_windows() {
            format!("{name}.exe")
        } else {
            name.to_string()
        }
    }
}

/// Settings shared by every compiler backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Directory holding the generated crate; the binary lands here too.
    pub output_dir: PathBuf,
    /// Name of the produced executable, without extension.
    pub binary_name: String,
    pub target: TargetSpec,
    /// Upper bound for each external process. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub container_image: String,
}

impl CompilerConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            binary_name: String::new(),
            target: TargetSpec::host(),
            timeout: None,
            container_image: DEFAULT_CONTAINER_IMAGE.to_string(),
        }
    }

    pub fn with_binary_name(mut self, name: &str) -> Self {
        self.binary_name = name.to_string();
        self
    }

    pub fn with_target(mut self, target: TargetSpec) -> Self {
        self.target = target;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_container_image(mut self, image: &str) -> Self {
        self.container_image = image.to_string();
        self
    }

    /// Path of the finished executable inside the output directory.
    pub fn binary_path(&self) -> PathBuf {
        self.output_dir
            .join(self.target.executable_name(&self.binary_name))
    }
}
