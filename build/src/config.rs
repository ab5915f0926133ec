//! Build configuration.
//!
//! [`BuildConfig`] carries everything one build needs. Defaults live in
//! code; an optional YAML file ([`BuildConfigFile`]) provides project
//! defaults, and command-line flags override both.
//!
//! # Example YAML
//!
//! ```yaml
//! module: petstore
//! output: generated
//! server_url: https://petstore.example.com/v1
//! with_model: true
//! compile: true
//! backend: container
//! target_os: linux
//! target_arch: amd64
//! compile_timeout_secs: 900
//! container_image: rust:1-slim
//! ```

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use restcmd_compiler::{CompilerConfig, CompilerKind, DEFAULT_CONTAINER_IMAGE, TargetSpec};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default output directory for generated sources.
pub const DEFAULT_OUTPUT_DIR: &str = "out";

/// Settings for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// OpenAPI document to read.
    pub input: PathBuf,
    /// Package name of the generated crate.
    pub module_name: String,
    pub output_dir: PathBuf,
    /// Program name; falls back to the document title.
    pub command_name: Option<String>,
    /// Base URL; falls back to the first document server.
    pub server_url: Option<String>,
    pub with_model: bool,
    pub compile: bool,
    pub install: bool,
    /// Install directory; falls back to the cargo bin directory.
    pub install_dir: Option<PathBuf>,
    pub target_os: String,
    pub target_arch: String,
    /// Backend; selecting one implies compilation.
    pub backend: Option<CompilerKind>,
    /// Bound for each compiler child process. `None` waits indefinitely.
    pub compile_timeout: Option<Duration>,
    pub container_image: String,
}

impl BuildConfig {
    /// Host-targeted configuration that only generates sources.
    pub fn new(input: impl Into<PathBuf>, module_name: &str) -> Self {
        let host = TargetSpec::host();
        Self {
            input: input.into(),
            module_name: module_name.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            command_name: None,
            server_url: None,
            with_model: false,
            compile: false,
            install: false,
            install_dir: None,
            target_os: host.os,
            target_arch: host.arch,
            backend: None,
            compile_timeout: None,
            container_image: DEFAULT_CONTAINER_IMAGE.to_string(),
        }
    }

    /// Installation and an explicit backend both imply compilation.
    pub fn needs_compile(&self) -> bool {
        self.compile || self.install || self.backend.is_some()
    }

    pub fn needs_install(&self) -> bool {
        self.install
    }

    pub fn backend_kind(&self) -> CompilerKind {
        self.backend.unwrap_or_default()
    }

    /// Checks the settings before a build starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module_name.trim().is_empty() {
            return Err(ConfigError::MissingModule);
        }
        if self.input.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput);
        }
        if self.needs_compile() {
            if self.target_os.trim().is_empty() {
                return Err(ConfigError::MissingTarget("OS"));
            }
            if self.target_arch.trim().is_empty() {
                return Err(ConfigError::MissingTarget("architecture"));
            }
        }
        Ok(())
    }

    /// Backend settings derived from this configuration.
    ///
    /// The binary name is left empty; it is known only after generation.
    pub fn compiler_config(&self) -> CompilerConfig {
        let mut config = CompilerConfig::new(&self.output_dir)
            .with_target(TargetSpec::new(&self.target_os, &self.target_arch))
            .with_container_image(&self.container_image);
        config.timeout = self.compile_timeout;
        config
    }
}

/// Optional project defaults read from YAML.
///
/// Every field is optional; absent fields leave the [`BuildConfig`]
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfigFile {
    pub module: Option<String>,
    pub output: Option<PathBuf>,
    pub server_url: Option<String>,
    pub with_model: Option<bool>,
    pub compile: Option<bool>,
    pub install: Option<bool>,
    pub backend: Option<CompilerKind>,
    pub target_os: Option<String>,
    pub target_arch: Option<String>,
    pub install_dir: Option<PathBuf>,
    pub compile_timeout_secs: Option<u64>,
    pub container_image: Option<String>,
}

impl BuildConfigFile {
    /// Loads defaults from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Copies every value present in the file into `config`.
    pub fn apply(&self, config: &mut BuildConfig) {
        if let Some(module) = &self.module {
            config.module_name = module.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(url) = &self.server_url {
            config.server_url = Some(url.clone());
        }
        if let Some(with_model) = self.with_model {
            config.with_model = with_model;
        }
        if let Some(compile) = self.compile {
            config.compile = compile;
        }
        if let Some(install) = self.install {
            config.install = install;
        }
        if let Some(backend) = self.backend {
            config.backend = Some(backend);
        }
        if let Some(os) = &self.target_os {
            config.target_os = os.clone();
        }
        if let Some(arch) = &self.target_arch {
            config.target_arch = arch.clone();
        }
        if let Some(dir) = &self.install_dir {
            config.install_dir = Some(dir.clone());
        }
        if let Some(secs) = self.compile_timeout_secs {
            config.compile_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(image) = &self.container_image {
            config.container_image = image.clone();
        }
    }
}
