//! Pipeline scenarios run through `Builder` with stand-in compilers.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use restcmd_build::{BuildConfig, BuildError, Builder, ConfigError, EventKind, State};
use restcmd_codegen::{CodegenError, LoadError};
use restcmd_compiler::{CompileError, Compiler, CompilerConfig, CompilerKind, InstallError};

const PETSTORE: &str = r#"
openapi: 3.0.3
info:
  title: Petstore
  version: 1.0.0
servers:
  - url: https://petstore.example.com/v1
paths:
  /pets:
    get:
      operationId: listPets
      summary: List all pets
  /pets/{id}:
    get:
      operationId: showPet
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: string
    delete:
      operationId: deletePet
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: string
"#;

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new(document: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("petstore.yaml"), document).unwrap();
        Self { dir }
    }

    fn config(&self) -> BuildConfig {
        let mut config = BuildConfig::new(self.dir.path().join("petstore.yaml"), "petstore");
        config.output_dir = self.dir.path().join("out");
        config
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }
}

/// Writes a fake binary, or fails like a broken `cargo build`.
struct FakeCompiler {
    kind: CompilerKind,
    config: CompilerConfig,
    fail: bool,
}

impl Compiler for FakeCompiler {
    fn compile(&mut self) -> Result<(), CompileError> {
        if self.fail {
            return Err(CompileError::ToolFailed {
                program: "cargo".to_string(),
                code: Some(101),
                stderr: "error: could not compile `petstore`".to_string(),
            });
        }
        std::fs::write(self.config.binary_path(), b"#!/bin/sh\n")?;
        Ok(())
    }

    fn config(&self) -> &CompilerConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut CompilerConfig {
        &mut self.config
    }

    fn kind(&self) -> CompilerKind {
        self.kind
    }
}

/// Factory that counts instantiations and hands out [`FakeCompiler`]s.
fn fake_factory(
    fail: bool,
    created: Rc<Cell<usize>>,
) -> impl Fn(CompilerKind, CompilerConfig) -> Box<dyn Compiler> {
    move |kind, config| {
        created.set(created.get() + 1);
        Box::new(FakeCompiler { kind, config, fail })
    }
}

fn assert_exists(path: &Path) {
    assert!(path.exists(), "missing {}", path.display());
}

#[test]
fn generate_only_skips_backend() {
    let ws = Workspace::new(PETSTORE);
    let created = Rc::new(Cell::new(0));
    let mut builder =
        Builder::new(ws.config()).with_compiler_factory(fake_factory(false, created.clone()));

    let report = builder.run().unwrap();

    assert_eq!(
        report.history,
        [
            State::Ready,
            State::Parsing,
            State::Generating,
            State::WithCode,
            State::Success
        ]
    );
    assert_eq!(created.get(), 0);
    assert_eq!(report.root_usage, "petstore");
    assert_eq!(report.binary, None);
    assert_exists(&ws.path("out/src/cmd/pets/id.rs"));
    assert!(!ws.path("out/Cargo.toml").exists());
    assert!(report.files.iter().any(|f| f == "src/app.rs"));
}

#[test]
fn compile_produces_binary_named_after_root_usage() {
    let ws = Workspace::new(PETSTORE);
    let created = Rc::new(Cell::new(0));
    let mut config = ws.config();
    config.compile = true;
    config.command_name = Some("petctl".to_string());
    config.target_os = "linux".to_string();
    config.target_arch = "amd64".to_string();

    let mut builder =
        Builder::new(config).with_compiler_factory(fake_factory(false, created.clone()));
    let report = builder.run().unwrap();

    assert_eq!(created.get(), 1);
    assert_eq!(report.binary, Some(ws.path("out/petctl")));
    assert_exists(&ws.path("out/petctl"));
    assert_exists(&ws.path("out/Cargo.toml"));
    assert_exists(&ws.path("out/src/main.rs"));
    assert_eq!(
        report.history,
        [
            State::Ready,
            State::Parsing,
            State::Generating,
            State::WithCode,
            State::Compiling,
            State::WithBinary,
            State::Success
        ]
    );
}

#[test]
fn compile_failure_keeps_cause_and_skips_install() {
    let ws = Workspace::new(PETSTORE);
    let mut config = ws.config();
    config.install = true;
    config.install_dir = Some(ws.path("bin"));

    let mut builder = Builder::new(config)
        .with_compiler_factory(fake_factory(true, Rc::new(Cell::new(0))));
    let err = builder.run().unwrap_err();

    match &err {
        BuildError::Compile(CompileError::ToolFailed { code, .. }) => assert_eq!(*code, Some(101)),
        other => panic!("unexpected error: {other}"),
    }
    let cause = std::error::Error::source(&err).map(|s| s.to_string());
    assert_eq!(
        cause.as_deref(),
        Some("cargo failed with exit code 101: error: could not compile `petstore`")
    );
    assert_eq!(builder.state(), State::Failure);
    assert_eq!(builder.last_event(), Some(EventKind::Error));
    assert!(!builder.history().contains(&State::Installing));
    assert!(!ws.path("bin").exists());
}

#[test]
fn install_copies_binary() {
    let ws = Workspace::new(PETSTORE);
    let mut config = ws.config();
    config.install = true;
    config.install_dir = Some(ws.path("bin"));
    config.target_os = "linux".to_string();

    let mut builder = Builder::new(config)
        .with_compiler_factory(fake_factory(false, Rc::new(Cell::new(0))));
    let report = builder.run().unwrap();

    assert_eq!(report.installed, Some(ws.path("bin/petstore")));
    assert_exists(&ws.path("bin/petstore"));
    assert_eq!(
        &report.history[report.history.len() - 4..],
        [
            State::WithBinary,
            State::Installing,
            State::Installed,
            State::Success
        ]
    );
}

#[test]
fn missing_binary_fails_install() {
    struct NoOutput(CompilerConfig);

    impl Compiler for NoOutput {
        fn compile(&mut self) -> Result<(), CompileError> {
            Ok(())
        }
        fn config(&self) -> &CompilerConfig {
            &self.0
        }
        fn config_mut(&mut self) -> &mut CompilerConfig {
            &mut self.0
        }
        fn kind(&self) -> CompilerKind {
            CompilerKind::Native
        }
    }

    let ws = Workspace::new(PETSTORE);
    let mut config = ws.config();
    config.install = true;
    config.install_dir = Some(ws.path("bin"));

    let mut builder = Builder::new(config)
        .with_compiler_factory(|_, config| Box::new(NoOutput(config)) as Box<dyn Compiler>);
    let err = builder.run().unwrap_err();

    assert!(matches!(
        err,
        BuildError::Install(InstallError::MissingBinary(_))
    ));
    assert_eq!(builder.history().last(), Some(&State::Failure));
    assert!(builder.history().contains(&State::Installing));
}

#[test]
fn missing_server_url_fails_while_parsing() {
    let ws = Workspace::new(&PETSTORE.replace("https://petstore.example.com/v1", "/"));
    let mut builder = Builder::new(ws.config());
    let err = builder.run().unwrap_err();

    assert!(matches!(err, BuildError::Parse(CodegenError::MissingServerUrl)));
    assert_eq!(
        builder.history(),
        [State::Ready, State::Parsing, State::Failure]
    );
    assert!(!ws.path("out").exists());
}

#[test]
fn explicit_server_url_wins() {
    let ws = Workspace::new(&PETSTORE.replace("https://petstore.example.com/v1", "/"));
    let mut config = ws.config();
    config.server_url = Some("http://localhost:8080".to_string());

    let report = Builder::new(config).run().unwrap();
    assert_eq!(report.history.last(), Some(&State::Success));
    let config_mod = std::fs::read_to_string(ws.path("out/src/config/mod.rs")).unwrap();
    assert!(config_mod.contains("http://localhost:8080"));
}

#[test]
fn unreadable_input_is_parse_error() {
    let ws = Workspace::new(PETSTORE);
    let mut config = ws.config();
    config.input = ws.path("missing.yaml");

    let mut builder = Builder::new(config);
    let err = builder.run().unwrap_err();
    assert!(matches!(
        err,
        BuildError::Parse(CodegenError::Load(LoadError::Io { .. }))
    ));
    assert_eq!(builder.state(), State::Failure);
}

#[test]
fn invalid_config_never_starts() {
    let ws = Workspace::new(PETSTORE);
    let mut config = ws.config();
    config.module_name = String::new();

    let mut builder = Builder::new(config);
    let err = builder.run().unwrap_err();
    assert!(matches!(err, BuildError::Config(ConfigError::MissingModule)));
    assert_eq!(builder.state(), State::Ready);
    assert_eq!(builder.history(), [State::Ready]);
}

#[test]
fn second_run_is_protocol_error() {
    let ws = Workspace::new(PETSTORE);
    let mut builder = Builder::new(ws.config());
    builder.run().unwrap();

    let err = builder.run().unwrap_err();
    assert!(matches!(
        err,
        BuildError::Protocol {
            state: State::Success,
            event: EventKind::StartParsing
        }
    ));
    assert_eq!(builder.state(), State::Failure);
}
