//! Pipeline entry point.

use std::path::{Path, PathBuf};

use restcmd_codegen::{CodegenError, Generator, GeneratorConfig, load_document};
use restcmd_compiler::{
    Compiler, CompilerConfig, CompilerKind, InstallError, default_install_dir, install_binary,
    new_compiler,
};
use restcmd_core::{ApiDocument, CommandTree};
use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::state::{Event, EventKind, StageHandler, State, StateMachine};

/// Creates the compiler backend for a build.
pub type CompilerFactory = Box<dyn Fn(CompilerKind, CompilerConfig) -> Box<dyn Compiler>>;

/// What a successful build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub root_usage: String,
    pub output_dir: PathBuf,
    /// Files written, relative to `output_dir`.
    pub files: Vec<String>,
    pub binary: Option<PathBuf>,
    pub installed: Option<PathBuf>,
    pub history: Vec<State>,
}

/// Runs one build: parse, generate, and optionally compile and install.
///
/// # Examples
///
/// ```no_run
/// use restcmd_build::{BuildConfig, Builder};
///
/// let mut config = BuildConfig::new("petstore.yaml", "petstore");
/// config.compile = true;
///
/// let report = Builder::new(config).run().unwrap();
/// println!("built {:?}", report.binary);
/// ```
pub struct Builder {
    machine: StateMachine<Stages>,
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("state", &self.machine.state())
            .field("history", &self.machine.history())
            .finish_non_exhaustive()
    }
}

impl Builder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            machine: StateMachine::new(Stages::new(config)),
        }
    }

    /// Replaces the backend factory, [`new_compiler`] by default.
    pub fn with_compiler_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(CompilerKind, CompilerConfig) -> Box<dyn Compiler> + 'static,
    {
        self.machine.handler_mut().factory = Box::new(factory);
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.machine.handler().config
    }

    pub fn state(&self) -> State {
        self.machine.state()
    }

    pub fn last_event(&self) -> Option<EventKind> {
        self.machine.last_event()
    }

    pub fn history(&self) -> &[State] {
        self.machine.history()
    }

    /// Runs the pipeline to `Success` or `Failure`.
    ///
    /// # Errors
    ///
    /// [`BuildError::Config`] if the configuration is invalid; the machine
    /// stays in `Ready`. Otherwise the error of the failing stage, after
    /// which the machine is in `Failure`.
    pub fn run(&mut self) -> Result<BuildReport> {
        self.config().validate()?;

        let input = self.config().input.clone();
        info!(input = %input.display(), "build started");
        self.machine.accept(Event::StartParsing {
            input: input.clone(),
        })?;

        let (tree, document) = match self.machine.handler().parse(&input) {
            Ok(parsed) => parsed,
            Err(e) => return Err(self.machine.fail(BuildError::Parse(e))),
        };

        let mut state = self.machine.accept(Event::FinishParsing { tree, document })?;
        if state == State::Installed {
            state = self.machine.accept(Event::End)?;
        }
        if state != State::Success {
            return Err(self.machine.fail(BuildError::Protocol {
                state,
                event: EventKind::End,
            }));
        }

        let stages = self.machine.handler();
        info!(root_usage = %stages.root_usage, "build finished");
        Ok(BuildReport {
            root_usage: stages.root_usage.clone(),
            output_dir: stages.config.output_dir.clone(),
            files: stages.files.clone(),
            binary: stages.binary.clone(),
            installed: stages.installed.clone(),
            history: self.machine.history().to_vec(),
        })
    }
}

/// The work behind each state.
struct Stages {
    config: BuildConfig,
    generator: Generator,
    factory: CompilerFactory,
    root_usage: String,
    files: Vec<String>,
    binary: Option<PathBuf>,
    installed: Option<PathBuf>,
}

impl Stages {
    fn new(config: BuildConfig) -> Self {
        let mut generator_config = GeneratorConfig::new(&config.output_dir, &config.module_name)
            .with_model(config.with_model)
            .with_entry_point(config.needs_compile());
        generator_config.command_name = config.command_name.clone();
        generator_config.server_url = config.server_url.clone();

        Self {
            generator: Generator::new(generator_config),
            config,
            factory: Box::new(new_compiler),
            root_usage: String::new(),
            files: Vec::new(),
            binary: None,
            installed: None,
        }
    }

    fn parse(&self, input: &Path) -> std::result::Result<(CommandTree, ApiDocument), CodegenError> {
        let document = load_document(input)?;
        let tree = self.generator.build_tree(&document)?;
        info!(commands = tree.len(), operations = document.operation_count(), "document parsed");
        Ok((tree, document))
    }

    fn generate(&mut self, tree: &CommandTree, document: &ApiDocument) -> Event {
        match self.generator.emit(tree, document) {
            Ok(output) => {
                self.root_usage = output.root_usage.clone();
                self.files = output.files;
                Event::FinishGenerateCode {
                    root_usage: output.root_usage,
                }
            }
            Err(e) => Event::Error(BuildError::Generate(e)),
        }
    }

    fn compile(&mut self, binary_name: String) -> Event {
        let kind = self.config.backend_kind();
        let mut compiler = (self.factory)(kind, self.config.compiler_config());
        compiler.config_mut().binary_name = binary_name;
        info!(backend = %kind, binary = %compiler.config().binary_name, "compiling");

        match compiler.compile() {
            Ok(()) => {
                self.binary = Some(compiler.config().binary_path());
                Event::FinishCompile
            }
            Err(e) => Event::Error(BuildError::Compile(e)),
        }
    }

    fn install(&mut self) -> Event {
        let Some(dir) = self.config.install_dir.clone().or_else(default_install_dir) else {
            return Event::Error(BuildError::Install(InstallError::NoInstallDir));
        };
        match install_binary(&self.config.output_dir, &self.root_usage, &dir) {
            Ok(path) => {
                self.installed = Some(path.clone());
                Event::FinishInstall { path }
            }
            Err(e) => Event::Error(BuildError::Install(e)),
        }
    }
}

impl StageHandler for Stages {
    fn handle(&mut self, state: State, event: Event) -> Option<Event> {
        match (state, event) {
            (State::Generating, Event::FinishParsing { tree, document }) => {
                Some(self.generate(&tree, &document))
            }
            (State::WithCode, _) => Some(if self.config.needs_compile() {
                Event::StartCompile {
                    binary_name: self.root_usage.clone(),
                }
            } else {
                Event::End
            }),
            (State::Compiling, Event::StartCompile { binary_name }) => {
                Some(self.compile(binary_name))
            }
            (State::WithBinary, _) => Some(if self.config.needs_install() {
                Event::StartInstall
            } else {
                Event::End
            }),
            (State::Installing, _) => Some(self.install()),
            (State::Parsing | State::Installed | State::Success | State::Failure, _) => None,
            (state, event) => {
                warn!(state = %state, event = ?event.kind(), "no work for event");
                None
            }
        }
    }
}
