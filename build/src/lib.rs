//! Build orchestration for `restcmd`.
//!
//! A build reads an OpenAPI document, writes a client crate, and
//! optionally compiles and installs it. The stages are sequenced by an
//! explicit [`StateMachine`]; [`Builder`] is the entry point that wires the
//! stages of `restcmd-codegen` and `restcmd-compiler` into it.
//!
//! ```no_run
//! use restcmd_build::{BuildConfig, Builder, State};
//!
//! let config = BuildConfig::new("petstore.yaml", "petstore");
//! let mut builder = Builder::new(config);
//! match builder.run() {
//!     Ok(report) => println!("{} files written", report.files.len()),
//!     Err(e) => {
//!         assert_eq!(builder.state(), State::Failure);
//!         eprintln!("error: {e}");
//!     }
//! }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod state;

pub use builder::{BuildReport, Builder, CompilerFactory};
pub use config::{BuildConfig, BuildConfigFile, DEFAULT_OUTPUT_DIR};
pub use error::{BuildError, ConfigError, Result};
pub use state::{Event, EventKind, StageHandler, State, StateMachine, transition};
