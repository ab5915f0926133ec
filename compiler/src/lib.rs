//! Build backends for generated `restcmd` clients.
//!
//! A [`Compiler`] turns the crate written by `restcmd-codegen` into an
//! executable. Two backends exist:
//!
//! - [`NativeCompiler`] runs `cargo build` on the host.
//! - [`ContainerCompiler`] runs the same build inside a Rust image through
//!   the `docker` CLI.
//!
//! Every child process may be bounded by [`CompilerConfig::timeout`]. When
//! no timeout is set the backends wait for the tools indefinitely.
//!
//! [`install_binary`] copies a finished binary into a directory on `PATH`.

pub mod backend;
pub mod config;
pub mod container;
pub mod error;
pub mod install;
pub mod native;
pub mod process;

pub use backend::{Compiler, CompilerKind, new_compiler};
pub use config::{CompilerConfig, DEFAULT_CONTAINER_IMAGE, TargetSpec};
pub use container::ContainerCompiler;
pub use error::{CompileError, InstallError};
pub use install::{default_install_dir, install_binary};
pub use native::NativeCompiler;
