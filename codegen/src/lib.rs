//! Source generation for `restcmd`.
//!
//! This crate turns an API description on disk into the sources of a clap
//! command-line client:
//!
//! - [`loader`]: reads `.json` / `.yaml` documents and checks their shape.
//! - [`Generator`]: resolves the program name and base URL, builds the
//!   command tree, and writes one module per command plus the shared
//!   infrastructure files.
//! - [`ModelGenerator`]: pluggable data-model emission, with
//!   [`SerdeModelGenerator`] as the default.
//! - [`GenerationManifest`]: checksums of every file written by a run.
//! - [`output`]: human and machine readable views of a command tree.
//!
//! # Example
//!
//! ```
//! use restcmd_codegen::{Generator, GeneratorConfig};
//! use restcmd_codegen::loader::{DocumentFormat, parse_document};
//!
//! let doc = parse_document(
//!     r#"{
//!         "openapi": "3.0.3",
//!         "info": {"title": "Petstore", "version": "1.0.0"},
//!         "servers": [{"url": "https://petstore.example.com"}],
//!         "paths": {"/pets": {"get": {"operationId": "listPets"}}}
//!     }"#,
//!     DocumentFormat::Json,
//! )
//! .unwrap();
//!
//! let out = tempfile::tempdir().unwrap();
//! let generator = Generator::new(GeneratorConfig::new(out.path(), "petstore"));
//! let result = generator.generate(&doc).unwrap();
//!
//! assert_eq!(result.root_usage, "petstore");
//! assert!(out.path().join("src/cmd/pets.rs").exists());
//! assert!(out.path().join(".restcmd/manifest.json").exists());
//! ```

pub mod emit;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod model;
pub mod output;
pub mod templates;

pub use emit::{DEFAULT_ROOT_USAGE, GenerationOutput, Generator, GeneratorConfig, write_atomic};
pub use error::{CodegenError, LoadError, Result};
pub use loader::{load_document, parse_document, validate_document};
pub use manifest::{GenerationManifest, MANIFEST_PATH};
pub use model::{ModelGenerator, SerdeModelGenerator};
pub use output::{OutputFormat, format_tree};
pub use templates::{RenderOptions, Template};
