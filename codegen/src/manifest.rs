//! Generation manifest.
//!
//! Every generation run records the files it wrote, each with a SHA-256
//! checksum, under `.restcmd/manifest.json` in the output directory. A later
//! run (or a human) can compare the manifest against the tree to see which
//! generated files were edited by hand.
//!
//! # Examples
//!
//! ```
//! use restcmd_codegen::GenerationManifest;
//!
//! let mut manifest = GenerationManifest::new("petstore", "petctl", "https://api.example.com");
//! manifest.record("src/cmd.rs", b"pub fn command() {}");
//!
//! let entry = manifest.get("src/cmd.rs").unwrap();
//! assert_eq!(entry.bytes, 19);
//! assert_eq!(entry.checksum.len(), 64);
//! ```

use std::collections::BTreeMap;
use std::io::BufReader;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::emit::write_atomic;
use crate::error::{CodegenError, Result};

/// Manifest location relative to the output directory.
pub const MANIFEST_PATH: &str = ".restcmd/manifest.json";

/// One emitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// SHA-256 hex digest of the file contents.
    pub checksum: String,
    /// File size in bytes.
    pub bytes: u64,
}

/// Record of a single generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationManifest {
    /// Version of the generator that wrote the files.
    pub tool_version: String,
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    pub module_name: String,
    pub root_usage: String,
    pub base_url: String,
    /// Emitted files keyed by path relative to the output directory,
    /// always with `/` separators.
    pub files: BTreeMap<String, FileEntry>,
}

impl GenerationManifest {
    pub fn new(module_name: &str, root_usage: &str, base_url: &str) -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            module_name: module_name.to_string(),
            root_usage: root_usage.to_string(),
            base_url: base_url.to_string(),
            files: BTreeMap::new(),
        }
    }

    /// Records `content` as written to `relative_path`.
    pub fn record(&mut self, relative_path: &str, content: &[u8]) {
        self.files.insert(
            relative_path.replace('\\', "/"),
            FileEntry {
                checksum: checksum(content),
                bytes: content.len() as u64,
            },
        );
    }

    pub fn get(&self, relative_path: &str) -> Option<&FileEntry> {
        self.files.get(relative_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Loads a manifest from `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::Write`] if the file cannot be opened, or
    /// [`CodegenError::Manifest`] if it is not valid manifest JSON.
    pub fn load(output_dir: impl AsRef<Path>) -> Result<Self> {
        let path = output_dir.as_ref().join(MANIFEST_PATH);
        let file = std::fs::File::open(&path).map_err(|source| CodegenError::Write {
            path: path.clone(),
            source,
        })?;
        let manifest = serde_json::from_reader(BufReader::new(file))?;
        Ok(manifest)
    }

    /// Writes the manifest into `output_dir` as pretty-printed JSON.
    pub fn save(&self, output_dir: impl AsRef<Path>) -> Result<()> {
        let path = output_dir.as_ref().join(MANIFEST_PATH);
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(&path, &json)
    }

    /// Returns recorded files whose on-disk content no longer matches.
    ///
    /// Missing files count as modified.
    pub fn modified_files(&self, output_dir: impl AsRef<Path>) -> Vec<String> {
        let root = output_dir.as_ref();
        self.files
            .iter()
            .filter(|(rel, entry)| match std::fs::read(root.join(rel)) {
                Ok(bytes) => checksum(&bytes) != entry.checksum,
                Err(_) => true,
            })
            .map(|(rel, _)| rel.clone())
            .collect()
    }
}

/// SHA-256 hex digest of `bytes`.
pub fn checksum(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    format!("{:x}", hash)
}
