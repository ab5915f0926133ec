//! Emission of the generated crate.
//!
//! [`Generator`] resolves the base URL and program name for a document,
//! builds its command tree, and writes the command-tree mirror plus the
//! fixed infrastructure files into the output directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use restcmd_core::naming::program_name;
use restcmd_core::{ApiDocument, CommandTree, CommandTreeBuilder, GlobalContext, NodeId, NodeRef};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{CodegenError, Result};
use crate::manifest::{GenerationManifest, MANIFEST_PATH};
use crate::model::{ModelGenerator, SerdeModelGenerator};
use crate::templates::{RenderOptions, Template};

/// Program name used when neither a name nor a document title is available.
pub const DEFAULT_ROOT_USAGE: &str = "restcmd-cli";

/// Generator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub output_dir: PathBuf,
    /// Package name of the generated crate.
    pub module_name: String,
    /// Explicit program name; falls back to the document title.
    pub command_name: Option<String>,
    /// Explicit base URL; falls back to the first document server.
    pub server_url: Option<String>,
    pub with_model: bool,
    /// Emit `Cargo.toml` and `src/main.rs`.
    pub with_entry_point: bool,
}

impl GeneratorConfig {
    pub fn new(output_dir: impl Into<PathBuf>, module_name: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            module_name: module_name.to_string(),
            command_name: None,
            server_url: None,
            with_model: false,
            with_entry_point: false,
        }
    }

    pub fn with_command_name(mut self, name: &str) -> Self {
        self.command_name = Some(name.to_string());
        self
    }

    pub fn with_server_url(mut self, url: &str) -> Self {
        self.server_url = Some(url.to_string());
        self
    }

    pub fn with_model(mut self, enabled: bool) -> Self {
        self.with_model = enabled;
        self
    }

    pub fn with_entry_point(mut self, enabled: bool) -> Self {
        self.with_entry_point = enabled;
        self
    }
}

/// Summary of one emission run.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub root_usage: String,
    /// Files written, relative to the output directory.
    pub files: Vec<String>,
    pub manifest: GenerationManifest,
    /// Files a previous run wrote that were edited by hand before this run
    /// replaced them.
    pub overwritten_edits: Vec<String>,
}

/// Drives tree construction and file emission.
pub struct Generator {
    config: GeneratorConfig,
    model: Box<dyn ModelGenerator>,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Generator {
    /// Creates a generator using [`SerdeModelGenerator`] for models.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            model: Box::new(SerdeModelGenerator),
        }
    }

    /// Replaces the model generator.
    pub fn with_model_generator(mut self, model: Box<dyn ModelGenerator>) -> Self {
        self.model = model;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Explicit server URL, else the first document server.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::MissingServerUrl`] when no URL is configured
    /// and the document has no server, or only `/`.
    pub fn effective_server_url(&self, doc: &ApiDocument) -> Result<String> {
        if let Some(url) = self.config.server_url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }
        match doc.first_server_url().map(str::trim) {
            Some(url) if !url.is_empty() && url != "/" => Ok(url.to_string()),
            _ => Err(CodegenError::MissingServerUrl),
        }
    }

    /// Explicit command name, else the normalized title, else
    /// [`DEFAULT_ROOT_USAGE`].
    pub fn effective_root_usage(&self, doc: &ApiDocument) -> String {
        if let Some(name) = self.config.command_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let from_title = program_name(&doc.info.title);
        if from_title.is_empty() {
            DEFAULT_ROOT_USAGE.to_string()
        } else {
            from_title
        }
    }

    /// Builds the command tree with its global context attached.
    pub fn build_tree(&self, doc: &ApiDocument) -> Result<CommandTree> {
        let base_url = self.effective_server_url(doc)?;
        let root_usage = self.effective_root_usage(doc);
        let context = GlobalContext::new(&root_usage, &self.config.module_name, &base_url);
        Ok(CommandTreeBuilder::from_document(doc).build(context))
    }

    /// Writes every file of the generated crate for `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::DuplicateDestination`] before anything is
    /// written when two commands map to the same file, and
    /// [`CodegenError::Write`] when a file cannot be written.
    pub fn emit(&self, tree: &CommandTree, doc: &ApiDocument) -> Result<GenerationOutput> {
        let ctx = tree.context().ok_or(CodegenError::MissingContext)?;
        let root = tree.root();
        let options = RenderOptions {
            with_model: self.config.with_model,
        };

        let destinations = command_destinations(tree, ctx)?;
        let overwritten_edits = self.hand_edited_files();
        for rel in &overwritten_edits {
            warn!(file = %rel, "overwriting generated file that was edited by hand");
        }

        let mut manifest = GenerationManifest::new(&ctx.module_name, &ctx.root_usage, &ctx.base_url);
        let mut files = Vec::new();

        for (id, rel) in destinations {
            let node = tree.node(id);
            let content = Template::Command.render(node, ctx, options);
            self.write(&rel, &content, &mut manifest, &mut files)?;
        }

        let mut templates = Template::INFRASTRUCTURE.to_vec();
        if self.config.with_entry_point {
            templates.extend(Template::ENTRY_POINT);
        }
        for template in templates {
            if let Some(rel) = template.destination(ctx) {
                let content = template.render(root, ctx, options);
                self.write(&rel, &content, &mut manifest, &mut files)?;
            }
        }

        if self.config.with_model {
            let content = self.model.generate(doc)?;
            let rel = format!("{}/mod.rs", ctx.model_dir);
            self.write(&rel, &content, &mut manifest, &mut files)?;
        }

        manifest.save(&self.config.output_dir)?;
        info!(
            output = %self.config.output_dir.display(),
            files = files.len(),
            "generation completed"
        );

        Ok(GenerationOutput {
            root_usage: ctx.root_usage.clone(),
            files,
            manifest,
            overwritten_edits,
        })
    }

    /// Builds the tree for `doc` and emits it.
    pub fn generate(&self, doc: &ApiDocument) -> Result<GenerationOutput> {
        let tree = self.build_tree(doc)?;
        self.emit(&tree, doc)
    }

    /// Files recorded by the previous run whose content changed since.
    fn hand_edited_files(&self) -> Vec<String> {
        let output_dir = &self.config.output_dir;
        if !output_dir.join(MANIFEST_PATH).exists() {
            return Vec::new();
        }
        match GenerationManifest::load(output_dir) {
            Ok(previous) => previous
                .modified_files(output_dir)
                .into_iter()
                .filter(|rel| output_dir.join(rel).exists())
                .collect(),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable manifest from a previous run");
                Vec::new()
            }
        }
    }

    fn write(
        &self,
        rel: &str,
        content: &str,
        manifest: &mut GenerationManifest,
        files: &mut Vec<String>,
    ) -> Result<()> {
        let path = self.config.output_dir.join(rel);
        write_atomic(&path, content)?;
        debug!(path = %path.display(), "wrote file");
        manifest.record(rel, content.as_bytes());
        files.push(rel.to_string());
        Ok(())
    }
}

/// Destination of a node's module relative to the output directory.
///
/// The root maps to `<command dir>.rs`; every other node to
/// `<command dir>/<ancestor identifiers...>/<identifier>.rs`.
pub fn command_destination(node: NodeRef<'_>, ctx: &GlobalContext) -> String {
    if node.is_root() {
        return format!("{}.rs", ctx.command_dir);
    }
    let relative = node.data().relative_path.trim_matches('/');
    format!("{}/{relative}.rs", ctx.command_dir)
}

/// Destinations of every node in walk order.
///
/// Sibling segments can normalize to one identifier (`{id}` and `id`, or
/// `Pets` and `pets`); such nodes would share a file, so they are rejected.
fn command_destinations(
    tree: &CommandTree,
    ctx: &GlobalContext,
) -> Result<Vec<(NodeId, String)>> {
    let mut claimed: BTreeMap<String, String> = BTreeMap::new();
    let mut destinations = Vec::new();
    for id in tree.walk() {
        let node = tree.node(id);
        let rel = command_destination(node, ctx);
        if let Some(first) = claimed.insert(rel.clone(), node.full_path()) {
            return Err(CodegenError::DuplicateDestination {
                file: rel,
                first,
                second: node.full_path(),
            });
        }
        destinations.push((id, rel));
    }
    Ok(destinations)
}

/// Writes `content` to `path` through a temporary file in the same
/// directory, creating parent directories as needed.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let write_err = |source| CodegenError::Write {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(parent).map_err(write_err)?;
    let temp = NamedTempFile::new_in(parent).map_err(write_err)?;
    std::fs::write(temp.path(), content).map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
