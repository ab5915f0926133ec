//! Source templates for the generated client.
//!
//! Each [`Template`] renders one file of the generated crate. Templates are
//! plain string builders fed with a [`NodeRef`] (the node being emitted, or
//! the root for crate-level files) and the tree's [`GlobalContext`].

mod command;
mod infra;

use restcmd_core::{GlobalContext, NodeRef};

/// Options that change what crate-level templates emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Declare the `model` module.
    pub with_model: bool,
}

/// The fixed template set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// One module per command node.
    Command,
    Common,
    ConfigMod,
    ConfigCommand,
    ConfigRequest,
    ConfigMethod,
    ConfigExtension,
    Service,
    App,
    Lib,
    /// `Cargo.toml`, only emitted when compiling.
    CargoManifest,
    /// `src/main.rs`, only emitted when compiling.
    Main,
}

impl Template {
    /// Infrastructure templates emitted for every run.
    pub const INFRASTRUCTURE: [Template; 9] = [
        Template::Common,
        Template::ConfigMod,
        Template::ConfigCommand,
        Template::ConfigRequest,
        Template::ConfigMethod,
        Template::ConfigExtension,
        Template::Service,
        Template::App,
        Template::Lib,
    ];

    /// Templates that turn the sources into a buildable package.
    pub const ENTRY_POINT: [Template; 2] = [Template::CargoManifest, Template::Main];

    /// Destination relative to the output directory.
    ///
    /// Returns `None` for [`Template::Command`], whose destination depends on
    /// the node.
    pub fn destination(self, ctx: &GlobalContext) -> Option<String> {
        let path = match self {
            Template::Command => return None,
            Template::Common => format!(
                "{}/{}.rs",
                parent_dir(&ctx.command_dir),
                restcmd_core::COMMON_MODULE
            ),
            Template::ConfigMod => format!("{}/mod.rs", ctx.config_dir),
            Template::ConfigCommand => format!("{}/command.rs", ctx.config_dir),
            Template::ConfigRequest => format!("{}/request.rs", ctx.config_dir),
            Template::ConfigMethod => format!("{}/method.rs", ctx.config_dir),
            Template::ConfigExtension => format!("{}/extension.rs", ctx.config_dir),
            Template::Service => format!("{}/mod.rs", ctx.service_dir),
            Template::App => format!("{}.rs", ctx.app_dir),
            Template::Lib => format!("{}/lib.rs", parent_dir(&ctx.command_dir)),
            Template::CargoManifest => "Cargo.toml".to_string(),
            Template::Main => format!("{}/main.rs", parent_dir(&ctx.command_dir)),
        };
        Some(path)
    }

    /// Renders the template for `node`.
    pub fn render(self, node: NodeRef<'_>, ctx: &GlobalContext, options: RenderOptions) -> String {
        match self {
            Template::Command => command::render(node, ctx),
            Template::Common => infra::common(ctx),
            Template::ConfigMod => infra::config_mod(ctx),
            Template::ConfigCommand => infra::config_command(),
            Template::ConfigRequest => infra::config_request(),
            Template::ConfigMethod => infra::config_method(),
            Template::ConfigExtension => infra::config_extension(ctx),
            Template::Service => infra::service(ctx),
            Template::App => infra::app(ctx),
            Template::Lib => infra::lib(ctx, options),
            Template::CargoManifest => infra::cargo_manifest(ctx),
            Template::Main => infra::main(ctx),
        }
    }
}

fn parent_dir(dir: &str) -> &str {
    dir.rsplit_once('/').map(|(parent, _)| parent).unwrap_or(".")
}

/// Rewrites an import path rooted at the crate ident to a `crate::` path.
fn local_path(path: &str, ctx: &GlobalContext) -> String {
    let ident = ctx.crate_ident();
    match path.strip_prefix(ident.as_str()) {
        Some(rest) => format!("crate{rest}"),
        None => path.to_string(),
    }
}

/// Rust string literal for `s`.
fn lit(s: &str) -> String {
    format!("{s:?}")
}

const GENERATED_NOTICE: &str = "Generated by restcmd; do not edit.";
