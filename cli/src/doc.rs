//! Markdown reference pages for restcmd's own command line.
//!
//! One page per command, named after the command chain
//! (`restcmd.md`, `restcmd_generate.md`, ...), each with a synopsis, the
//! options and links to the parent and child pages.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Arg, Command};
use tracing::{debug, info};

/// Replaces `dir` with a fresh page tree for `root` and its subcommands.
///
/// Returns the written pages in depth-first order.
pub fn write_tree(root: &Command, dir: &Path) -> io::Result<Vec<PathBuf>> {
    if dir.exists() {
        debug!(dir = %dir.display(), "removing previous documentation");
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)?;

    let mut root = root.clone();
    root.build();

    let mut written = Vec::new();
    write_pages(&root, &[], dir, &mut written)?;
    info!(dir = %dir.display(), pages = written.len(), "documentation written");
    Ok(written)
}

fn write_pages(
    cmd: &Command,
    parents: &[&str],
    dir: &Path,
    written: &mut Vec<PathBuf>,
) -> io::Result<()> {
    let mut chain = parents.to_vec();
    chain.push(cmd.get_name());

    let path = dir.join(page_name(&chain));
    std::fs::write(&path, render_page(cmd, &chain))?;
    debug!(page = %path.display(), "wrote page");
    written.push(path);

    for sub in documented(cmd) {
        write_pages(sub, &chain, dir, written)?;
    }
    Ok(())
}

fn documented(cmd: &Command) -> impl Iterator<Item = &Command> {
    cmd.get_subcommands()
        .filter(|sub| sub.get_name() != "help" && !sub.is_hide_set())
}

fn page_name(chain: &[&str]) -> String {
    format!("{}.md", chain.join("_"))
}

/// Renders the page of `cmd`, where `chain` runs from the program name to
/// `cmd` itself.
pub fn render_page(cmd: &Command, chain: &[&str]) -> String {
    let full_name = chain.join(" ");
    let mut out = String::new();

    let _ = writeln!(out, "## {full_name}\n");
    if let Some(about) = cmd.get_about() {
        let _ = writeln!(out, "{about}\n");
    }

    out.push_str("### Synopsis\n\n");
    if let Some(long) = cmd.get_long_about() {
        let _ = writeln!(out, "{long}\n");
    }
    let usage = cmd.clone().bin_name(&full_name).render_usage().to_string();
    let usage = usage.trim().trim_start_matches("Usage:").trim();
    let _ = writeln!(out, "```\n{usage}\n```\n");

    let args: Vec<&Arg> = cmd.get_arguments().filter(|a| !a.is_hide_set()).collect();
    if !args.is_empty() {
        out.push_str("### Options\n\n```\n");
        for arg in args {
            let help = arg.get_help().map(ToString::to_string).unwrap_or_default();
            let _ = writeln!(out, "  {:<32} {help}", arg_synopsis(arg));
        }
        out.push_str("```\n\n");
    }

    let parent = &chain[..chain.len() - 1];
    let children: Vec<&Command> = documented(cmd).collect();
    if !parent.is_empty() || !children.is_empty() {
        out.push_str("### See also\n\n");
        if !parent.is_empty() {
            let _ = writeln!(out, "* [{}]({})", parent.join(" "), page_name(parent));
        }
        for child in children {
            let mut child_chain = chain.to_vec();
            child_chain.push(child.get_name());
            let about = child.get_about().map(ToString::to_string).unwrap_or_default();
            let _ = writeln!(
                out,
                "* [{}]({}) - {about}",
                child_chain.join(" "),
                page_name(&child_chain)
            );
        }
    }

    out
}

/// `-i, --input <INPUT>`, `    --with-model`, or `<FILE>` for positionals.
fn arg_synopsis(arg: &Arg) -> String {
    let mut out = match (arg.get_short(), arg.get_long()) {
        (Some(short), Some(long)) => format!("-{short}, --{long}"),
        (None, Some(long)) => format!("    --{long}"),
        (Some(short), None) => format!("-{short}"),
        (None, None) => return value_placeholder(arg),
    };
    if arg.get_action().takes_values() {
        out.push(' ');
        out.push_str(&value_placeholder(arg));
    }
    out
}

fn value_placeholder(arg: &Arg) -> String {
    match arg.get_value_names() {
        Some(names) if !names.is_empty() => names
            .iter()
            .map(|name| format!("<{name}>"))
            .collect::<Vec<_>>()
            .join(" "),
        _ => format!("<{}>", arg.get_id().as_str().to_uppercase()),
    }
}
