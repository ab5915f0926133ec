//! Output formatting for command trees.

use restcmd_core::{CommandTree, HttpMethod, NodeRef};
use serde::Serialize;

/// Supported output formats.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

/// Serializable view of one command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandView {
    pub path: String,
    pub identifier: String,
    pub usage: String,
    pub function: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CommandView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodView {
    pub method: HttpMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl CommandView {
    pub fn from_node(node: NodeRef<'_>) -> Self {
        Self {
            path: node.full_path(),
            identifier: node.identifier(),
            usage: node.usage(),
            function: node.function_name(),
            methods: node
                .methods()
                .iter()
                .map(|(method, op)| MethodView {
                    method: *method,
                    operation_id: op.operation_id.clone(),
                    summary: op.summary.clone(),
                })
                .collect(),
            children: node.children().map(CommandView::from_node).collect(),
        }
    }
}

/// Formats a command tree in the requested output format.
pub fn format_tree(tree: &CommandTree, format: OutputFormat) -> Result<String, String> {
    let view = CommandView::from_node(tree.root());
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&view)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(&view).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(tree_to_markdown(tree)),
        OutputFormat::Table => Ok(tree_to_table(tree)),
    }
}

fn method_list(node: NodeRef<'_>) -> String {
    node.methods()
        .keys()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn tree_to_markdown(tree: &CommandTree) -> String {
    let mut out = String::new();
    let root = tree.root();

    out.push_str(&format!("# {}\n\n", root.usage()));
    if let Some(ctx) = tree.context() {
        out.push_str(&format!("**Base URL:** {}\n\n", ctx.base_url));
    }

    out.push_str("| Command | Path | Methods |\n");
    out.push_str("|---------|------|---------|\n");
    for id in tree.walk() {
        let node = tree.node(id);
        out.push_str(&format!(
            "| `{}` | `{}` | {} |\n",
            command_line(node),
            node.full_path(),
            method_list(node)
        ));
    }
    out.push('\n');

    out
}

fn tree_to_table(tree: &CommandTree) -> String {
    let mut out = String::new();
    let rows: Vec<(String, String)> = tree
        .walk()
        .into_iter()
        .map(|id| {
            let node = tree.node(id);
            let label = format!("{}{}", "  ".repeat(node.depth()), node.usage());
            (label, method_list(node))
        })
        .collect();

    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(4);
    for (label, methods) in rows {
        if methods.is_empty() {
            out.push_str(&format!("{label}\n"));
        } else {
            out.push_str(&format!("{:<width$}  {methods}\n", label, width = width));
        }
    }

    out
}

/// Full invocation, e.g. `petctl pets id <id>`.
fn command_line(node: NodeRef<'_>) -> String {
    let mut parts = Vec::new();
    let mut current = Some(node);
    while let Some(n) = current {
        if n.is_root() {
            parts.push(n.usage());
        } else if n.is_parameter() {
            parts.push(format!("{} {}", n.identifier(), n.usage()));
        } else {
            parts.push(n.identifier());
        }
        current = n.parent();
    }
    parts.reverse();
    parts.join(" ")
}
