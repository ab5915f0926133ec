//! Per-node command module.

use restcmd_core::{GlobalContext, HttpMethod, NodeRef};

use super::{GENERATED_NOTICE, lit, local_path};

pub(super) fn render(node: NodeRef<'_>, ctx: &GlobalContext) -> String {
    let mut out = String::new();

    out.push_str(&format!("//! `{}` command. {GENERATED_NOTICE}\n\n", node.full_path()));
    out.push_str("use clap::{Arg, ArgMatches, Command};\n\n");
    out.push_str(&format!(
        "use {}::{{self, CliError}};\n",
        local_path(&ctx.common_import_path(), ctx)
    ));
    out.push_str(&format!(
        "use {}::{{CommandConfig, Method, RequestConfig}};\n",
        local_path(&ctx.config_import_path(), ctx)
    ));

    let children: Vec<NodeRef<'_>> = node.children().collect();
    if !children.is_empty() {
        out.push('\n');
        for child in &children {
            out.push_str(&format!("pub mod {};\n", child.identifier()));
        }
    }

    out.push('\n');
    render_config(&mut out, node);
    out.push('\n');
    render_command_fn(&mut out, node, &children);
    out.push('\n');
    render_run_fn(&mut out, node, &children);

    out
}

fn render_config(out: &mut String, node: NodeRef<'_>) {
    let methods: Vec<String> = node
        .methods()
        .keys()
        .map(|m| format!("Method::{}", variant(*m)))
        .collect();

    out.push_str("const CONFIG: CommandConfig = CommandConfig {\n");
    out.push_str(&format!("    path: {},\n", lit(&node.full_path())));
    out.push_str(&format!("    methods: &[{}],\n", methods.join(", ")));
    out.push_str(&format!(
        "    default_method: Method::{},\n",
        variant(node.default_method())
    ));

    out.push_str("    query: &[");
    let query: Vec<String> = node
        .query_params()
        .values()
        .map(|p| format!("({}, {})", lit(&p.name), p.is_bool()))
        .collect();
    out.push_str(&query.join(", "));
    out.push_str("],\n");

    out.push_str("    headers: &[");
    let headers: Vec<String> = node.header_params().keys().map(|name| lit(name)).collect();
    out.push_str(&headers.join(", "));
    out.push_str("],\n");

    out.push_str(&format!("    accepts_body: {},\n", node.accepts_body()));
    out.push_str("};\n");
}

fn render_command_fn(out: &mut String, node: NodeRef<'_>, children: &[NodeRef<'_>]) {
    let name = if node.is_root() {
        node.usage()
    } else {
        node.identifier()
    };

    out.push_str("pub fn command() -> Command {\n");
    out.push_str(&format!("    let cmd = Command::new({})\n", lit(&name)));
    out.push_str(&format!(
        "        .about({})\n",
        lit(node.short_description().trim_start())
    ));
    out.push_str(&format!(
        "        .long_about({});\n",
        lit(node.long_description().trim_start())
    ));

    if node.is_parameter() {
        let param = node.param_name();
        let help = node
            .methods()
            .values()
            .flat_map(|op| op.parameters.iter())
            .find(|p| p.name == param)
            .map(|p| p.safe_description())
            .unwrap_or_default();
        out.push_str(&format!(
            "    let cmd = cmd.arg(\n        Arg::new(common::path_id({}))\n            .value_name({})\n            .required(true)\n            .help({}),\n    );\n",
            lit(param),
            lit(param),
            lit(&help)
        ));
    }

    out.push_str("    common::with_request_args(cmd, &CONFIG)");
    for child in children {
        out.push_str(&format!("\n        .subcommand({}::command())", child.identifier()));
    }
    out.push_str("\n}\n");
}

fn render_run_fn(out: &mut String, node: NodeRef<'_>, children: &[NodeRef<'_>]) {
    let binds = node.is_parameter();
    let request = if binds { "mut request" } else { "request" };

    out.push_str(&format!(
        "pub fn run(matches: &ArgMatches, {request}: RequestConfig) -> Result<(), CliError> {{\n"
    ));
    if binds {
        out.push_str(&format!(
            "    common::bind_path_param(matches, &mut request, {});\n",
            lit(node.param_name())
        ));
    }

    if children.is_empty() {
        out.push_str("    common::execute(matches, &CONFIG, request)\n");
    } else {
        out.push_str("    match matches.subcommand() {\n");
        for child in children {
            let ident = child.identifier();
            out.push_str(&format!(
                "        Some(({}, sub)) => {ident}::run(sub, request),\n",
                lit(&ident)
            ));
        }
        out.push_str("        _ => common::execute(matches, &CONFIG, request),\n");
        out.push_str("    }\n");
    }
    out.push_str("}\n");
}

fn variant(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "Get",
        HttpMethod::Post => "Post",
        HttpMethod::Put => "Put",
        HttpMethod::Patch => "Patch",
        HttpMethod::Delete => "Delete",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restcmd_core::{CommandTreeBuilder, Operation, Parameter, ParameterLocation};

    fn ctx() -> GlobalContext {
        GlobalContext::new("petctl", "petstore", "https://api.example.com")
    }

    #[test]
    fn test_parameter_node_module() {
        let tree = CommandTreeBuilder::new()
            .with_binding(
                "/pets/{petId}",
                HttpMethod::Get,
                Operation::new("getPet").with_parameter(
                    Parameter::new("petId", ParameterLocation::Path)
                        .with_description("The `id` of the pet"),
                ),
            )
            .with_binding("/pets/{petId}", HttpMethod::Delete, Operation::new("deletePet"))
            .with_binding("/pets/{petId}/toys", HttpMethod::Get, Operation::new("listToys"))
            .build(ctx());

        let node = tree.node(tree.find("/pets/{petId}").unwrap());
        let source = render(node, &ctx());

        assert!(source.contains("pub mod toys;"));
        assert!(source.contains("path: \"/pets/{petId}\","));
        assert!(source.contains("methods: &[Method::Get, Method::Delete],"));
        assert!(source.contains("Command::new(\"petid\")"));
        assert!(source.contains("Arg::new(common::path_id(\"petId\"))"));
        assert!(source.contains(".help(\"The \\\"id\\\" of the pet\")"));
        assert!(source.contains("common::bind_path_param(matches, &mut request, \"petId\");"));
        assert!(source.contains("Some((\"toys\", sub)) => toys::run(sub, request),"));
    }

    #[test]
    fn test_root_module_uses_program_name() {
        let tree = CommandTreeBuilder::new()
            .with_binding("/pets", HttpMethod::Get, Operation::new("listPets"))
            .build(ctx());

        let source = render(tree.root(), &ctx());
        assert!(source.contains("Command::new(\"petctl\")"));
        assert!(source.contains("methods: &[],"));
        assert!(source.contains("pub fn run(matches: &ArgMatches, request: RequestConfig)"));
        assert!(source.contains("use crate::common::{self, CliError};"));
    }

    #[test]
    fn test_query_and_header_params() {
        let op = Operation::new("listPets")
            .with_parameter(Parameter::new("limit", ParameterLocation::Query))
            .with_parameter(Parameter {
                schema: Some(serde_json::json!({"type": "boolean"})),
                ..Parameter::new("all", ParameterLocation::Query)
            })
            .with_parameter(Parameter::new("X-Trace", ParameterLocation::Header));
        let tree = CommandTreeBuilder::new()
            .with_binding("/pets", HttpMethod::Get, op)
            .build(ctx());

        let source = render(tree.root().child("pets").unwrap(), &ctx());
        assert!(source.contains("query: &[(\"all\", true), (\"limit\", false)],"));
        assert!(source.contains("headers: &[\"X-Trace\"],"));
        assert!(source.contains("accepts_body: false,"));
    }
}
