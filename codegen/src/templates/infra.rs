//! Crate-level files shared by every generated command.

use restcmd_core::GlobalContext;

use super::{GENERATED_NOTICE, RenderOptions, lit, local_path};

fn header(title: &str) -> String {
    format!("//! {title} {GENERATED_NOTICE}\n\n")
}

/// Environment variable prefix derived from the program name.
fn env_prefix(ctx: &GlobalContext) -> String {
    ctx.root_usage
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

const COMMON: &str = r#"use std::error::Error;
use std::fmt;

use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;

use __CONFIG__::{CommandConfig, Method, RequestConfig};
use __SERVICE__::{self, ServiceError};

/// Errors surfaced to the user by generated commands.
#[derive(Debug)]
pub enum CliError {
    /// The command has no bound operation and no subcommand was given.
    NoOperation(&'static str),
    InvalidBody(serde_json::Error),
    InvalidField(String),
    Service(ServiceError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NoOperation(path) => write!(f, "no operation bound to {path}"),
            CliError::InvalidBody(e) => write!(f, "invalid JSON body: {e}"),
            CliError::InvalidField(field) => {
                write!(f, "invalid field {field:?}, expected key=value")
            }
            CliError::Service(e) => write!(f, "{e}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CliError::InvalidBody(e) => Some(e),
            CliError::Service(e) => Some(e),
            _ => None,
        }
    }
}

pub fn path_id(name: &str) -> String {
    format!("path:{name}")
}

pub fn query_id(name: &str) -> String {
    format!("query:{name}")
}

pub fn header_id(name: &str) -> String {
    format!("header:{name}")
}

/// Adds the method, parameter and body arguments described by `config`.
pub fn with_request_args(cmd: Command, config: &CommandConfig) -> Command {
    if config.methods.is_empty() {
        return cmd.subcommand_required(true).arg_required_else_help(true);
    }

    let names: Vec<&'static str> = config.methods.iter().map(|m| m.as_str()).collect();
    let mut cmd = cmd.arg(
        Arg::new("method")
            .short('X')
            .long("method")
            .value_parser(names)
            .ignore_case(true)
            .default_value(config.default_method.as_str())
            .help("HTTP method to call"),
    );

    for (name, is_flag) in config.query {
        let arg = Arg::new(query_id(name)).long(*name).help("Query parameter");
        let arg = if *is_flag {
            arg.action(ArgAction::SetTrue)
        } else {
            arg.value_name("VALUE")
        };
        cmd = cmd.arg(arg);
    }

    for name in config.headers {
        cmd = cmd.arg(
            Arg::new(header_id(name))
                .long(name.to_lowercase())
                .value_name("VALUE")
                .help("Request header"),
        );
    }

    if config.accepts_body {
        cmd = cmd
            .arg(
                Arg::new("data")
                    .short('d')
                    .long("data")
                    .value_name("JSON")
                    .conflicts_with("field")
                    .help("Request body as a JSON document"),
            )
            .arg(
                Arg::new("field")
                    .short('f')
                    .long("field")
                    .value_name("KEY=VALUE")
                    .action(ArgAction::Append)
                    .help("Request body field; repeatable"),
            );
    }

    cmd
}

/// Records the positional value of a path parameter.
pub fn bind_path_param(matches: &ArgMatches, request: &mut RequestConfig, name: &str) {
    if let Some(value) = matches.get_one::<String>(&path_id(name)) {
        request.path_params.insert(name.to_string(), value.clone());
    }
}

/// Sends the request described by `config` and prints the response.
pub fn execute(
    matches: &ArgMatches,
    config: &CommandConfig,
    mut request: RequestConfig,
) -> Result<(), CliError> {
    if config.methods.is_empty() {
        return Err(CliError::NoOperation(config.path));
    }

    request.method = matches
        .get_one::<String>("method")
        .and_then(|m| m.parse::<Method>().ok())
        .unwrap_or(config.default_method);
    request.path = config.path.to_string();

    for (name, is_flag) in config.query {
        let id = query_id(name);
        if *is_flag {
            if matches.get_flag(&id) {
                request.query.push((name.to_string(), "true".to_string()));
            }
        } else if let Some(value) = matches.get_one::<String>(&id) {
            request.query.push((name.to_string(), value.clone()));
        }
    }

    for name in config.headers {
        if let Some(value) = matches.get_one::<String>(&header_id(name)) {
            request.headers.push((name.to_string(), value.clone()));
        }
    }

    if config.accepts_body {
        request.body = read_body(matches)?;
    }

    let response = service::send(&request).map_err(CliError::Service)?;
    println!("{response}");
    Ok(())
}

fn read_body(matches: &ArgMatches) -> Result<Option<Value>, CliError> {
    if let Some(raw) = matches.get_one::<String>("data") {
        return serde_json::from_str(raw).map(Some).map_err(CliError::InvalidBody);
    }

    let Some(fields) = matches.get_many::<String>("field") else {
        return Ok(None);
    };
    let mut body = serde_json::Map::new();
    for field in fields {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| CliError::InvalidField(field.clone()))?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        body.insert(key.to_string(), value);
    }
    Ok(Some(Value::Object(body)))
}
"#;

pub(super) fn common(ctx: &GlobalContext) -> String {
    let mut out = header("Shared helpers for generated commands.");
    out.push_str(
        &COMMON
            .replace("__CONFIG__", &local_path(&ctx.config_import_path(), ctx))
            .replace("__SERVICE__", &local_path(&ctx.service_import_path(), ctx)),
    );
    out
}

pub(super) fn config_mod(ctx: &GlobalContext) -> String {
    let mut out = header("Request configuration.");
    out.push_str("mod command;\nmod extension;\nmod method;\nmod request;\n\n");
    out.push_str("pub use command::CommandConfig;\n");
    out.push_str("pub use extension::apply_environment;\n");
    out.push_str("pub use method::Method;\n");
    out.push_str("pub use request::RequestConfig;\n\n");
    out.push_str("/// Program name.\n");
    out.push_str(&format!("pub const ROOT_USAGE: &str = {};\n\n", lit(&ctx.root_usage)));
    out.push_str("/// Server every request is sent to unless overridden.\n");
    out.push_str(&format!("pub const BASE_URL: &str = {};\n", lit(&ctx.base_url)));
    out
}

const CONFIG_COMMAND: &str = r#"use super::Method;

/// Static description of one command's operations.
#[derive(Debug, Clone, Copy)]
pub struct CommandConfig {
    /// URL path template, e.g. `/pets/{id}`.
    pub path: &'static str,
    /// Bound methods in declaration order.
    pub methods: &'static [Method],
    pub default_method: Method,
    /// Query parameters as `(name, is_flag)`.
    pub query: &'static [(&'static str, bool)],
    pub headers: &'static [&'static str],
    pub accepts_body: bool,
}
"#;

pub(super) fn config_command() -> String {
    let mut out = header("Per-command configuration.");
    out.push_str(CONFIG_COMMAND);
    out
}

const CONFIG_REQUEST: &str = r#"use std::collections::BTreeMap;

use serde_json::Value;

use super::Method;

/// Everything needed to send one request.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub base_url: String,
    pub path: String,
    pub method: Method,
    pub path_params: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub token: Option<String>,
}

impl RequestConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            path: String::new(),
            method: Method::Get,
            path_params: BTreeMap::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            token: None,
        }
    }

    /// Full URL with path parameters substituted.
    pub fn url(&self) -> String {
        let mut path = self.path.clone();
        for (name, value) in &self.path_params {
            path = path.replace(&format!("{{{name}}}"), &encode(value));
        }
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
"#;

pub(super) fn config_request() -> String {
    let mut out = header("Outgoing request description.");
    out.push_str(CONFIG_REQUEST);
    out
}

const CONFIG_METHOD: &str = r#"use std::fmt;
use std::str::FromStr;

/// HTTP methods a command can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}
"#;

pub(super) fn config_method() -> String {
    let mut out = header("HTTP methods.");
    out.push_str(CONFIG_METHOD);
    out
}

const CONFIG_EXTENSION: &str = r#"use super::RequestConfig;

/// Overrides the base URL.
pub const BASE_URL_VAR: &str = "__PREFIX___BASE_URL";
/// Bearer token sent with every request.
pub const TOKEN_VAR: &str = "__PREFIX___TOKEN";
/// Extra headers as `Name:value` pairs separated by `,`.
pub const HEADERS_VAR: &str = "__PREFIX___HEADERS";

/// Applies environment overrides to `request`.
///
/// The base URL is only replaced when `base_url_is_default` is set, so an
/// explicit `--base-url` always wins.
pub fn apply_environment(request: &mut RequestConfig, base_url_is_default: bool) {
    if base_url_is_default {
        if let Ok(url) = std::env::var(BASE_URL_VAR) {
            request.base_url = url;
        }
    }
    if let Ok(token) = std::env::var(TOKEN_VAR) {
        request.token = Some(token);
    }
    if let Ok(headers) = std::env::var(HEADERS_VAR) {
        for pair in headers.split(',') {
            if let Some((name, value)) = pair.split_once(':') {
                request
                    .headers
                    .push((name.trim().to_string(), value.trim().to_string()));
            }
        }
    }
}
"#;

pub(super) fn config_extension(ctx: &GlobalContext) -> String {
    let mut out = header("Environment overrides.");
    out.push_str(&CONFIG_EXTENSION.replace("__PREFIX__", &env_prefix(ctx)));
    out
}

const SERVICE: &str = r#"use std::error::Error;
use std::fmt;

use reqwest::blocking::Client;

use __CONFIG__::{Method, RequestConfig};

#[derive(Debug)]
pub enum ServiceError {
    Request(reqwest::Error),
    Status { status: u16, body: String },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Request(e) => write!(f, "request failed: {e}"),
            ServiceError::Status { status, body } => write!(f, "HTTP {status}: {body}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ServiceError::Request(e) => Some(e),
            ServiceError::Status { .. } => None,
        }
    }
}

/// Sends `request` and returns the response body, pretty-printed when it
/// is JSON.
pub fn send(request: &RequestConfig) -> Result<String, ServiceError> {
    let client = Client::new();
    let method = match request.method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    };

    let mut builder = client.request(method, request.url());
    if !request.query.is_empty() {
        builder = builder.query(&request.query);
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(token) = &request.token {
        builder = builder.bearer_auth(token);
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let response = builder.send().map_err(ServiceError::Request)?;
    let status = response.status();
    let text = response.text().map_err(ServiceError::Request)?;
    if !status.is_success() {
        return Err(ServiceError::Status {
            status: status.as_u16(),
            body: text,
        });
    }

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => Ok(serde_json::to_string_pretty(&value).unwrap_or(text)),
        Err(_) => Ok(text),
    }
}
"#;

pub(super) fn service(ctx: &GlobalContext) -> String {
    let mut out = header("HTTP transport.");
    out.push_str(&SERVICE.replace("__CONFIG__", &local_path(&ctx.config_import_path(), ctx)));
    out
}

const APP: &str = r#"use std::ffi::OsString;
use std::process::ExitCode;

use clap::parser::ValueSource;
use clap::{Arg, Command};

use __CMD__;
use __CONFIG__::{self, RequestConfig};

/// Root command with the global arguments attached.
pub fn command() -> Command {
    cmd::command().version(env!("CARGO_PKG_VERSION")).arg(
        Arg::new("base-url")
            .long("base-url")
            .global(true)
            .default_value(config::BASE_URL)
            .help("API base URL"),
    )
}

pub fn run() -> ExitCode {
    run_from(std::env::args_os())
}

pub fn run_from<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().get_matches_from(args);

    let base_url = matches
        .get_one::<String>("base-url")
        .map(String::as_str)
        .unwrap_or(config::BASE_URL);
    let mut request = RequestConfig::new(base_url);
    let is_default = matches.value_source("base-url") != Some(ValueSource::CommandLine);
    config::apply_environment(&mut request, is_default);

    match cmd::run(&matches, request) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
"#;

pub(super) fn app(ctx: &GlobalContext) -> String {
    let mut out = header("Application entry point.");
    out.push_str(
        &APP.replace("__CMD__", &local_path(&ctx.command_import_path(), ctx))
            .replace("__CONFIG__", &local_path(&ctx.config_import_path(), ctx)),
    );
    out
}

pub(super) fn lib(ctx: &GlobalContext, options: RenderOptions) -> String {
    let mut modules = vec![
        ctx.app_module().to_string(),
        last_component(&ctx.command_dir).to_string(),
        restcmd_core::COMMON_MODULE.to_string(),
        last_component(&ctx.config_dir).to_string(),
        last_component(&ctx.service_dir).to_string(),
    ];
    if options.with_model {
        modules.push(last_component(&ctx.model_dir).to_string());
    }
    modules.sort();

    let mut out = header(&format!("`{}` command-line client.", ctx.root_usage));
    for module in modules {
        out.push_str(&format!("pub mod {module};\n"));
    }
    out
}

pub(super) fn cargo_manifest(ctx: &GlobalContext) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {GENERATED_NOTICE}\n\n"));
    out.push_str("[package]\n");
    out.push_str(&format!("name = {}\n", lit(&ctx.module_name)));
    out.push_str("version = \"0.1.0\"\n");
    out.push_str("edition = \"2021\"\n");
    out.push_str("publish = false\n\n");
    out.push_str("[[bin]]\n");
    out.push_str(&format!("name = {}\n", lit(&ctx.root_usage)));
    out.push_str("path = \"src/main.rs\"\n\n");
    out.push_str("[dependencies]\n");
    out.push_str("clap = { version = \"4.5\", features = [\"string\"] }\n");
    out.push_str("reqwest = { version = \"0.12\", default-features = false, features = [\"blocking\", \"json\", \"rustls-tls\"] }\n");
    out.push_str("serde = { version = \"1.0\", features = [\"derive\"] }\n");
    out.push_str("serde_json = \"1.0\"\n\n");
    out.push_str("[workspace]\n");
    out
}

pub(super) fn main(ctx: &GlobalContext) -> String {
    let mut out = header("Binary entry point.");
    out.push_str("use std::process::ExitCode;\n\n");
    out.push_str("fn main() -> ExitCode {\n");
    out.push_str(&format!("    {}::run()\n", ctx.app_import_path()));
    out.push_str("}\n");
    out
}

fn last_component(dir: &str) -> &str {
    dir.rsplit('/').next().unwrap_or(dir)
}
