mod doc;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use restcmd_build::{BuildConfig, BuildConfigFile, Builder};
use restcmd_codegen::{
    DEFAULT_ROOT_USAGE, Generator, GeneratorConfig, OutputFormat, format_tree, load_document,
};
use restcmd_compiler::CompilerKind;
use restcmd_core::{CommandTreeBuilder, GlobalContext};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "restcmd", version)]
#[command(about = "Generate Rust command-line clients from OpenAPI documents")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a client crate, optionally compiling and installing it.
    Generate(GenerateArgs),
    /// Print the command tree of a document without writing files.
    Tree(TreeArgs),
    /// Write Markdown reference pages for restcmd's own commands.
    Doc(DocArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// OpenAPI document (.json, .yaml or .yml).
    #[arg(short, long)]
    input: PathBuf,
    /// Package name of the generated crate.
    #[arg(short, long)]
    module: Option<String>,
    /// Output directory [default: out].
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Base URL of the API; defaults to the first server in the document.
    #[arg(long)]
    server_url: Option<String>,
    /// Program name; defaults to the document title.
    #[arg(short, long)]
    name: Option<String>,
    /// Also generate serde data models from the document schemas.
    #[arg(long)]
    with_model: bool,
    /// Compile the generated crate.
    #[arg(long)]
    compile: bool,
    /// Compile and install the binary.
    #[arg(long)]
    install: bool,
    /// Compile with the host cargo.
    #[arg(long, conflicts_with = "compile_with_docker")]
    compile_with_cargo: bool,
    /// Compile inside a Rust container via docker.
    #[arg(long)]
    compile_with_docker: bool,
    /// Target operating system [default: host].
    #[arg(long)]
    target_os: Option<String>,
    /// Target architecture [default: host].
    #[arg(long)]
    target_arch: Option<String>,
    /// Install directory [default: $CARGO_HOME/bin].
    #[arg(long)]
    install_dir: Option<PathBuf>,
    /// Seconds each compiler process may run; unlimited when unset.
    #[arg(long, value_name = "SECS")]
    compile_timeout: Option<u64>,
    /// Container image for --compile-with-docker.
    #[arg(long)]
    image: Option<String>,
    /// YAML file with default settings; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct TreeArgs {
    /// OpenAPI document (.json, .yaml or .yml).
    #[arg(short, long)]
    input: PathBuf,
    /// Program name; defaults to the document title.
    #[arg(short, long)]
    name: Option<String>,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct DocArgs {
    /// Directory for the pages; replaced if it exists.
    #[arg(short, long, default_value = "doc")]
    dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Tree(args) => run_tree(args),
        Command::Doc(args) => run_doc(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: GenerateArgs) -> Result<BuildConfig, String> {
    let mut config = BuildConfig::new(&args.input, "");

    if let Some(path) = &args.config {
        let file = BuildConfigFile::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?;
        debug!(path = %path.display(), "loaded config file");
        file.apply(&mut config);
    }

    if let Some(module) = args.module {
        config.module_name = module;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if args.server_url.is_some() {
        config.server_url = args.server_url;
    }
    if args.name.is_some() {
        config.command_name = args.name;
    }
    config.with_model |= args.with_model;
    config.compile |= args.compile;
    config.install |= args.install;
    if args.compile_with_cargo {
        config.backend = Some(CompilerKind::Native);
    }
    if args.compile_with_docker {
        config.backend = Some(CompilerKind::Container);
    }
    if let Some(os) = args.target_os {
        config.target_os = os;
    }
    if let Some(arch) = args.target_arch {
        config.target_arch = arch;
    }
    if args.install_dir.is_some() {
        config.install_dir = args.install_dir;
    }
    if let Some(secs) = args.compile_timeout {
        config.compile_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(image) = args.image {
        config.container_image = image;
    }

    Ok(config)
}

fn run_generate(args: GenerateArgs) -> Result<(), String> {
    let config = build_config(args)?;
    let mut builder = Builder::new(config);
    let report = builder.run().map_err(|err| err.to_string())?;

    println!(
        "Generated {} ({} files) in {}",
        report.root_usage,
        report.files.len(),
        report.output_dir.display()
    );
    if let Some(binary) = &report.binary {
        println!("Built {}", binary.display());
    }
    if let Some(installed) = &report.installed {
        println!("Installed {}", installed.display());
    }
    Ok(())
}

fn run_tree(args: TreeArgs) -> Result<(), String> {
    let doc = load_document(&args.input).map_err(|err| err.to_string())?;

    let mut generator_config = GeneratorConfig::new(".", DEFAULT_ROOT_USAGE);
    generator_config.command_name = args.name;
    let root_usage = Generator::new(generator_config).effective_root_usage(&doc);
    let base_url = doc.first_server_url().unwrap_or_default().to_string();
    let context = GlobalContext::new(&root_usage, &root_usage, &base_url);
    let tree = CommandTreeBuilder::from_document(&doc).build(context);

    let rendered = format_tree(&tree, args.format)?;
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn run_doc(args: DocArgs) -> Result<(), String> {
    let pages = doc::write_tree(&Cli::command(), &args.dir).map_err(|err| {
        format!("failed to write documentation to '{}': {err}", args.dir.display())
    })?;
    println!("Documented {} commands in {}", pages.len(), args.dir.display());
    Ok(())
}
