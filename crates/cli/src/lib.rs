use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use codefacts_parser::{CodebaseParser, ParserSettings};
use report::OutputFormat;
use std::io;
use std::path::PathBuf;

mod report;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "codefacts")]
#[command(about = "Extract entity/relationship facts from Python codebases", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse every eligible file under a directory
    Parse(ParseArgs),

    /// Parse a single file
    File(FileArgs),
}

#[derive(Args)]
struct ParseArgs {
    /// Codebase root directory
    root: PathBuf,

    /// Codebase name (first segment of every qualified name)
    #[arg(long)]
    codebase: String,

    /// Prepended to each file's root-relative path to form its reference
    #[arg(long, default_value = "")]
    reference_prefix: String,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Args)]
struct FileArgs {
    /// Source file (.py, .pyw, .pyi or .ipynb)
    path: PathBuf,

    /// Codebase name (first segment of every qualified name)
    #[arg(long)]
    codebase: String,

    /// Path relative to the codebase root, used for the module name
    /// (defaults to the file name)
    #[arg(long)]
    virtual_path: Option<PathBuf>,

    /// External locator of the file (defaults to the path as given)
    #[arg(long)]
    reference: Option<String>,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Args)]
struct SettingsArgs {
    /// TOML file with parser settings; flags below take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Descend into directories starting with `_`
    #[arg(long)]
    include_private_dirs: bool,

    /// Parse `test_*` files
    #[arg(long)]
    include_test_files: bool,

    /// Include members starting with `_`
    #[arg(long)]
    include_private_members: bool,

    /// Leave out dunder members such as `__init__`
    #[arg(long)]
    exclude_dunder: bool,

    /// Leave the module path out of qualified names
    #[arg(long)]
    no_module_name: bool,
}

impl SettingsArgs {
    fn resolve(&self) -> Result<ParserSettings> {
        let mut settings = match &self.config {
            Some(path) => ParserSettings::load(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => ParserSettings::default(),
        };
        settings.include_private_dirs |= self.include_private_dirs;
        settings.include_test_files |= self.include_test_files;
        settings.include_private_members |= self.include_private_members;
        if self.exclude_dunder {
            settings.include_dunder = false;
        }
        if self.no_module_name {
            settings.include_module_name = false;
        }
        Ok(settings)
    }
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Parse(args) => run_parse(args),
        Commands::File(args) => run_file(args),
    }
}

fn run_parse(args: ParseArgs) -> Result<()> {
    let settings = args.settings.resolve()?;
    let mut parser = CodebaseParser::new(&args.codebase, settings);
    let stats = parser
        .parse_dir(&args.root, &args.reference_prefix)
        .with_context(|| format!("Failed to parse {}", args.root.display()))?;

    let output = report::render(parser.codebase_name(), parser.graph(), Some(stats), args.format)?;
    print_stdout(&output)
}

fn run_file(args: FileArgs) -> Result<()> {
    let settings = args.settings.resolve()?;
    let virtual_path = match args.virtual_path {
        Some(path) => path,
        None => PathBuf::from(
            args.path
                .file_name()
                .with_context(|| format!("{} has no file name", args.path.display()))?,
        ),
    };
    let reference = args
        .reference
        .unwrap_or_else(|| args.path.display().to_string());

    let mut parser = CodebaseParser::new(&args.codebase, settings);
    parser
        .parse_file(&args.path, &virtual_path, &reference)
        .with_context(|| format!("Failed to parse {}", args.path.display()))?;

    let output = report::render(parser.codebase_name(), parser.graph(), None, args.format)?;
    print_stdout(&output)
}
