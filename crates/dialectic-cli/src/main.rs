use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dialectic_cli::commands;
use dialectic_cli::{CliConfig, OutputFormat};

fn cli() -> Command {
    Command::new("dialectic-paths")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Construct and deconstruct storage paths for dialectic artifacts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .global(true)
                .value_parser(OutputFormat::NAMES.to_vec())
                .help("Output format"),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Pretty-print JSON output"),
        )
        .subcommand(
            Command::new("construct")
                .about("Build a storage path from a PathContext JSON document")
                .arg(
                    Arg::new("context")
                        .long("context")
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the context JSON (stdin when omitted)"),
                ),
        )
        .subcommand(
            Command::new("deconstruct")
                .about("Recover artifact identity from a storage path")
                .arg(Arg::new("dir").long("dir").required(true).help("Storage directory"))
                .arg(Arg::new("file").long("file").required(true).help("File name")),
        )
        .subcommand(
            Command::new("classify")
                .about("Print the debate phase of a file type or document key")
                .arg(Arg::new("file-type").required(true).help("File type tag")),
        )
        .subcommand(
            Command::new("clone-path")
                .about("Rebuild an artifact path under a new session")
                .arg(Arg::new("dir").long("dir").required(true).help("Storage directory"))
                .arg(Arg::new("file").long("file").required(true).help("File name"))
                .arg(
                    Arg::new("session")
                        .long("session")
                        .required(true)
                        .help("Target session id"),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<CliConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::new(),
    };
    if let Some(format) = matches.get_one::<String>("format") {
        config = config.with_format(format.parse()?);
    }
    if matches.get_flag("pretty") {
        config = config.with_pretty(true);
    }
    Ok(config)
}

fn init_tracing(config: &CliConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("--{name} is required"))
}

fn read_context(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading context {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("reading context from stdin")?;
            Ok(raw)
        }
    }
}

fn run(matches: &ArgMatches, config: &CliConfig) -> anyhow::Result<ExitCode> {
    match matches.subcommand() {
        Some(("construct", args)) => {
            let raw = read_context(args.get_one::<PathBuf>("context"))?;
            let path = commands::construct(&raw)?;
            println!("{}", commands::render(&path, config)?);
            Ok(ExitCode::SUCCESS)
        }
        Some(("deconstruct", args)) => {
            let info = commands::deconstruct(required(args, "dir")?, required(args, "file")?);
            println!("{}", commands::render(&info, config)?);
            Ok(if info.is_recognized() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Some(("classify", args)) => {
            let phase = commands::classify(required(args, "file-type")?)?;
            println!("{}", commands::render(&phase, config)?);
            Ok(ExitCode::SUCCESS)
        }
        Some(("clone-path", args)) => {
            let path = commands::clone_path(
                required(args, "dir")?,
                required(args, "file")?,
                required(args, "session")?,
            )?;
            println!("{}", commands::render(&path, config)?);
            Ok(ExitCode::SUCCESS)
        }
        _ => anyhow::bail!("unknown subcommand"),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    match run(&matches, &config) {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
