//! Codex Graph CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use codex_engine::EngineConfig;
use codex_runtime::{Repl, Session};
use tracing_subscriber::EnvFilter;

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    scripts: Vec<PathBuf>,
    store: Option<PathBuf>,
    archive: Option<PathBuf>,
    seed: u64,
    batch_mode: bool,
    strict: bool,
    show_help: bool,
    show_version: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("CODEX_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn option_value(args: &[String], i: usize, flag: &str) -> Result<String, String> {
    args.get(i)
        .cloned()
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "--strict" => config.strict = true,
            "--store" => {
                i += 1;
                config.store = Some(PathBuf::from(option_value(&args, i, "--store")?));
            }
            "--archive" => {
                i += 1;
                config.archive = Some(PathBuf::from(option_value(&args, i, "--archive")?));
            }
            "--seed" => {
                i += 1;
                let value = option_value(&args, i, "--seed")?;
                config.seed = value
                    .parse()
                    .map_err(|_| format!("invalid --seed value: {value}"))?;
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            path => config.scripts.push(PathBuf::from(path)),
        }
        i += 1;
    }

    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("codex {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_logging();

    let engine_config = if config.strict {
        EngineConfig::strict()
    } else {
        EngineConfig::default()
    };
    let session = Session::open(config.store, config.archive, config.seed, engine_config)?;
    let mut repl = Repl::new()?.with_session(session);

    for script in &config.scripts {
        for output in repl.eval_file(script)? {
            println!("{output}");
        }
    }

    if config.batch_mode {
        return Ok(());
    }

    if !config.scripts.is_empty() {
        repl = repl.without_banner();
    }

    repl.run()?;
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mCodex Graph\x1b[0m - Relationship consistency for campaign entities

\x1b[1mUSAGE:\x1b[0m
    codex [OPTIONS] [SCRIPTS...]

\x1b[1mARGUMENTS:\x1b[0m
    [SCRIPTS...]    Command files to run before the prompt

\x1b[1mOPTIONS:\x1b[0m
    --store <PATH>      Store file used by save and load
    --archive <PATH>    Archive file used by export and import
    --seed <N>          Seed for new entity identifiers (default 0)
    --strict            Reject links to missing entities instead of dropping them
    -b, --batch         Run scripts and exit without a prompt
    -h, --help          Print help
    -V, --version       Print version

\x1b[1mENVIRONMENT:\x1b[0m
    CODEX_LOG           Log filter (default \"warn\"), e.g. CODEX_LOG=codex_engine=debug

\x1b[1mEXAMPLES:\x1b[0m
    codex --store vale.codex
    codex --batch setup.txt --store vale.codex"
    );
}
