//! cavemon CLI entry point.

use cavemon::cli::commands;
use cavemon::cli::{Cli, Commands, OutputFormat};
use cavemon::error::Error;
use clap::Parser;
use std::process::ExitCode;

/// Rewrite named flags to positional args.
///
/// Scripts tend to write `--id 4` where the command takes the id
/// positionally. Both forms are accepted.
fn preprocess_args(args: impl Iterator<Item = String>) -> Vec<String> {
    // Only flags that shadow positional args; named flags already work via clap.
    const POSITIONAL_ALIASES: &[&str] = &[
        "--id",  // update, delete, show, qr, export record
        "--key", // prefs get/set/unset
    ];

    let mut result = Vec::new();
    let mut iter = args.peekable();

    while let Some(arg) = iter.next() {
        if POSITIONAL_ALIASES.contains(&arg.as_str()) {
            if let Some(value) = iter.next() {
                result.push(value);
            }
        } else if let Some(flag) = POSITIONAL_ALIASES
            .iter()
            .find(|f| arg.starts_with(&format!("{f}=")))
        {
            result.push(arg[flag.len() + 1..].to_string());
        } else {
            result.push(arg);
        }
    }

    result
}

fn main() -> ExitCode {
    let args = preprocess_args(std::env::args());
    let cli = Cli::parse_from(args);

    if cli.silent {
        cavemon::SILENT.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose, cli.quiet);

    let json = cli.json || cli.format == OutputFormat::Json;

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // RUST_LOG wins over the verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info,reqwest=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let db = cli.db.as_ref();
    let actor = cli.actor.as_deref();

    match &cli.command {
        Commands::Init { force } => commands::init::execute(db, *force, json),
        Commands::Version => commands::version::execute(json),

        // Records
        Commands::Add(args) => commands::record::execute_add(args, db, actor, json),
        Commands::Update(args) => commands::record::execute_update(args, db, actor, json),
        Commands::Delete { id } => commands::record::execute_delete(*id, db, actor, json),
        Commands::Show { id, history } => commands::record::execute_show(*id, *history, db, json),
        Commands::List { unsynced } => {
            commands::record::execute_list(*unsynced, &cli.format, db, json)
        }

        // Export
        Commands::Export { command } => commands::export::execute(command, db, json),
        Commands::Qr { id, out } => commands::export::execute_qr(*id, out.as_deref(), db, json),

        // Sync
        Commands::Sync { offline } => commands::sync::execute(*offline, db, actor, json),
        Commands::Status => commands::status::execute(db, json),

        Commands::Prefs { command } => commands::prefs::execute(command, json),
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
