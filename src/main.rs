//! rowdb CLI: an embedded, file-backed SQL engine.

use clap::Parser as ClapParser;
use rowdb::{Config, Manager};
use std::fs::File;
use std::io::{self, BufReader};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let mut manager = Manager::new(&config.data_dir, config.allow_drop_database());

    if let Some(database) = &config.database {
        let statement_text = format!("USE {};", database);
        match rowdb::Parser::new(&statement_text).parse() {
            Ok(statement) => {
                if let Err(e) = manager.execute(&statement) {
                    error!(database = %database, error = %e, "failed to open initial database");
                    return ExitCode::FAILURE;
                }
            }
            Err(e) => {
                error!(database = %database, error = %e, "invalid --database name");
                return ExitCode::FAILURE;
            }
        }
    }

    let stdout = io::stdout();
    let result = match &config.file {
        Some(path) => match File::open(path) {
            Ok(file) => rowdb::repl::run(&mut manager, BufReader::new(file), stdout.lock()),
            Err(e) => {
                error!(path = %path.display(), error = %e, "could not open script file");
                return ExitCode::FAILURE;
            }
        },
        None => rowdb::repl::run(&mut manager, io::stdin().lock(), stdout.lock()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "REPL loop failed");
            ExitCode::FAILURE
        }
    }
}
