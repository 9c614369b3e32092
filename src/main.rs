//! sqlrun - Run a single SQL statement and print its rows as JSON.

use anyhow::{bail, Context};
use sqlrun::cli::Cli;
use sqlrun::config::Config;
use sqlrun::error::ExecutorError;
use sqlrun::logging;
use sqlrun::query::SqlExecutor;
use std::io::Read;
use tracing::{debug, error};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init(cli.log_file.as_deref());

    match run(&cli).await {
        Ok(text) => println!("{text}"),
        Err(e) => {
            match e.downcast_ref::<ExecutorError>() {
                Some(err) => {
                    error!("{}: {}", err.category(), err);
                    eprintln!("{}: {}", err.category(), err);
                }
                None => {
                    error!("{:#}", e);
                    eprintln!("Error: {e:#}");
                }
            }
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<String> {
    let config_path = cli.config_path();
    debug!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let query = read_query(cli)?;
    let options = cli.to_options(query, &config)?;

    let outcome = SqlExecutor::new().run(&options).await?;
    Ok(outcome.text)
}

/// Reads the statement from the positional argument, a file, or stdin.
fn read_query(cli: &Cli) -> anyhow::Result<String> {
    if let Some(query) = &cli.query {
        return Ok(query.clone());
    }

    match cli.file.as_deref() {
        Some("-") => {
            let mut query = String::new();
            std::io::stdin()
                .read_to_string(&mut query)
                .context("Failed to read query from stdin")?;
            Ok(query)
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file '{path}'")),
        None => bail!("No query given. Pass it as an argument or use --file"),
    }
}
