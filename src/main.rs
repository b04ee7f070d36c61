//! testbench-db CLI entry point.

use anyhow::Context;
use clap::Parser;

use testbench_db::cli::{commands, handle_error, Cli, Commands};
use testbench_db::infrastructure::logging::LoggerImpl;
use testbench_db::ConfigLoader;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load_with(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err.context("Failed to load configuration"), cli.json),
    };

    let logger = match LoggerImpl::init(&config.logging).context("Failed to initialize logging") {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, &config, cli.json).await,
        Commands::Verify(args) => commands::verify::execute(args, &config, cli.json).await,
        Commands::Schema => commands::schema::execute(&config, cli.json),
    };

    if let Err(err) = result {
        tracing::error!(error = %format!("{err:#}"), "command failed");
        // Flush file logs before exiting
        drop(logger);
        handle_error(err, cli.json);
    }
}
