//! Tracelink CLI - link and analyze requirements traceability.

use clap::Parser;
use tracelink_cli::{commands, Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> tracelink_cli::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (config, source) = Config::load(cli.config.as_deref())?;
    match &source {
        Some(path) => tracing::debug!("Loaded configuration from {}", path.display()),
        None => tracing::debug!("No configuration file found, using defaults"),
    }

    let formatter = Formatter::new(!cli.no_color, cli.quiet);

    match cli.command {
        Command::Decompose(args) => commands::execute_decompose(args, &config, &formatter).await?,
        Command::Link(args) => commands::execute_link(args, &config, &formatter).await?,
        Command::Analyze(args) => commands::execute_analyze(args, &config, &formatter).await?,
        Command::Run(args) => commands::execute_run(args, &config, &formatter).await?,
        Command::Config(args) => commands::execute_config(args, &config, source.as_deref())?,
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only JSON
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
