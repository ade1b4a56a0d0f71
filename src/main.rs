//! restraint - block distracting websites for a set time
//!
//! Edits the hosts file to point listed websites at a null address, then
//! removes exactly those lines when the timer runs out.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use restraint::cli::{Cli, Commands};
use restraint::commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity; stdout is kept for command output.
    // RUST_LOG takes precedence when set.
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::Version = cli.command {
        println!("restraint {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = commands::load_config(&cli.config, cli.hosts.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Start { duration, list } => {
            commands::start::run(duration.as_deref(), list.as_deref(), &config).await
        }
        Commands::Stop => commands::stop::run(&config).await,
        Commands::Status { json } => commands::status::run(json, &config).await,
        Commands::Resume => commands::resume::run(&config).await,
        Commands::Compile { list } => commands::compile::run(list.as_deref(), &config).await,
        Commands::List { action } => commands::list::run(action, &config).await,
        Commands::RestoreBackup => commands::restore_backup::run(&config).await,
        Commands::Version => Ok(()),
    }
}
