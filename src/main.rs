mod cli;
mod config;
mod error;
mod logging;
mod migrate;
mod model;
mod providers;
mod report;
mod util;

use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match cli::parse_args(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}\n");
            cli::print_help();
            std::process::exit(2);
        }
    };

    match command {
        cli::Command::Help => {
            cli::print_help();
            Ok(())
        }
        cli::Command::Migrate { project, dry_run } => {
            logging::init("migration")?;
            info!(%project, dry_run, "Starting migration");
            let config = config::load_config()?;
            migrate::run_migration(&config, &project, dry_run).await
        }
        cli::Command::Clean { project } => {
            logging::init("clean_tree")?;
            info!(%project, "Starting tree clean");
            let config = config::load_config()?;
            migrate::run_clean(&config, &project).await
        }
    }
}
