// server/src/cli/handlers.rs

use anyhow::{Context, Result};
use carebridge_lib::config::AppConfig;
use carebridge_lib::routes::Route;
use clap::Parser;
use log::{info, warn};

use crate::cli::commands::{CliArgs, Commands, ServeArgs};

pub async fn start_cli() -> Result<()> {
    let args = CliArgs::parse();
    run_command(args.command).await
}

pub async fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Serve(args) => serve(args).await,
        Commands::ShowConfig { config } => {
            let config = AppConfig::load(&config).await?;
            println!("{}", config.to_yaml()?);
            Ok(())
        }
        Commands::Routes => {
            println!("{}", routes_listing());
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = AppConfig::load(&args.config)
        .await
        .context(format!("Failed to load configuration from {}", args.config.display()))?;
    args.apply(&mut config);
    info!(
        "Starting CareBridge on {}:{} with {} storage",
        config.rest.host, config.rest.port, config.storage.storage_engine_type
    );

    rest_api::start_server(&config, shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
    }
}

fn routes_listing() -> String {
    let entry_points = Route::entry_points();
    Route::all()
        .iter()
        .map(|route| {
            let marker = if entry_points.contains(route) { "*" } else { " " };
            format!("{} {}", marker, route)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn listing_marks_entry_points() {
        let listing = routes_listing();
        assert!(listing.contains("* /login"));
        assert!(listing.contains("* /patient/login"));
        assert!(listing.contains("  /chat/{patientId}"));
    }

    #[tokio::test]
    async fn show_config_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carebridge_config.yaml");
        tokio::fs::write(&path, "rest:\n  port: 9100\n").await.unwrap();
        run_command(Commands::ShowConfig { config: path }).await.unwrap();

        let missing = PathBuf::from(dir.path()).join("absent.yaml");
        run_command(Commands::ShowConfig { config: missing }).await.unwrap();
    }
}
