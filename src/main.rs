use playlist_export::cli::{Cli, Commands};
use playlist_export::config::{load_config, LoggingConfig};
use playlist_export::logging::init_logging;
use clap::Parser;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    // This is optional - if .env doesn't exist, it's silently ignored
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let cli = Cli::parse();

    // File logging and the default level come from the config file when it loads;
    // commands report configuration errors themselves
    let (config_level, logging_config) = match load_config(&cli.config) {
        Ok(config) => (config.application.log_level, config.logging),
        Err(_) => ("info".to_string(), LoggingConfig::default()),
    };
    let log_level = cli.log_level.as_deref().unwrap_or(&config_level);
    let logging_guard = match init_logging(log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "playlist-export - Spotify playlist archiver"
    );

    // Create shutdown signal channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler task
    tokio::spawn(async move {
        wait_for_signal().await;
        println!("\n⚠️  Shutdown signal received, stopping...");
        let _ = shutdown_tx.send(true);
    });

    // Execute command and get exit code
    let exit_code = match execute_command(&cli, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5 // Fatal error exit code
        }
    };

    // Flush file logs before exiting
    drop(logging_guard);
    process::exit(exit_code);
}

/// Resolve on SIGINT, or SIGTERM where available
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                    }
                }
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create SIGTERM handler, listening for Ctrl+C only");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown..."),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Export(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::Delete(args) => args.execute(&cli.config).await,
        Commands::Download(args) => args.execute(&cli.config).await,
        Commands::Finalize(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
    }
}
