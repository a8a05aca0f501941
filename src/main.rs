use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use pocketftpd::config::log_config;
use pocketftpd::core_cli::Cli;
use pocketftpd::core_log::logger::{init_logger, log_message};
use pocketftpd::{status_channel, Config, FtpServer};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();
    init_logger(args.verbose);

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    args.apply(&mut config);
    log_config(&config);

    let (status, mut status_rx) = status_channel();
    let printer = tokio::spawn(async move {
        while let Some(message) = status_rx.recv().await {
            log_message(&message);
        }
    });

    let server = FtpServer::new(config, status);
    server
        .start()
        .await
        .context("Failed to start FTP server")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for the shutdown signal")?;
    info!("Shutdown requested");
    server.stop().await;

    // Sessions still winding down keep their own sink clones.
    drop(server);
    let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;
    Ok(())
}
