//! services/desk/src/bin/desk.rs

use desk_lib::{
    config::Config,
    console::{spawn_change_logger, Console},
    error::DeskError,
    open_store,
};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), DeskError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Opening the study desk...");

    // --- 2. Load the Store ---
    let store = Arc::new(open_store(&config).await?);

    // --- 3. Wire Up Shutdown & Change Notifications ---
    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted, shutting down");
                ctrl_c.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });
    let logger = spawn_change_logger(&store, shutdown.clone());

    // --- 4. Run the Console ---
    println!("Study Desk. Type 'help' for commands.");
    let mut console = Console::new(store, std::io::stdout(), shutdown.clone());
    let result = console.run(BufReader::new(tokio::io::stdin())).await;

    shutdown.cancel();
    logger
        .await
        .map_err(|e| DeskError::Internal(format!("change logger ended abnormally: {}", e)))?;
    result
}
