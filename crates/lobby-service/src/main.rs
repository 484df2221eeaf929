//! Lobby Node binary
//!
//! Runs matching cycles over an in-memory pool until the cycle limit or Ctrl-C.

use lobby_service::{MatchmakerService, ServiceConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lobby_node=info,lobby_service=info,lobby_match=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lobby Node");

    let config = ServiceConfig::from_env()?;
    let mut service = MatchmakerService::new(config)?;
    let stats = service.run().await?;

    tracing::info!(stats = %serde_json::to_string(&stats)?, "Lobby node stopped");

    Ok(())
}
