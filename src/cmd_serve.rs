//! `webpilot serve`: the API server with the agent's scheduler running.

use std::sync::Arc;

use tracing::{error, info};

use webpilot_agent::BrowserAgent;
use webpilot_api::{ApiServer, AppState};
use webpilot_config::Config;

pub(crate) async fn serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    info!("Starting webpilot v{}", env!("CARGO_PKG_VERSION"));
    let agent = Arc::new(BrowserAgent::new(config.clone()).await?);
    info!("Agent {} ready", agent.agent_id());
    agent.start();

    let state = Arc::new(AppState::new(config, agent)?);
    let server = ApiServer::new(state);
    info!("Serving on http://{}", server.addr());

    server.run(shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
    }
}
