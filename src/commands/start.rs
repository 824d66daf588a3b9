use anyhow::Result;
use colored::Colorize;
use perflog_gateway::{config::Config, server};
use tracing::info;

/// Execute the start command
///
/// Blocks until the server shuts down.
pub async fn execute(cfg: Config) -> Result<()> {
    println!("{}", "Starting perflog gateway...".green());
    info!(
        host = %cfg.server.host,
        port = cfg.server.port,
        "Starting perflog gateway"
    );

    server::start_server(cfg).await
}
