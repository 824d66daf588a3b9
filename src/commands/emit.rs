use anyhow::Result;
use colored::Colorize;
use perflog_gateway::emitter::{self, Outcome};
use std::time::Duration;
use tracing::info;

/// Execute the emit command
///
/// Sends `count` sample logs to `url` and prints each response
pub async fn execute(url: String, count: usize, timeout_ms: u64) -> Result<()> {
    let client = reqwest::Client::new();
    info!(%url, count, "Emitting sample logs");

    let report = emitter::emit(
        &client,
        &url,
        count,
        Duration::from_millis(timeout_ms),
        |i, outcome| match outcome {
            Outcome::Status(status) if *status == 201 => {
                println!("{} {}/{}", status.to_string().green(), i, count)
            }
            Outcome::Status(status) => println!("{} {}/{}", status.to_string().red(), i, count),
            Outcome::TimedOut => println!("{}", format!("Remote server timed-out on {}", url).yellow()),
            Outcome::ConnectionRefused => println!("{}", format!("Connection refused on {}", url).red()),
            Outcome::Failed(e) => println!("{}", format!("Request failed: {}", e).red()),
        },
    )
    .await;

    println!();
    println!(
        "{} accepted, {} rejected, {} timed out, {} refused, {} failed",
        report.accepted, report.rejected, report.timed_out, report.refused, report.failed
    );
    Ok(())
}
