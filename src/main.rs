use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use perflog_gateway::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    match args.get_command() {
        cli::Commands::Start => {
            let cfg = config::load_config(&args.config)?;
            init_tracing(&cfg.server.log_level, &cfg.server.log_format);
            commands::start::execute(cfg).await?;
        }
        cli::Commands::Config { action } => {
            let cfg = config::load_config(&args.config)?;
            init_tracing(&cfg.server.log_level, &cfg.server.log_format);
            match action {
                cli::ConfigCommands::Show => commands::config::show(&cfg)?,
                cli::ConfigCommands::Validate => commands::config::validate(&cfg)?,
            }
        }
        cli::Commands::Emit {
            url,
            count,
            timeout_ms,
        } => {
            init_tracing("info", "text");
            commands::emit::execute(url, count, timeout_ms).await?;
        }
        cli::Commands::Version => {
            println!("perflog gateway v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
