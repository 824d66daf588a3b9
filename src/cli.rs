use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "perflog", version, about = "Performance log ingestion gateway")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the gateway server (default)
    Start,

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Post random sample logs to a running gateway
    Emit {
        /// Gateway endpoint to post to
        #[arg(short, long, default_value = "http://127.0.0.1:3000")]
        url: String,

        /// Number of logs to send
        #[arg(short = 'n', long, default_value = "1000")]
        count: usize,

        /// Per-request timeout in milliseconds
        #[arg(short, long, default_value = "100")]
        timeout_ms: u64,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display the effective configuration
    Show,

    /// Validate configuration file
    Validate,
}

impl Cli {
    /// Get the command to execute, defaulting to Start if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_start() {
        let cli = Cli::try_parse_from(["perflog"]).unwrap();
        assert!(matches!(cli.get_command(), Commands::Start));
        assert_eq!(cli.config, PathBuf::from("config.toml"));
    }

    #[test]
    fn test_cli_parsing_emit() {
        let cli = Cli::try_parse_from(["perflog", "emit", "-n", "5", "--url", "http://localhost:9000"]).unwrap();

        match cli.get_command() {
            Commands::Emit { url, count, timeout_ms } => {
                assert_eq!(url, "http://localhost:9000");
                assert_eq!(count, 5);
                assert_eq!(timeout_ms, 100);
            }
            _ => panic!("Expected Emit command"),
        }
    }

    #[test]
    fn test_cli_parsing_config_show_with_global_config() {
        let cli = Cli::try_parse_from(["perflog", "config", "show", "--config", "prod.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("prod.toml"));

        match cli.get_command() {
            Commands::Config { action } => {
                assert!(matches!(action, ConfigCommands::Show));
            }
            _ => panic!("Expected Config command"),
        }
    }
}
