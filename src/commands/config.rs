use anyhow::Result;
use colored::Colorize;
use perflog_gateway::config::{BackendKind, Config};
use tracing::info;

/// Execute the config show command
///
/// Prints the effective configuration (file + environment + defaults) as TOML
pub fn show(cfg: &Config) -> Result<()> {
    println!("{}", "Current Configuration:".green().bold());
    println!();

    let toml_string = toml::to_string_pretty(cfg)?;
    println!("{}", toml_string);

    info!("Configuration displayed successfully");
    Ok(())
}

/// Execute the config validate command
///
/// Loading already validated the configuration; this prints a summary
pub fn validate(cfg: &Config) -> Result<()> {
    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  Listen: {}:{}", cfg.server.host, cfg.server.port);
    println!("  Storage: {}", describe_storage(cfg));
    println!("  Workers: {}", cfg.pipeline.workers);
    println!("  Transform: {:?}", cfg.pipeline.transform);

    info!("Configuration validation successful");
    Ok(())
}

fn describe_storage(cfg: &Config) -> String {
    match cfg.storage.backend {
        BackendKind::Keyed => format!(
            "keyed ({:?}, {})",
            cfg.storage.keyed_driver,
            cfg.storage.directory.display()
        ),
        BackendKind::Ranged => format!(
            "ranged ({:?}, {})",
            cfg.storage.ranged_driver, cfg.storage.database_url
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perflog_gateway::config::RangedDriver;

    #[test]
    fn test_describe_storage() {
        let mut cfg = Config::default();
        assert_eq!(describe_storage(&cfg), "keyed (File, parsed)");

        cfg.storage.backend = BackendKind::Ranged;
        cfg.storage.ranged_driver = RangedDriver::Memory;
        assert_eq!(describe_storage(&cfg), "ranged (Memory, sqlite:./data/logs.db)");
    }

    #[test]
    fn test_show_default_config() {
        assert!(show(&Config::default()).is_ok());
    }
}
