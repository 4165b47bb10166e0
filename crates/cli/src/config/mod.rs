//! Command-line configuration

use std::{fs, path::PathBuf};

use cartsync::config::ClientConfig;
use clap::Parser;

use crate::{commands::Command, config::observability::LoggingConfig, errors::CliError};

pub(crate) mod observability;

/// Headless storefront driver for cart and coupon actions
#[derive(Debug, Parser)]
#[command(name = "cartsync", about = "Drive storefront cart actions from the terminal", long_about = None)]
pub struct CliConfig {
    /// Storefront base URL.
    #[arg(long, env = "CARTSYNC_BASE_URL", default_value = "http://localhost:8000/")]
    pub base_url: String,

    /// YAML client configuration (endpoints, messages, timings, currency).
    #[arg(long, env = "CARTSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Anti-forgery token to seed the session cookie with.
    #[arg(long, env = "CARTSYNC_CSRF_TOKEN")]
    pub csrf_token: Option<String>,

    /// Session cookie value.
    #[arg(long, env = "CARTSYNC_SESSION")]
    pub session: Option<String>,

    /// Answer yes to every confirmation.
    #[arg(short, long)]
    pub yes: bool,

    /// Request timeout in milliseconds, overriding the client configuration.
    #[arg(long, env = "CARTSYNC_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Action to run.
    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Client configuration from the YAML file, or the defaults, with CLI overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn client_config(&self) -> Result<ClientConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => {
                let yaml = fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
                    path: path.clone(),
                    source,
                })?;

                ClientConfig::from_yaml(&yaml)?
            }
            None => ClientConfig::default(),
        };

        if let Some(timeout_ms) = self.timeout_ms {
            config.timings.request_timeout_ms = timeout_ms;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::config::observability::LogFormat;

    use super::*;

    #[test]
    fn parses_global_options_and_subcommand() -> TestResult {
        let config = CliConfig::try_parse_from([
            "cartsync",
            "--base-url",
            "https://shop.test/",
            "--yes",
            "--timeout-ms",
            "2500",
            "--log-format",
            "json",
            "add",
            "42",
            "--type",
            "product",
        ])?;

        assert_eq!(config.base_url, "https://shop.test/");
        assert!(config.yes);
        assert_eq!(config.logging.log_format, LogFormat::Json);
        assert!(matches!(config.command, Command::Add { ref id, .. } if id == "42"));
        assert_eq!(config.client_config()?.timings.request_timeout_ms, 2500);

        Ok(())
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(CliConfig::try_parse_from(["cartsync"]).is_err());
    }

    #[test]
    fn unreadable_config_file_is_reported() -> TestResult {
        let config = CliConfig::try_parse_from([
            "cartsync",
            "--config",
            "/nonexistent/cartsync.yaml",
            "count",
        ])?;

        assert!(matches!(
            config.client_config(),
            Err(CliError::ReadConfig { .. })
        ));

        Ok(())
    }
}
