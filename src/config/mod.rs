pub mod toml_config;

pub use self::toml_config::BackendConfig;

use crate::utils::error::{PoolError, Result};
use crate::utils::validation::{validate_url, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "polla-pool")]
#[command(about = "Lottery pool manager: tickets, winning numbers and prize distribution")]
pub struct CliConfig {
    /// Game to operate on: polla (6 numbers) or micro (3 numbers)
    #[arg(long, default_value = "polla")]
    pub game: String,

    /// Backend base URL (overrides the config file)
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Backend API key (overrides the config file)
    #[arg(long)]
    pub api_key: Option<String>,

    /// TOML file with backend settings
    #[arg(long, default_value = "polla-pool.toml")]
    pub config_file: String,

    /// Run against an in-memory store instead of the backend
    #[arg(long)]
    pub offline: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON instead of compact lines")]
    pub log_json: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        self.game.parse::<crate::domain::model::GameMode>()?;
        if let Some(url) = &self.backend_url {
            validate_url("backend_url", url)?;
        }
        if !self.offline && self.backend_url.is_some() && self.api_key.is_none() {
            return Err(PoolError::Config {
                message: "--backend-url requires --api-key".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> CliConfig {
        CliConfig {
            game: "polla".to_string(),
            backend_url: None,
            api_key: None,
            config_file: "polla-pool.toml".to_string(),
            offline: true,
            verbose: false,
            log_json: false,
        }
    }

    #[test]
    fn test_valid_offline_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_unknown_game_rejected() {
        let mut config = base_config();
        config.game = "bingo".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_url_requires_api_key() {
        let mut config = base_config();
        config.offline = false;
        config.backend_url = Some("https://example.supabase.co".to_string());
        assert!(config.validate().is_err());

        config.api_key = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }
}
