use crate::utils::error::{PoolError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Backend connection settings loaded from a TOML file, so the hosted
/// backend's URL and key stay out of shell history.
///
/// ```toml
/// [backend]
/// url = "https://example.supabase.co"
/// api_key = "service-key"
///
/// [defaults]
/// bulk_concurrency = 5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub backend: BackendSection,
    pub defaults: Option<DefaultsSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSection {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsSection {
    pub bulk_concurrency: Option<usize>,
}

impl BackendConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PoolError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config: BackendConfig = toml::from_str(&content).map_err(|e| PoolError::Config {
            message: format!("cannot parse {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn bulk_concurrency(&self) -> Option<usize> {
        self.defaults.as_ref().and_then(|d| d.bulk_concurrency)
    }
}

impl Validate for BackendConfig {
    fn validate(&self) -> Result<()> {
        validate_url("backend.url", &self.backend.url)?;
        validate_non_empty_string("backend.api_key", &self.backend.api_key)?;
        if let Some(limit) = self.bulk_concurrency() {
            crate::utils::validation::validate_positive_number(
                "defaults.bulk_concurrency",
                limit,
                1,
            )?;
        }
        Ok(())
    }
}
