use anyhow::{Context, Result};
use chilito_finder::FinderConfig;
use dotenvy::dotenv;
use std::env;

/// Settings loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub mapbox_token: Option<String>,
    pub site_base: Option<String>,
    pub api_base: Option<String>,
    pub candidate_delay_ms: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            mapbox_token: env::var("MAPBOX_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            site_base: env::var("CHILITO_SITE_BASE").ok(),
            api_base: env::var("CHILITO_API_BASE").ok(),
            candidate_delay_ms: env::var("CHILITO_CANDIDATE_DELAY_MS")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .context("CHILITO_CANDIDATE_DELAY_MS must be a number of milliseconds")?,
        })
    }

    /// Apply environment settings on top of `base`.
    pub fn finder_config(&self, base: FinderConfig) -> FinderConfig {
        let mut config = base;
        if let Some(token) = &self.mapbox_token {
            config = config.with_mapbox_token(token.clone());
        }
        if let Some(site) = &self.site_base {
            config = config.with_site_base(site.clone());
        }
        if let Some(api) = &self.api_base {
            config = config.with_api_base(api.clone());
        }
        if let Some(ms) = self.candidate_delay_ms {
            config = config.with_candidate_delay_ms(ms);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_keeps_defaults() {
        let config = Config::default().finder_config(FinderConfig::default());
        assert_eq!(config.site_base, "https://www.tacobell.com");
        assert!(config.mapbox_token.is_none());
    }

    #[test]
    fn test_overrides_apply() {
        let env = Config {
            mapbox_token: Some("pk.test".to_string()),
            site_base: Some("https://chain.test".to_string()),
            api_base: None,
            candidate_delay_ms: Some(0),
        };
        let config = env.finder_config(FinderConfig::default());

        assert_eq!(config.mapbox_token.as_deref(), Some("pk.test"));
        assert_eq!(config.site_base, "https://chain.test");
        assert_eq!(config.api_base, "https://api.tacobell.com");
        assert_eq!(config.candidate_delay_ms, 0);
    }
}
