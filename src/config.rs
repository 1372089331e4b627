//! Service configuration for the recommender binary.
//!
//! Defaults, overridden by an optional `recommender.toml` file and
//! `RECOMMENDER_*` environment variables (`__` as section separator).

use markov_recommender::RecommenderConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: RecommenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8084,
        }
    }
}

impl ServiceConfig {
    pub fn load() -> anyhow::Result<Self> {
        let defaults = config::Config::try_from(&ServiceConfig::default())?;
        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("recommender").required(false))
            .add_source(config::Environment::with_prefix("RECOMMENDER").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.port, 8084);
        assert!(config.engine.validate().is_ok());
    }
}
