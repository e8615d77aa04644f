use crate::domain::Denom;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub exchange_api_url: String,
    pub chain_api_url: String,
    pub price_oracle_url: String,
    pub snapshot_interval: Duration,
    pub snapshot_concurrency: usize,
    pub snapshot_include_prices: bool,
    pub staking: StakingConfig,
}

/// Denom counted toward a guild's staking requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingConfig {
    pub denom: Denom,
    pub decimals: u32,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            denom: Denom::new("inj"),
            decimals: 18,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_path = required(&env_map, "DATABASE_PATH")?;
        let exchange_api_url = required(&env_map, "EXCHANGE_API_URL")?;
        let chain_api_url = required(&env_map, "CHAIN_API_URL")?;

        let price_oracle_url = env_map
            .get("PRICE_ORACLE_URL")
            .cloned()
            .unwrap_or_else(|| "https://api.coingecko.com/api/v3".to_string());

        let interval_secs: u64 = parse_or(&env_map, "SNAPSHOT_INTERVAL_SECS", "3600", "u64")?;
        if interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SNAPSHOT_INTERVAL_SECS".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        let snapshot_concurrency: usize =
            parse_or(&env_map, "SNAPSHOT_CONCURRENCY", "4", "usize")?;
        if snapshot_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "SNAPSHOT_CONCURRENCY".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        let snapshot_include_prices = match env_map
            .get("SNAPSHOT_INCLUDE_PRICES")
            .map(|s| s.as_str())
            .unwrap_or("true")
        {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "SNAPSHOT_INCLUDE_PRICES".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        let staking_denom = env_map
            .get("STAKING_DENOM")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "inj".to_string());
        if staking_denom.is_empty() {
            return Err(ConfigError::InvalidValue(
                "STAKING_DENOM".to_string(),
                "must not be empty".to_string(),
            ));
        }
        let staking_decimals: u32 = parse_or(&env_map, "STAKING_DECIMALS", "18", "u32")?;
        if staking_decimals > 28 {
            return Err(ConfigError::InvalidValue(
                "STAKING_DECIMALS".to_string(),
                "must be at most 28".to_string(),
            ));
        }

        Ok(Config {
            database_path,
            exchange_api_url,
            chain_api_url,
            price_oracle_url,
            snapshot_interval: Duration::from_secs(interval_secs),
            snapshot_concurrency,
            snapshot_include_prices,
            staking: StakingConfig {
                denom: Denom::new(staking_denom),
                decimals: staking_decimals,
            },
        })
    }
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
    type_name: &str,
) -> Result<T, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .parse::<T>()
        .map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("must be a valid {}", type_name))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert(
            "EXCHANGE_API_URL".to_string(),
            "https://indexer.example.com".to_string(),
        );
        map.insert(
            "CHAIN_API_URL".to_string(),
            "https://lcd.example.com".to_string(),
        );
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.price_oracle_url, "https://api.coingecko.com/api/v3");
        assert_eq!(config.snapshot_interval, Duration::from_secs(3600));
        assert_eq!(config.snapshot_concurrency, 4);
        assert!(config.snapshot_include_prices);
        assert_eq!(config.staking, StakingConfig::default());
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_exchange_api_url() {
        let mut env_map = setup_required_env();
        env_map.remove("EXCHANGE_API_URL");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "EXCHANGE_API_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_chain_api_url() {
        let mut env_map = setup_required_env();
        env_map.remove("CHAIN_API_URL");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "CHAIN_API_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("SNAPSHOT_CONCURRENCY".to_string(), "0".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SNAPSHOT_CONCURRENCY"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_interval() {
        let mut env_map = setup_required_env();
        env_map.insert("SNAPSHOT_INTERVAL_SECS".to_string(), "soon".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SNAPSHOT_INTERVAL_SECS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_include_prices() {
        let mut env_map = setup_required_env();
        env_map.insert("SNAPSHOT_INCLUDE_PRICES".to_string(), "maybe".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SNAPSHOT_INCLUDE_PRICES"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_staking_overrides() {
        let mut env_map = setup_required_env();
        env_map.insert("STAKING_DENOM".to_string(), "atom".to_string());
        env_map.insert("STAKING_DECIMALS".to_string(), "6".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.staking.denom, Denom::new("atom"));
        assert_eq!(config.staking.decimals, 6);
    }
}
