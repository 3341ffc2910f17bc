//! Environment-driven configuration
//!
//! Values come from the process environment, with `.env` loaded first when present.

use crate::error::OrchestrationError;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub exchange_rates_api_key: String,
    pub exchange_rates_base_url: String,
    pub catalog_path: PathBuf,
    pub port: u16,
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Load `.env`, then read the environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            OrchestrationError::Configuration(
                "OpenAI API key is not configured. Please set OPENAI_API_KEY environment variable."
                    .to_string(),
            )
        })?;

        let exchange_rates_api_key = get("OPEN_EXCHANGE_RATES_API_KEY").unwrap_or_default();
        if exchange_rates_api_key.is_empty() {
            warn!("Open Exchange Rates API key not configured. Currency conversion will be unavailable.");
        }

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_number::<u16>("PORT", &raw)?,
            None => 3000,
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => match parse_number::<u64>("REQUEST_TIMEOUT_SECS", &raw)? {
                0 => {
                    return Err(OrchestrationError::Configuration(
                        "REQUEST_TIMEOUT_SECS must be at least 1".to_string(),
                    ))
                }
                secs => Duration::from_secs(secs),
            },
            None => crate::agent::DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            openai_api_key,
            openai_model: get("OPENAI_MODEL")
                .unwrap_or_else(|| crate::oracle::openai::DEFAULT_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| crate::oracle::openai::DEFAULT_BASE_URL.to_string()),
            exchange_rates_api_key,
            exchange_rates_base_url: get("OPEN_EXCHANGE_RATES_BASE_URL")
                .unwrap_or_else(|| crate::currency::provider::DEFAULT_BASE_URL.to_string()),
            catalog_path: get("CSV_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/products_list.csv")),
            port,
            request_timeout,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        OrchestrationError::Configuration(format!("{} must be a number, got '{}'", key, raw))
    })
}
