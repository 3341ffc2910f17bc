//! Upstream exchange-rate providers

use crate::error::OrchestrationError;
use crate::models::ExchangeRateSnapshot;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info};

pub const DEFAULT_BASE_URL: &str = "https://openexchangerates.org/api";

/// Source of fresh exchange-rate snapshots. One call is one upstream attempt.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<ExchangeRateSnapshot>;
}

/// Open Exchange Rates client (`/latest.json`, rates relative to USD)
pub struct OpenExchangeRatesProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenExchangeRatesProvider {
    pub fn new(api_key: String, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| {
                OrchestrationError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RateProvider for OpenExchangeRatesProvider {
    async fn fetch_latest(&self) -> Result<ExchangeRateSnapshot> {
        if self.api_key.is_empty() {
            return Err(OrchestrationError::Configuration(
                "Open Exchange Rates API key is not configured".to_string(),
            ));
        }

        info!("Fetching latest exchange rates");

        let response = self
            .client
            .get(format!("{}/latest.json", self.base_url))
            .query(&[("app_id", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!("Exchange rate request failed: {}", e);
                OrchestrationError::RateFetch(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestrationError::RateFetch(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let latest: LatestRates = response
            .json()
            .await
            .map_err(|e| OrchestrationError::RateFetch(format!("invalid response: {}", e)))?;

        Ok(latest.into_snapshot())
    }
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    base: String,
    rates: HashMap<String, f64>,
    timestamp: i64,
}

impl LatestRates {
    fn into_snapshot(self) -> ExchangeRateSnapshot {
        ExchangeRateSnapshot {
            base: self.base.to_uppercase(),
            rates: self
                .rates
                .into_iter()
                .map(|(code, rate)| (code.to_uppercase(), rate))
                .collect(),
            fetched_at: DateTime::<Utc>::from_timestamp(self.timestamp, 0).unwrap_or_else(Utc::now),
        }
    }
}
