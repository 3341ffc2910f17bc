//! Currency conversion through a pivot currency
//!
//! Rates come from [`RateCache`]; every conversion goes `from → base → to`.

use crate::error::OrchestrationError;
use crate::Result;
use tracing::debug;

pub mod cache;
pub mod provider;

pub use cache::RateCache;
pub use provider::{OpenExchangeRatesProvider, RateProvider};

pub struct CurrencyConverter {
    rates: RateCache,
}

impl CurrencyConverter {
    pub fn new(rates: RateCache) -> Self {
        Self { rates }
    }

    /// Convert `amount` from one currency code to another, rounded to cents.
    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(OrchestrationError::InvalidAmount(amount));
        }

        let from = normalize_code(from)?;
        let to = normalize_code(to)?;

        if from == to {
            return Ok(amount);
        }

        let snapshot = self.rates.get_rates().await?;

        let from_rate = snapshot
            .rate(&from)
            .ok_or_else(|| OrchestrationError::UnknownCurrency(from.clone()))?;
        let to_rate = snapshot
            .rate(&to)
            .ok_or_else(|| OrchestrationError::UnknownCurrency(to.clone()))?;

        let amount_in_base = if from == snapshot.base {
            amount
        } else {
            amount / from_rate
        };
        let converted = if to == snapshot.base {
            amount_in_base
        } else {
            amount_in_base * to_rate
        };

        let result = round_cents(converted);
        debug!(%from, %to, amount, result, "Currency converted");

        Ok(result)
    }
}

/// Currency codes are compared uppercase.
pub fn normalize_code(code: &str) -> Result<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(OrchestrationError::Validation(
            "Currency code must not be empty".to_string(),
        ));
    }
    Ok(code.to_uppercase())
}

/// Two decimal places, ties away from zero.
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{usd_snapshot, ScriptedRateProvider};
    use std::sync::Arc;
    use tokio_test::assert_err;

    fn converter(provider: Arc<ScriptedRateProvider>) -> CurrencyConverter {
        CurrencyConverter::new(RateCache::new(provider))
    }

    fn eur_cad_provider() -> Arc<ScriptedRateProvider> {
        Arc::new(ScriptedRateProvider::always(usd_snapshot(&[
            ("USD", 1.0),
            ("EUR", 0.90),
            ("CAD", 1.37),
        ])))
    }

    #[tokio::test]
    async fn test_eur_to_usd() {
        let converter = converter(eur_cad_provider());

        assert_eq!(converter.convert(100.0, "EUR", "USD").await.unwrap(), 111.11);
    }

    #[tokio::test]
    async fn test_cross_rate_pivots_through_base() {
        let converter = converter(eur_cad_provider());

        // 100 EUR -> 111.111 USD -> 152.22 CAD
        assert_eq!(converter.convert(100.0, "eur", "cad").await.unwrap(), 152.22);
        assert_eq!(converter.convert(50.0, "USD", "EUR").await.unwrap(), 45.0);
    }

    #[tokio::test]
    async fn test_same_currency_skips_rate_lookup() {
        let provider = eur_cad_provider();
        let converter = converter(provider.clone());

        assert_eq!(converter.convert(42.5, "gbp", " GBP ").await.unwrap(), 42.5);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_round_trip_within_a_cent() {
        let converter = converter(eur_cad_provider());

        for amount in [0.01, 1.0, 19.99, 100.0, 2500.5] {
            let there = converter.convert(amount, "EUR", "CAD").await.unwrap();
            let back = converter.convert(there, "CAD", "EUR").await.unwrap();
            assert!((back - amount).abs() <= 0.01, "{amount} came back as {back}");
        }
    }

    #[tokio::test]
    async fn test_negative_amount_rejected_before_rate_lookup() {
        let provider = eur_cad_provider();
        let converter = converter(provider.clone());

        let err = assert_err!(converter.convert(-5.0, "EUR", "USD").await);
        assert!(matches!(err, OrchestrationError::InvalidAmount(_)));

        assert_err!(converter.convert(f64::NAN, "EUR", "USD").await);
        assert_err!(converter.convert(f64::INFINITY, "EUR", "USD").await);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_currency_is_named() {
        let converter = converter(eur_cad_provider());

        let err = assert_err!(converter.convert(10.0, "EUR", "xyz").await);
        assert!(matches!(err, OrchestrationError::UnknownCurrency(code) if code == "XYZ"));

        let err = assert_err!(converter.convert(10.0, "ABC", "USD").await);
        assert!(matches!(err, OrchestrationError::UnknownCurrency(code) if code == "ABC"));
    }

    #[tokio::test]
    async fn test_blank_currency_code_is_validation_error() {
        let converter = converter(eur_cad_provider());

        let err = assert_err!(converter.convert(10.0, "  ", "USD").await);
        assert!(matches!(err, OrchestrationError::Validation(_)));
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(111.111_111), 111.11);
        assert_eq!(round_cents(0.125), 0.13);
        assert_eq!(round_cents(2.0), 2.0);
    }
}
