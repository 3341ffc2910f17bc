//! Core data models for the shopping assistant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::OrchestrationError;

//
// ================= Catalog =================
//

/// One product of the store catalog. Built once at load time and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub title: String,
    /// Free-text description used for matching, distinct from `title`
    pub search_text: String,
    pub url: String,
    pub image_url: String,
    pub category: String,
    /// Passed through verbatim, currency unspecified
    pub price: String,
    pub variants: String,
    pub discount: u32,
}

//
// ================= Exchange Rates =================
//

/// Rates relative to `base`, as returned by one upstream fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangeRateSnapshot {
    pub base: String,
    pub rates: HashMap<String, f64>,
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRateSnapshot {
    /// Rate of `code` against the base currency. The base itself is always 1.
    pub fn rate(&self, code: &str) -> Option<f64> {
        if code == self.base {
            return Some(1.0);
        }
        self.rates
            .get(code)
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }
}

//
// ================= Tool Invocation =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolName {
    #[serde(rename = "searchProducts")]
    SearchProducts,
    #[serde(rename = "convertCurrencies")]
    ConvertCurrencies,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::SearchProducts => "searchProducts",
            ToolName::ConvertCurrencies => "convertCurrencies",
        }
    }
}

impl FromStr for ToolName {
    type Err = OrchestrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "searchProducts" => Ok(ToolName::SearchProducts),
            "convertCurrencies" => Ok(ToolName::ConvertCurrencies),
            other => Err(OrchestrationError::UnknownTool(other.to_string())),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool call requested by the oracle. `name` stays raw until dispatch so
/// that unknown names surface as `UnknownTool` there.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: serde_json::Value,
    pub call_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchProductsArgs {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertCurrenciesArgs {
    pub amount: f64,
    pub from_currency: String,
    pub to_currency: String,
}

/// Decode the arguments of an invocation against the schema of one tool.
pub fn parse_arguments<T>(invocation: &ToolInvocation) -> Result<T, OrchestrationError>
where
    T: serde::de::DeserializeOwned,
{
    let arguments = if invocation.arguments.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        invocation.arguments.clone()
    };

    serde_json::from_value(arguments).map_err(|e| {
        OrchestrationError::Validation(format!(
            "Malformed arguments for {}: {}",
            invocation.name, e
        ))
    })
}

//
// ================= Tool Results =================
//

/// Product fields handed back to the oracle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub title: String,
    pub price: String,
    pub url: String,
    pub image_url: String,
    pub category: String,
    pub variants: String,
}

impl From<&CatalogEntry> for ProductSummary {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            title: entry.title.clone(),
            price: entry.price.clone(),
            url: entry.url.clone(),
            image_url: entry.image_url.clone(),
            category: entry.category.clone(),
            variants: entry.variants.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSearchResult {
    pub products: Vec<ProductSummary>,
    pub count: usize,
}

impl ProductSearchResult {
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let products: Vec<ProductSummary> = entries.iter().map(ProductSummary::from).collect();
        let count = products.len();
        Self { products, count }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyConversionResult {
    pub original_amount: f64,
    pub from_currency: String,
    pub to_currency: String,
    pub converted_amount: f64,
}

/// Payload returned to the oracle after a tool ran. Serialized untagged so the
/// oracle sees the bare result object.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ToolResult {
    ProductSearch(ProductSearchResult),
    CurrencyConversion(CurrencyConversionResult),
}

impl ToolResult {
    pub fn tool(&self) -> ToolName {
        match self {
            ToolResult::ProductSearch(_) => ToolName::SearchProducts,
            ToolResult::CurrencyConversion(_) => ToolName::ConvertCurrencies,
        }
    }
}
