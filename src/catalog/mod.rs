//! Product catalog
//!
//! Loaded once from a CSV file at startup, read-only afterwards.
//! Search ranks entries with [`scorer::score`] and keeps the best two.

use crate::error::OrchestrationError;
use crate::models::CatalogEntry;
use crate::Result;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

pub mod scorer;

pub use scorer::NormalizedQuery;

/// Maximum number of entries a search returns
pub const MAX_RESULTS: usize = 2;

/// In-memory product index
#[derive(Debug, Default)]
pub struct ProductIndex {
    entries: Vec<CatalogEntry>,
}

impl ProductIndex {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load the catalog from a CSV file. A missing file yields an empty index.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            warn!(
                path = %path.display(),
                "Catalog file not found, product search will return no results"
            );
            return Ok(Self::default());
        }

        let file = std::fs::File::open(path)?;
        let index = Self::from_reader(file)?;

        info!(
            path = %path.display(),
            count = index.len(),
            "Loaded product catalog"
        );

        Ok(index)
    }

    /// Parse catalog rows from any CSV source with a header line.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let mut entries = Vec::new();
        for (line, row) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            let row = row.map_err(|e| {
                warn!(row = line + 1, error = %e, "Malformed catalog row");
                OrchestrationError::from(e)
            })?;
            entries.push(row.into_entry());
        }

        Ok(Self::new(entries))
    }

    /// Up to [`MAX_RESULTS`] entries ranked by relevance. Entries with equal
    /// scores keep their catalog order.
    pub fn search(&self, query: &str) -> Vec<CatalogEntry> {
        let query = NormalizedQuery::new(query);

        if query.is_empty() || self.entries.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(&CatalogEntry, u32)> = self
            .entries
            .iter()
            .map(|entry| (entry, scorer::score(entry, &query)))
            .filter(|(_, score)| *score > 0)
            .collect();

        // stable: ties stay in load order
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        debug!(
            query = %query.text,
            matches = scored.len(),
            "Product search completed"
        );

        scored
            .into_iter()
            .take(MAX_RESULTS)
            .map(|(entry, _)| entry.clone())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Raw CSV row. Accepts both the current column names and the legacy
/// export names (`displayTitle`, `embeddingText`, `productType`).
#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(default, alias = "displayTitle")]
    title: String,
    #[serde(default, rename = "searchText", alias = "embeddingText")]
    search_text: String,
    #[serde(default)]
    url: String,
    #[serde(default, rename = "imageUrl")]
    image_url: String,
    #[serde(default, alias = "productType")]
    category: String,
    #[serde(default)]
    discount: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    variants: String,
}

impl CatalogRow {
    fn into_entry(self) -> CatalogEntry {
        CatalogEntry {
            discount: parse_discount(&self.discount),
            title: self.title,
            search_text: self.search_text,
            url: self.url,
            image_url: self.image_url,
            category: self.category,
            price: self.price,
            variants: self.variants,
        }
    }
}

/// Non-numeric and negative discounts become 0, fractions are truncated.
fn parse_discount(raw: &str) -> u32 {
    let raw = raw.trim();
    raw.parse::<u32>().unwrap_or_else(|_| {
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .map(|value| value.trunc() as u32)
            .unwrap_or(0)
    })
}
