//! Shopping Assistant
//!
//! Answers natural-language shopping enquiries. For each query an external
//! function-calling model decides whether to:
//! - Answer directly
//! - Search the product catalog
//! - Convert an amount between currencies
//!
//! and then writes the final reply from the tool result.
//!
//! LOOP:
//! QUERY → DECIDE → (SEARCH | CONVERT | none) → SYNTHESIZE → ANSWER

pub mod agent;
pub mod api;
pub mod catalog;
pub mod config;
pub mod currency;
pub mod error;
pub mod models;
pub mod oracle;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::Orchestrator;
pub use error::OrchestrationError;
