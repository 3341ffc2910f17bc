//! Error types for the shopping assistant

use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

#[derive(Error, Debug)]
pub enum OrchestrationError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown currency '{0}': not found in exchange rates")]
    UnknownCurrency(String),

    #[error("Invalid amount {0}: amount must be a finite, non-negative number")]
    InvalidAmount(f64),

    #[error("Failed to fetch exchange rates: {0}")]
    RateFetch(String),

    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("No final response from the oracle")]
    EmptyOracleResponse,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to process query: {source}")]
    QueryProcessing {
        #[source]
        source: Box<OrchestrationError>,
    },

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Catalog parse error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrchestrationError {
    /// Wrap an error for the transport boundary. Already-wrapped errors are
    /// returned unchanged.
    pub fn into_query_error(self) -> Self {
        match self {
            wrapped @ OrchestrationError::QueryProcessing { .. } => wrapped,
            other => OrchestrationError::QueryProcessing {
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through `QueryProcessing` wrappers.
    pub fn root_cause(&self) -> &OrchestrationError {
        match self {
            OrchestrationError::QueryProcessing { source } => source.root_cause(),
            other => other,
        }
    }

    /// HTTP status for the transport layer, decided by the root cause.
    pub fn status_code(&self) -> StatusCode {
        match self.root_cause() {
            OrchestrationError::Validation(_)
            | OrchestrationError::InvalidAmount(_)
            | OrchestrationError::UnknownCurrency(_) => StatusCode::BAD_REQUEST,
            OrchestrationError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            OrchestrationError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
