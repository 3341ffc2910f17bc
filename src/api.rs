//! REST API Server for the Shopping Assistant
//!
//! Exposes the orchestrator via HTTP endpoints

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::agent::Orchestrator;
use crate::error::OrchestrationError;

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "catalog_size": state.orchestrator.catalog().len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let request_id = Uuid::new_v4();

    if req.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "validation failed: query should not be empty".into(),
            )),
        );
    }

    info!(%request_id, query = %req.query, "Received chat request");

    match state.orchestrator.process_query(&req.query).await {
        Ok(response) => (
            StatusCode::OK,
            Json(ApiResponse::success(ChatResponse { response })),
        ),
        Err(e) => {
            let status = e.status_code();
            info!(%request_id, %status, "Chat request failed");
            (status, Json(ApiResponse::error(public_message(&e))))
        }
    }
}

/// User-visible text for a failed query. Internal failures are not echoed.
fn public_message(err: &OrchestrationError) -> String {
    match err.root_cause() {
        OrchestrationError::Configuration(_) => {
            "Service configuration error. Please check API keys.".to_string()
        }
        OrchestrationError::Timeout(_) => "The request took too long. Please try again.".to_string(),
        OrchestrationError::Validation(_)
        | OrchestrationError::InvalidAmount(_)
        | OrchestrationError::UnknownCurrency(_) => err.to_string(),
        _ => "An error occurred while processing your request.".to_string(),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<Orchestrator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{CurrencyConverter, RateCache};
    use crate::models::ToolInvocation;
    use crate::oracle::OracleReply;
    use crate::testing::{sample_catalog, usd_snapshot, ScriptedOracle, ScriptedRateProvider};
    use crate::tools::create_default_registry;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn router(oracle: ScriptedOracle) -> Router {
        let rates = Arc::new(ScriptedRateProvider::always(usd_snapshot(&[("EUR", 0.9)])));
        let orchestrator = Orchestrator::new(
            Arc::new(oracle),
            Arc::new(sample_catalog()),
            Arc::new(CurrencyConverter::new(RateCache::new(rates))),
            create_default_registry(),
        );
        create_router(Arc::new(orchestrator))
    }

    async fn post_chat(router: Router, body: &str) -> (StatusCode, ApiResponse) {
        let request = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_chat_returns_answer() {
        let router = router(ScriptedOracle::new(OracleReply::text("Hi there!"), None));

        let (status, body) = post_chat(router, r#"{"query":"hello"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        assert_eq!(body.data.unwrap()["response"], "Hi there!");
    }

    #[tokio::test]
    async fn test_blank_query_is_bad_request() {
        let oracle = ScriptedOracle::new(OracleReply::text("unused"), None);
        let router = router(oracle);

        let (status, body) = post_chat(router, r#"{"query":"   "}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert!(body.error.unwrap().contains("validation"));
    }

    #[tokio::test]
    async fn test_invalid_amount_maps_to_bad_request() {
        let oracle = ScriptedOracle::new(
            OracleReply::tool_call(ToolInvocation {
                name: "convertCurrencies".to_string(),
                arguments: serde_json::json!({ "amount": -5, "fromCurrency": "EUR", "toCurrency": "USD" }),
                call_id: "call_1".to_string(),
            }),
            None,
        );

        let (status, body) = post_chat(router(oracle), r#"{"query":"convert -5 EUR"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.unwrap().contains("Invalid amount"));
    }

    #[tokio::test]
    async fn test_oracle_failure_maps_to_internal_error() {
        let (status, body) =
            post_chat(router(ScriptedOracle::failing("boom")), r#"{"query":"hello"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body.error.unwrap(),
            "An error occurred while processing your request."
        );
    }

    #[tokio::test]
    async fn test_health_reports_catalog_size() {
        let router = router(ScriptedOracle::new(OracleReply::text("unused"), None));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = router.oneshot(request).await.unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["catalog_size"], 4);
    }
}
