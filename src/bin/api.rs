use shopping_assistant::{
    agent::Orchestrator,
    api::start_server,
    catalog::ProductIndex,
    config::AppConfig,
    currency::{CurrencyConverter, OpenExchangeRatesProvider, RateCache},
    oracle::OpenAiOracle,
    tools::create_default_registry,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    info!("🚀 Shopping Assistant - API Server");
    info!("📍 Port: {}", config.port);

    // Create components
    let oracle = OpenAiOracle::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        &config.openai_base_url,
    )?;
    let catalog = ProductIndex::load(&config.catalog_path)?;
    let rate_provider = OpenExchangeRatesProvider::new(
        config.exchange_rates_api_key.clone(),
        &config.exchange_rates_base_url,
    )?;
    let converter = CurrencyConverter::new(RateCache::new(Arc::new(rate_provider)));
    let registry = create_default_registry();

    info!("🔧 Tools: {}", registry.list().join(", "));
    info!("📦 Catalog entries: {}", catalog.len());

    let orchestrator = Arc::new(
        Orchestrator::new(
            Arc::new(oracle),
            Arc::new(catalog),
            Arc::new(converter),
            registry,
        )
        .with_request_timeout(config.request_timeout),
    );

    info!("✅ Orchestrator initialized");
    info!("📡 Starting API server...");

    start_server(orchestrator, config.port).await?;

    Ok(())
}
