use shopping_assistant::{
    agent::Orchestrator,
    catalog::ProductIndex,
    config::AppConfig,
    currency::{CurrencyConverter, OpenExchangeRatesProvider, RateCache},
    oracle::OpenAiOracle,
    tools::create_default_registry,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// One-shot mode: `assistant "I am looking for a phone"`
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if query.trim().is_empty() {
        eprintln!("usage: assistant <query>");
        std::process::exit(2);
    }

    let config = AppConfig::from_env()?;

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

    let orchestrator = Orchestrator::new(
        Arc::new(oracle),
        Arc::new(catalog),
        Arc::new(CurrencyConverter::new(RateCache::new(Arc::new(rate_provider)))),
        create_default_registry(),
    )
    .with_request_timeout(config.request_timeout);

    info!(query = %query, "Running query");

    match orchestrator.process_query(&query).await {
        Ok(answer) => {
            println!("{}", answer);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
