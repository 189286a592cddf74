use financial_data_extractor::{
    cache::{CacheStore, InMemoryCacheBackend},
    client::DynamicClientService,
    config::Settings,
    consent::ConsentService,
    extraction::ExtractionService,
    integration::HttpIntegrator,
    retry::RetryPolicy,
    router::RouterService,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Financial data extractor starting");

    let settings = Settings::from_env()?;

    // Create components
    let integrator = Arc::new(HttpIntegrator::from_settings(&settings)?);
    let router = Arc::new(RouterService::new(
        integrator,
        RetryPolicy::new(settings.retry_attempts, settings.retry_backoff),
    ));
    let cache = Arc::new(CacheStore::new(
        Box::new(InMemoryCacheBackend::new()),
        settings.cache_ttl,
    ));
    let client_service = DynamicClientService::new(router.clone(), &settings.api_base_url);
    let consent_service = Arc::new(ConsentService::new(router.clone(), &settings.api_base_url));
    let extraction_service =
        ExtractionService::new(consent_service, router, cache, &settings.api_base_url);

    let user_document = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "12345678901".to_string());

    info!(user_document, "Running extraction");

    let client = client_service.get_or_create_client(&user_document).await?;
    info!(client = %client.name, "Client obtained");

    let response = extraction_service
        .extract_financial_data(&user_document, &client.id, &client.token)
        .await;

    println!("\n=== EXTRACTION RESULT ===");
    println!("User document: {}", response.user_document);
    println!("Extraction date: {}", response.extraction_date);
    println!("Accounts: {}", response.summary.total_accounts);
    println!("Transactions: {}", response.summary.total_transactions);
    println!(
        "Processing time: {} ms",
        response.summary.processing_time_ms
    );
    if !response.summary.errors.is_empty() {
        println!("Errors:");
        for error in &response.summary.errors {
            println!("  - {}", error);
        }
    }

    Ok(())
}
