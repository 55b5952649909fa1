use std::sync::Arc;

use invoice_engine::api::{create_router, AppState};
use invoice_engine::config::ConfigLoader;
use invoice_engine::invoicing::InvoiceEngine;
use invoice_engine::outbound::{ChannelPdfQueue, OutboxNotifier};
use invoice_engine::store::MemoryStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG_DIR: &str = "./config/default";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir =
        std::env::var("INVOICE_ENGINE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let loader = ConfigLoader::load(&config_dir)?;
    let settings = loader.settings().clone();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = Arc::new(MemoryStore::from_config(loader.config()));
    let (notifier, mut outbox) = OutboxNotifier::channel();
    let (pdf_queue, mut pdf_jobs) = ChannelPdfQueue::channel();

    // Delivery and rendering live outside this service; the workers only log
    tokio::spawn(async move {
        while let Some(notification) = outbox.recv().await {
            info!(
                invoice_id = %notification.invoice_id,
                kind = ?notification.kind,
                recipient = %notification.recipient.id,
                "Notification ready for delivery"
            );
        }
    });
    tokio::spawn(async move {
        while let Some(job) = pdf_jobs.recv().await {
            info!(
                job_id = %job.job_id,
                invoice_id = %job.invoice_id,
                include_detailed = job.include_detailed,
                "PDF job ready for rendering"
            );
        }
    });

    let engine = InvoiceEngine::new(
        store.clone(),
        store,
        Arc::new(notifier),
        Arc::new(pdf_queue),
        &settings,
    );
    let router = create_router(AppState::new(Arc::new(engine)));

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!(
        address = %settings.bind_address,
        config_dir = %config_dir,
        "Invoice engine listening"
    );
    axum::serve(listener, router).await?;

    Ok(())
}
