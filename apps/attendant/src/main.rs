//! Evolution attendant: receives gateway webhooks, normalizes the message
//! (transcribing voice notes), generates a reply through the completion
//! service, and delivers it back through the instance pool.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use eva_attendant::completion::{CompletionConfig, OpenAiChatClient};
use eva_attendant::store::shared_memory_store;
use eva_attendant::webhook::{AppState, router};
use eva_delivery::{DeliveryConfig, DeliveryService};
use eva_transcribe::{TranscribeConfig, TranscriptionPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // An unusable gateway configuration (no instances) aborts startup;
    // everything after this point degrades per-request instead.
    let delivery = Arc::new(DeliveryService::from_config(DeliveryConfig::from_env()?)?);
    let transcriber = Arc::new(TranscriptionPipeline::new(TranscribeConfig::from_env()));
    let completion = Arc::new(OpenAiChatClient::new(CompletionConfig::from_env()));
    let store = shared_memory_store();

    let state = AppState {
        delivery,
        transcriber,
        completion,
        store,
    };
    let app = router(state);

    let addr: SocketAddr = std::env::var("BIND")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()?;
    tracing::info!("attendant listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
