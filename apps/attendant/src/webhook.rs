//! The webhook request path: resolve, extract, respond, deliver.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use metrics::counter;
use serde_json::{Value, json};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use eva_core::{InboundEnvelope, SpeechTranscriber, extract_text, resolve_envelope};
use eva_delivery::DeliveryService;

use crate::completion::CompletionClient;
use crate::flow::{
    COMPLETION_FALLBACK_TEXT, apply_lead, build_turns, check_coverage, extract_lead,
    record_complete, registration_indicated,
};
use crate::store::{ChatTurn, ClientRecord, SharedClientStore};

/// How many persisted turns accompany each completion request.
const HISTORY_WINDOW: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub delivery: Arc<DeliveryService>,
    pub transcriber: Arc<dyn SpeechTranscriber>,
    pub completion: Arc<dyn CompletionClient>,
    pub store: SharedClientStore,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(receive))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Always answers 200 with a structured status: the gateway retries on
/// non-2xx, and a malformed payload will not get better on retry.
async fn receive(State(state): State<AppState>, Json(payload): Json<Value>) -> Json<Value> {
    counter!("attendant_webhooks_total").increment(1);

    let Some(envelope) = resolve_envelope(&payload) else {
        warn!("unrecognized webhook payload shape");
        counter!("attendant_unrecognized_total").increment(1);
        return Json(json!({"status": "unrecognized_format"}));
    };

    if envelope.from_me {
        return Json(json!({"status": "ignored"}));
    }

    let span = info_span!(
        "inbound",
        request_id = %Uuid::new_v4(),
        sender = %envelope.sender,
    );
    Json(process(state, envelope).instrument(span).await)
}

async fn process(state: AppState, envelope: InboundEnvelope) -> Value {
    let text = extract_text(&envelope, state.transcriber.as_ref()).await;
    info!(chars = text.len(), "message text extracted");

    let reply = respond(&state, &envelope.sender, &text).await;

    let outcome = state.delivery.send_text(&envelope.sender, &reply).await;
    if outcome.is_success() {
        counter!("attendant_delivered_total").increment(1);
        json!({
            "status": "success",
            "response": reply,
            "instance": outcome.instance,
        })
    } else {
        // The generated reply is never lost to a delivery failure; the
        // caller gets it back with the error attached.
        counter!("attendant_delivery_failures_total").increment(1);
        error!(error = ?outcome.message, "reply delivery failed");
        json!({
            "status": "partial_success",
            "response": reply,
            "delivery_error": outcome.message,
        })
    }
}

async fn respond(state: &AppState, sender: &str, text: &str) -> String {
    let mut record = match state.store.get(sender).await {
        Ok(Some(record)) => record,
        Ok(None) => ClientRecord::new(sender),
        Err(err) => {
            error!(error = %err, "client lookup failed");
            ClientRecord::new(sender)
        }
    };

    let lead = extract_lead(text);
    apply_lead(&mut record, &lead);

    let coverage = record.city.clone().map(|city| {
        check_coverage(
            &city,
            record.neighborhood.as_deref(),
            lead.zone.as_deref(),
        )
    });

    let history = state
        .store
        .history(sender, HISTORY_WINDOW)
        .await
        .unwrap_or_default();
    let turns = build_turns(&record, coverage.as_ref(), &history, text);

    let reply = match state.completion.complete(&turns).await {
        Ok(reply) => reply,
        Err(err) => {
            error!(error = %err, "completion failed");
            counter!("attendant_completion_failures_total").increment(1);
            COMPLETION_FALLBACK_TEXT.to_string()
        }
    };

    if registration_indicated(&reply) && record_complete(&record) {
        info!("registration complete, queueing for installation");
        record.status = Some("pendente_instalacao".into());
    }

    if let Err(err) = state.store.append_history(sender, ChatTurn::user(text)).await {
        warn!(error = %err, "failed to persist user turn");
    }
    if let Err(err) = state
        .store
        .append_history(sender, ChatTurn::assistant(reply.clone()))
        .await
    {
        warn!(error = %err, "failed to persist assistant turn");
    }
    if let Err(err) = state.store.upsert(record).await {
        warn!(error = %err, "failed to persist client record");
    }

    reply
}
