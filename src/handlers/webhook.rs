use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::errors::AppError;
use crate::services::scheduling;
use crate::state::AppState;

// ── Subscription handshake ──

#[derive(Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET /webhook — Meta calls this once when the webhook is registered and
/// expects the challenge echoed back verbatim.
pub async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let token_matches = params
        .verify_token
        .as_deref()
        .map(|t| !state.config.verify_token.is_empty() && t == state.config.verify_token)
        .unwrap_or(false);

    if token_matches {
        if let Some(challenge) = params.challenge {
            return challenge.into_response();
        }
    }

    tracing::warn!(mode = ?params.mode, "webhook verification failed");
    (StatusCode::FORBIDDEN, "Invalid verification token").into_response()
}

// ── Event payload ──
//
// Everything is optional so that payload shapes we do not understand degrade
// to "nothing to do" instead of a parse error Meta would retry forever.

#[derive(Deserialize, Default)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Deserialize, Default)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Deserialize, Default)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Deserialize, Default)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

#[derive(Deserialize, Default)]
pub struct InboundMessage {
    pub from: Option<String>,
    #[serde(rename = "type")]
    pub message_type: Option<String>,
}

fn validate_meta_signature(app_secret: &str, signature: &str, body: &[u8]) -> bool {
    let provided = match signature.strip_prefix("sha256=") {
        Some(hex) => hex,
        None => return false,
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    let expected: String = mac
        .finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();

    expected == provided
}

/// POST /webhook — WhatsApp Business event intake.
pub async fn receive_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    // Signature check over the raw body (skipped if no secret — dev mode).
    if !state.config.app_secret.is_empty() {
        let signature = headers
            .get("x-hub-signature-256")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing X-Hub-Signature-256 header");
            return Err(AppError::Unverified);
        }

        if !validate_meta_signature(&state.config.app_secret, signature, &body) {
            tracing::warn!("invalid webhook signature");
            return Err(AppError::Unverified);
        }
    }

    // Malformed payloads are acknowledged anyway; Meta retries anything else.
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(error = %e, "unparsable webhook payload, acknowledging");
            return Ok(ack());
        }
    };

    if payload.object == "whatsapp_business_account" {
        for entry in &payload.entry {
            for change in &entry.changes {
                for message in &change.value.messages {
                    let is_text = message.message_type.as_deref() == Some("text");
                    if let (true, Some(from)) = (is_text, message.from.as_deref()) {
                        handle_new_message(&state, from).await?;
                    }
                }
            }
        }
    }

    Ok(ack())
}

/// Inbound text flow: resolve the lead, then either resume the open booking
/// or start a new one. Lead resolution and the open-check-then-create run
/// under one connection lock, so in-process writers cannot interleave.
async fn handle_new_message(state: &Arc<AppState>, phone: &str) -> Result<(), AppError> {
    tracing::info!(from = %phone, "incoming WhatsApp text");

    let (lead, open_appointment) = {
        let db = state.db.lock().unwrap();
        let lead = scheduling::find_or_create_lead(&db, phone)?;
        let open = scheduling::find_open_appointment(&db, &lead.id)?;
        let open = match open {
            Some(appt) => Some(appt),
            None => {
                scheduling::create_initial_appointment(&db, &lead.id)?;
                None
            }
        };
        (lead, open)
    };

    let link = format!("{}/book/{}", state.config.frontend_url, lead.id);
    let text = if open_appointment.is_some() {
        format!("You have an open request. Resume booking here: {link}")
    } else {
        format!("Hi! Tap here to schedule your call: {link}")
    };

    // Fire-and-forget: a failed send is logged, never surfaced to Meta.
    if let Err(e) = state.messaging.send_message(phone, &text).await {
        tracing::error!(error = %e, to = %phone, "failed to send notification");
    }

    Ok(())
}

fn ack() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "received" }))
}
