// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat orchestrator: the ordered safety pipeline in front of the provider.
//!
//! Request flow: client IP → (auth middleware) → billing gate → rate limit →
//! IP referral gate → risk check → anonymization → provider stream → marker
//! filter → usage persistence on completion. The gates are mutually
//! exclusive: a request gets exactly one of the structured JSON denials or
//! the chunked text stream.
//!
//! Gate storage errors fail closed (the request is denied), never collapse
//! into "not blocked". The in-memory rate limiter cannot fail.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cauce_core::{CauceError, ChatMessage, ProviderRequest, Role, StreamDelta, TokenUsage};
use cauce_gate::IpStatus;
use cauce_guard::{anonymize, detect_risk, RiskClassification};
use cauce_storage::queries::{emergency, usage};
use cauce_storage::{Database, EmergencyLog, UsageRecord};
use cauce_stream::MarkerFilter;
use chrono::Utc;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::client_ip::extract_client_ip;
use crate::server::AppState;

/// Buffered chunks between the pump task and the response body. Small on
/// purpose: the provider inherits backpressure from the client connection.
const STREAM_CHANNEL_CAPACITY: usize = 8;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// `POST /v1/chat`
pub async fn post_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Response {
    let client_ip = extract_client_ip(&headers);

    // Billing gate, only on the authenticated path.
    if let Some(user_id) = &request.user_id {
        match state.billing_gate.check_billing_status(user_id).await {
            Ok(None) => {}
            Ok(Some(status)) => {
                return Json(json!({
                    "billingBlocked": true,
                    "invoiceId": status.invoice_id,
                    "amountUsd": status.amount_usd,
                }))
                .into_response();
            }
            Err(e) => return gate_failure("billing gate", e),
        }
    }

    let decision = state.rate_limiter.check(&client_ip);
    if !decision.allowed {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Demasiados mensajes. Esperá un rato antes de continuar.",
                "rateLimited": true,
                "retryAfterSecs": decision.retry_after_secs,
            })),
        )
            .into_response();
    }

    match state.ip_gate.check_ip_status(&client_ip).await {
        Ok(IpStatus::Clear) => {}
        Ok(IpStatus::Blocked { blocked_until }) => {
            return blocked_response(blocked_until.to_rfc3339());
        }
        Ok(IpStatus::GraceExpired { referral_id }) => {
            // Grace ran out: block now and count the attempt that tripped it.
            let blocked_until = match state.ip_gate.block_ip(&referral_id).await {
                Ok(until) => until,
                Err(e) => return gate_failure("ip gate", e),
            };
            if let Err(e) = state.ip_gate.record_attempt(&referral_id).await {
                return gate_failure("ip gate", e);
            }
            return blocked_response(blocked_until.to_rfc3339());
        }
        Ok(IpStatus::InGrace { referral_id }) => {
            if let Err(e) = state.ip_gate.record_attempt(&referral_id).await {
                return gate_failure("ip gate", e);
            }
        }
        Err(e) => return gate_failure("ip gate", e),
    }

    let Some(latest_user) = request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "El mensaje no puede estar vacío" })),
        )
            .into_response();
    };

    let risk = detect_risk(&latest_user.content);
    if risk.should_activate_lockdown {
        if let Err(e) =
            persist_emergency(&state.db, &request.user_id, &latest_user.content, &risk).await
        {
            // The lockdown response still goes out; losing the audit row
            // must not re-open the chat flow.
            error!(error = %e, "failed to persist emergency log");
        }
        return Json(json!({
            "lockdown": true,
            "riskLevel": risk.level,
        }))
        .into_response();
    }

    // Only user-authored content is anonymized; the assistant's own prior
    // turns are trusted output.
    let messages: Vec<ChatMessage> = request
        .messages
        .iter()
        .map(|m| ChatMessage {
            role: m.role,
            content: if m.role == Role::User {
                anonymize(&m.content)
            } else {
                m.content.clone()
            },
        })
        .collect();

    let provider_request = ProviderRequest {
        model: state.settings.model.clone(),
        system: state.settings.system_prompt.clone(),
        messages,
        max_tokens: state.settings.max_tokens,
    };

    let provider_stream = match state.provider.stream(provider_request).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = %e, provider = state.provider.name(), "provider request failed");
            return internal_error();
        }
    };

    let (tx, rx) = mpsc::channel::<Result<String, CauceError>>(STREAM_CHANNEL_CAPACITY);
    let db = state.db.clone();
    let marker = state.marker.clone();
    let user_id = request.user_id.clone();
    tokio::spawn(pump_stream(
        provider_stream,
        tx,
        db,
        marker,
        user_id,
        client_ip,
    ));

    let body_stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item.map(Bytes::from), rx))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(body_stream))
        .unwrap_or_else(|_| internal_error())
}

/// Drive the provider stream through the marker filter into the response
/// channel, then persist usage.
///
/// A failed send means the client disconnected: the pending buffer is
/// dropped and nothing further is persisted.
async fn pump_stream(
    mut provider_stream: cauce_core::traits::provider::DeltaStream,
    tx: mpsc::Sender<Result<String, CauceError>>,
    db: Database,
    marker: String,
    user_id: Option<String>,
    client_ip: String,
) {
    let mut filter = MarkerFilter::new(marker);
    let mut usage: Option<TokenUsage> = None;
    let mut stream_failed = false;

    while let Some(item) = provider_stream.next().await {
        match item {
            Ok(StreamDelta { text, usage: u }) => {
                if let Some(u) = u {
                    usage = Some(u);
                }
                if let Some(text) = text {
                    if let Some(emitted) = filter.push(&text) {
                        if tx.send(Ok(emitted)).await.is_err() {
                            info!("client disconnected mid-stream");
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "provider stream failed mid-response");
                let _ = tx.send(Err(e)).await;
                stream_failed = true;
                break;
            }
        }
    }

    if !stream_failed {
        if let Some(tail) = filter.finish() {
            if tx.send(Ok(tail)).await.is_err() {
                return;
            }
        }
    }

    if filter.occurrences() > 0 {
        info!(
            markers_stripped = filter.occurrences(),
            "referral marker observed in response"
        );
    }

    if let Some(usage) = usage {
        let record = UsageRecord {
            id: Uuid::new_v4().to_string(),
            user_id,
            ip_address: client_ip,
            input_tokens: usage.input_tokens as i64,
            output_tokens: usage.output_tokens as i64,
            created_at: Utc::now().to_rfc3339(),
        };
        if let Err(e) = usage::insert_usage(&db, &record).await {
            error!(error = %e, "failed to persist usage record");
        }
    }
}

async fn persist_emergency(
    db: &Database,
    user_id: &Option<String>,
    trigger: &str,
    risk: &RiskClassification,
) -> Result<(), CauceError> {
    let keywords = serde_json::to_string(&risk.detected_keywords)
        .map_err(|e| CauceError::Internal(format!("failed to encode keywords: {e}")))?;
    let log = EmergencyLog {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.clone(),
        trigger_message: anonymize(trigger),
        detected_keywords: keywords,
        risk_level: risk.level.to_string(),
        lockdown_activated: true,
        created_at: Utc::now().to_rfc3339(),
    };
    warn!(risk_level = %risk.level, "lockdown activated");
    emergency::insert_emergency_log(db, &log).await
}

fn blocked_response(blocked_until: String) -> Response {
    Json(json!({
        "blocked": true,
        "blockedUntil": blocked_until,
    }))
    .into_response()
}

fn gate_failure(gate: &str, e: CauceError) -> Response {
    error!(gate, error = %e, "gate check failed, denying request");
    internal_error()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Error interno del servidor" })),
    )
        .into_response()
}
