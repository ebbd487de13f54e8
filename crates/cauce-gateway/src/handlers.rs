// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers for the non-chat routes.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cauce_gate::IpStatus;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::client_ip::extract_client_ip;
use crate::server::AppState;

/// `GET /health`: unauthenticated liveness probe.
pub async fn get_health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

/// `GET /v1/ip-status`: referral/block state for the caller's IP.
pub async fn get_ip_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let client_ip = extract_client_ip(&headers);
    match state.ip_gate.check_ip_status(&client_ip).await {
        Ok(status) => {
            let (blocked, referred, blocked_until) = match status {
                IpStatus::Clear => (false, false, None),
                IpStatus::InGrace { .. } | IpStatus::GraceExpired { .. } => (false, true, None),
                IpStatus::Blocked { blocked_until } => {
                    (true, true, Some(blocked_until.to_rfc3339()))
                }
            };
            Json(json!({
                "blocked": blocked,
                "referred": referred,
                "blockedUntil": blocked_until,
            }))
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "ip status check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error interno del servidor" })),
            )
                .into_response()
        }
    }
}

/// Professional referral contact form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub context: Option<String>,
}

impl ReferralForm {
    fn validate(&self) -> Result<(), &'static str> {
        let required = [&self.first_name, &self.last_name, &self.phone, &self.email];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err("Todos los campos son obligatorios");
        }
        Ok(())
    }

    /// Referral reason as stored on the IP record. The contact details are
    /// collected deliberately here; this is the one place PII is kept.
    fn reason(&self) -> String {
        match self
            .context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            Some(context) => format!(
                "Derivación con datos: {} {}. Contexto: {}",
                self.first_name.trim(),
                self.last_name.trim(),
                context
            ),
            None => format!(
                "Derivación con datos: {} {}",
                self.first_name.trim(),
                self.last_name.trim()
            ),
        }
    }
}

/// `POST /v1/referrals`: record a referral for the caller's IP.
///
/// Validation happens before any gating stage; a blocked IP can still submit
/// the form (the whole point of the form is reaching the professional).
pub async fn post_referral(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<ReferralForm>,
) -> Response {
    if let Err(message) = form.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": message })),
        )
            .into_response();
    }

    let client_ip = extract_client_ip(&headers);
    match state.ip_gate.create_referral(&client_ip, &form.reason()).await {
        Ok(_) => Json(json!({ "success": true })).into_response(),
        Err(e) => {
            error!(error = %e, "failed to create referral");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error interno del servidor" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(first: &str, last: &str, phone: &str, email: &str) -> ReferralForm {
        ReferralForm {
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
            context: None,
        }
    }

    #[test]
    fn complete_form_validates() {
        assert!(form("Ana", "García", "1155550000", "ana@example.com")
            .validate()
            .is_ok());
    }

    #[test]
    fn blank_required_field_is_rejected() {
        assert!(form("Ana", "  ", "1155550000", "ana@example.com")
            .validate()
            .is_err());
        assert!(form("", "García", "1155550000", "ana@example.com")
            .validate()
            .is_err());
    }

    #[test]
    fn reason_includes_context_when_present() {
        let mut f = form("Ana", "García", "1155550000", "ana@example.com");
        assert_eq!(f.reason(), "Derivación con datos: Ana García");
        f.context = Some("pidió ayuda con ansiedad".to_string());
        assert_eq!(
            f.reason(),
            "Derivación con datos: Ana García. Contexto: pidió ayuda con ansiedad"
        );
    }
}
