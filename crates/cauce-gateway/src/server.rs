// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. Only the chat route sits
//! behind bearer auth: the referral form and IP status check must stay
//! reachable for a client that was just denied.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use cauce_config::GatewayConfig;
use cauce_core::{CauceError, ProviderAdapter};
use cauce_gate::{BillingGate, IpGate, RateLimiter};
use cauce_storage::Database;
use tower_http::cors::CorsLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::chat;
use crate::handlers;

/// Model and prompt settings for outgoing provider requests.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub system_prompt: String,
    pub model: String,
    pub max_tokens: u32,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub provider: Arc<dyn ProviderAdapter>,
    pub rate_limiter: Arc<RateLimiter>,
    pub ip_gate: IpGate,
    pub billing_gate: BillingGate,
    pub settings: Arc<ChatSettings>,
    /// Referral marker stripped from response streams.
    pub marker: String,
}

/// Assemble the gateway router.
pub fn build_router(state: AppState, auth: AuthConfig) -> Router {
    let chat_routes = Router::new()
        .route("/v1/chat", post(chat::post_chat))
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/ip-status", get(handlers::get_ip_status))
        .route("/v1/referrals", post(handlers::post_referral))
        .with_state(state);

    Router::new()
        .merge(chat_routes)
        .merge(public_routes)
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the task is cancelled.
pub async fn start_server(config: &GatewayConfig, state: AppState) -> Result<(), CauceError> {
    let auth = AuthConfig {
        bearer_token: config.bearer_token.clone(),
    };
    let app = build_router(state, auth);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CauceError::Gateway {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| CauceError::Gateway {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use cauce_storage::queries::{billing, referrals, usage};
    use cauce_storage::{BillingBlock, Invoice};
    use cauce_test_utils::MockProvider;
    use chrono::{Duration as ChronoDuration, Utc};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    const TEST_IP: &str = "203.0.113.7";
    const MARKER: &str = "[DERIVAR_PROFESIONAL]";

    async fn test_state(provider: MockProvider) -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("gateway.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let state = AppState {
            db: db.clone(),
            provider: Arc::new(provider),
            rate_limiter: Arc::new(RateLimiter::new(30, Duration::from_secs(3600))),
            ip_gate: IpGate::new(db.clone(), 2, 90),
            billing_gate: BillingGate::new(db),
            settings: Arc::new(ChatSettings {
                system_prompt: "Sos un asistente.".to_string(),
                model: "gpt-4o".to_string(),
                max_tokens: 256,
            }),
            marker: MARKER.to_string(),
        };
        (state, dir)
    }

    fn app(state: AppState) -> Router {
        build_router(state, AuthConfig { bearer_token: None })
    }

    fn chat_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/chat")
            .header("content-type", "application/json")
            .header("x-forwarded-for", TEST_IP)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn user_chat_body(content: &str) -> Value {
        json!({ "messages": [{ "role": "user", "content": content }] })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn content_type(response: &axum::response::Response) -> String {
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let (state, _dir) = test_state(MockProvider::new()).await;
        let response = app(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn chat_streams_and_strips_marker() {
        let provider = MockProvider::with_responses(vec![format!(
            "Te recomiendo contactar a la profesional.\n{MARKER}"
        )])
        .with_chunk_size(7);
        let (state, _dir) = test_state(provider).await;
        let db = state.db.clone();

        let response = app(state)
            .oneshot(chat_request(user_chat_body("hola, ¿cómo estás?")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(content_type(&response).starts_with("text/plain"));
        let text = body_text(response).await;
        assert_eq!(text, "Te recomiendo contactar a la profesional.");
        assert!(!text.contains(MARKER));

        // The pump persists usage before closing the channel, so the record
        // is visible once the body is fully read.
        let (input, output) = usage::usage_totals_for_ip(&db, TEST_IP).await.unwrap();
        assert_eq!((input, output), (10, 20));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn high_risk_message_triggers_lockdown() {
        let (state, _dir) = test_state(MockProvider::new()).await;
        let db = state.db.clone();

        let response = app(state)
            .oneshot(chat_request(user_chat_body("no puedo más, quiero matarme")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(content_type(&response).starts_with("application/json"));
        let body = body_json(response).await;
        assert_eq!(body["lockdown"], true);
        assert_eq!(body["riskLevel"], "high");

        let logs = cauce_storage::queries::emergency::list_emergency_logs(&db, 10)
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].risk_level, "high");
        assert!(logs[0].lockdown_activated);
        assert!(logs[0].detected_keywords.contains("quiero matarme"));

        // The model is never called: no usage row exists.
        let (input, output) = usage::usage_totals_for_ip(&db, TEST_IP).await.unwrap();
        assert_eq!((input, output), (0, 0));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn auth_required_when_token_configured() {
        let (state, _dir) = test_state(MockProvider::new()).await;
        let router = build_router(
            state,
            AuthConfig {
                bearer_token: Some("secreto".to_string()),
            },
        );

        let denied = router
            .clone()
            .oneshot(chat_request(user_chat_body("hola")))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(denied).await["authRequired"], true);

        let mut authed = chat_request(user_chat_body("hola"));
        authed
            .headers_mut()
            .insert("authorization", "Bearer secreto".parse().unwrap());
        let allowed = router.oneshot(authed).await.unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
        assert!(content_type(&allowed).starts_with("text/plain"));
    }

    #[tokio::test]
    async fn rate_limit_denies_after_ceiling() {
        let (mut state, _dir) = test_state(MockProvider::new()).await;
        state.rate_limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(3600)));
        let router = app(state);

        let first = router
            .clone()
            .oneshot(chat_request(user_chat_body("hola")))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = router
            .oneshot(chat_request(user_chat_body("hola de nuevo")))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(second).await;
        assert_eq!(body["rateLimited"], true);
    }

    #[tokio::test]
    async fn blocked_ip_receives_blocked_response() {
        let (state, _dir) = test_state(MockProvider::new()).await;
        let referral = state
            .ip_gate
            .create_referral(TEST_IP, "derivación")
            .await
            .unwrap();
        let blocked_until = state.ip_gate.block_ip(&referral.id).await.unwrap();

        let response = app(state)
            .oneshot(chat_request(user_chat_body("hola")))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["blocked"], true);
        assert_eq!(body["blockedUntil"], blocked_until.to_rfc3339());
    }

    #[tokio::test]
    async fn expired_grace_blocks_on_next_attempt() {
        let (state, _dir) = test_state(MockProvider::new()).await;
        let db = state.db.clone();
        // Referred three days ago: past the two-day grace period.
        let referral = state
            .ip_gate
            .create_referral_at(TEST_IP, "derivación", Utc::now() - ChronoDuration::days(3))
            .await
            .unwrap();

        let response = app(state)
            .oneshot(chat_request(user_chat_body("hola")))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["blocked"], true);
        assert!(body["blockedUntil"].is_string());

        let stored = referrals::get_referral(&db, &referral.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.blocked_until.is_some());
        assert_eq!(stored.attempts_after_referral, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn in_grace_attempt_is_recorded_and_chat_proceeds() {
        let provider = MockProvider::with_responses(vec!["todo bien".to_string()]);
        let (state, _dir) = test_state(provider).await;
        let db = state.db.clone();
        let referral = state
            .ip_gate
            .create_referral(TEST_IP, "derivación")
            .await
            .unwrap();

        let response = app(state)
            .oneshot(chat_request(user_chat_body("hola")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "todo bien");

        let stored = referrals::get_referral(&db, &referral.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.attempts_after_referral, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn billing_block_denies_authenticated_user() {
        let (state, _dir) = test_state(MockProvider::new()).await;
        let db = state.db.clone();
        billing::insert_invoice(
            &db,
            &Invoice {
                id: "inv-1".to_string(),
                user_id: "user-1".to_string(),
                amount_usd: 120.0,
                due_date: "2026-02-01T00:00:00+00:00".to_string(),
                status: "overdue".to_string(),
                paid_at: None,
                created_at: "2026-01-01T00:00:00+00:00".to_string(),
            },
        )
        .await
        .unwrap();
        billing::insert_block(
            &db,
            &BillingBlock {
                id: "blk-1".to_string(),
                user_id: "user-1".to_string(),
                invoice_id: "inv-1".to_string(),
                blocked_at: "2026-02-10T00:00:00+00:00".to_string(),
                unblocked_at: None,
                created_at: "2026-02-10T00:00:00+00:00".to_string(),
            },
        )
        .await
        .unwrap();

        let body = json!({
            "messages": [{ "role": "user", "content": "hola" }],
            "userId": "user-1",
        });
        let response = app(state).oneshot(chat_request(body)).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["billingBlocked"], true);
        assert_eq!(body["invoiceId"], "inv-1");
        assert_eq!(body["amountUsd"], 120.0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn chat_without_user_message_is_bad_request() {
        let (state, _dir) = test_state(MockProvider::new()).await;
        let response = app(state)
            .oneshot(chat_request(json!({ "messages": [] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn referral_form_round_trip() {
        let (state, _dir) = test_state(MockProvider::new()).await;
        let db = state.db.clone();
        let router = app(state);

        let incomplete = Request::post("/v1/referrals")
            .header("content-type", "application/json")
            .header("x-forwarded-for", TEST_IP)
            .body(Body::from(
                json!({ "firstName": "Ana", "lastName": "García" }).to_string(),
            ))
            .unwrap();
        let response = router.clone().oneshot(incomplete).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let complete = || {
            Request::post("/v1/referrals")
                .header("content-type", "application/json")
                .header("x-forwarded-for", TEST_IP)
                .body(Body::from(
                    json!({
                        "firstName": "Ana",
                        "lastName": "García",
                        "phone": "1155550000",
                        "email": "ana@example.com",
                        "context": "quiere coordinar una consulta",
                    })
                    .to_string(),
                ))
                .unwrap()
        };
        let response = router.clone().oneshot(complete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);

        let first = referrals::get_referral_by_ip(&db, TEST_IP)
            .await
            .unwrap()
            .unwrap();
        assert!(first.reason.as_deref().unwrap().contains("Ana García"));

        // Resubmitting while the referral is active does not replace it.
        let response = router.oneshot(complete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let second = referrals::get_referral_by_ip(&db, TEST_IP)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.id, second.id);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn ip_status_reflects_referral_state() {
        let (state, _dir) = test_state(MockProvider::new()).await;
        let router = app(state.clone());

        let request = || {
            Request::get("/v1/ip-status")
                .header("x-forwarded-for", TEST_IP)
                .body(Body::empty())
                .unwrap()
        };
        let body = body_json(router.clone().oneshot(request()).await.unwrap()).await;
        assert_eq!(body["blocked"], false);
        assert_eq!(body["referred"], false);

        state
            .ip_gate
            .create_referral(TEST_IP, "derivación")
            .await
            .unwrap();
        let body = body_json(router.oneshot(request()).await.unwrap()).await;
        assert_eq!(body["blocked"], false);
        assert_eq!(body["referred"], true);
        assert!(body["blockedUntil"].is_null());
    }

    #[tokio::test]
    async fn user_content_is_anonymized_before_the_provider() {
        let provider = MockProvider::with_responses(vec!["entendido".to_string()]);
        let handle = provider.clone();
        let (state, _dir) = test_state(provider).await;

        // Assistant history stays verbatim; only user turns pass through
        // the anonymizer.
        let body = json!({ "messages": [
            { "role": "assistant", "content": "podés escribirle a soporte@example.com" },
            { "role": "user", "content": "me llamo Carla y mi mail es carla@example.com" },
        ]});
        let response = app(state).oneshot(chat_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "entendido");

        let forwarded = handle.last_request().await.unwrap();
        assert_eq!(forwarded.messages.len(), 2);
        assert_eq!(
            forwarded.messages[0].content,
            "podés escribirle a soporte@example.com"
        );
        assert_eq!(
            forwarded.messages[1].content,
            "me llamo [NOMBRE] y mi mail es [EMAIL]"
        );
        assert!(!forwarded.messages[1].content.contains("Carla"));
        assert!(!forwarded.messages[1].content.contains("carla@example.com"));
    }
}
