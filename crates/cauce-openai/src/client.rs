// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI chat-completions API.
//!
//! Provides [`OpenAiProvider`] which handles request construction,
//! authentication, streaming SSE responses, and transient error retry.

use std::time::Duration;

use async_trait::async_trait;
use cauce_config::OpenAiConfig;
use cauce_core::traits::provider::DeltaStream;
use cauce_core::{CauceError, ProviderAdapter, ProviderRequest};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::sse;
use crate::types::{ApiErrorResponse, ChatCompletionRequest, StreamOptions, WireMessage};

/// OpenAI provider adapter.
///
/// Manages the authenticated connection pool and retries transient errors
/// (429, 500, 503) once before giving up.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl OpenAiProvider {
    /// Builds a provider from config. Fails if no API key is configured.
    pub fn new(config: &OpenAiConfig) -> Result<Self, CauceError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| CauceError::Config("openai.api_key is not set".to_string()))?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| CauceError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| CauceError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_body(&self, request: &ProviderRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.system.is_empty() {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: request.system.clone(),
            });
        }
        messages.extend(request.messages.iter().map(|m| WireMessage {
            role: m.role.to_string(),
            content: m.content.clone(),
        }));

        ChatCompletionRequest {
            model: if request.model.is_empty() {
                self.model.clone()
            } else {
                request.model.clone()
            },
            messages,
            max_tokens: if request.max_tokens == 0 {
                self.max_tokens
            } else {
                request.max_tokens
            },
            stream: true,
            stream_options: Some(StreamOptions {
                include_usage: true,
            }),
        }
    }

    async fn send_stream(&self, body: &ChatCompletionRequest) -> Result<DeltaStream, CauceError> {
        let url = format!("{}/chat/completions", self.base_url);
        let max_retries = 1;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying streaming request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| CauceError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "streaming response received");

            if status.is_success() {
                return Ok(sse::parse_sse_stream(response));
            }

            if is_transient_error(status) && attempt < max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(CauceError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                format!(
                    "OpenAI API error ({}): {}",
                    api_err.error.type_.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                )
            } else {
                format!("API returned {status}: {body}")
            };
            return Err(CauceError::Provider {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| CauceError::Provider {
            message: "streaming request failed after retries".into(),
            source: None,
        }))
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn stream(&self, request: ProviderRequest) -> Result<DeltaStream, CauceError> {
        let body = self.build_body(&request);
        self.send_stream(&body).await
    }
}

/// HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
