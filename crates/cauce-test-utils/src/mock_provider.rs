// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured responses,
//! split into a configurable chunk size so marker-boundary behavior can be
//! exercised exactly.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use cauce_core::traits::provider::DeltaStream;
use cauce_core::{CauceError, ProviderAdapter, ProviderRequest, StreamDelta, TokenUsage};
use futures::stream;
use tokio::sync::Mutex;

/// A mock provider that streams pre-configured responses.
///
/// Responses are popped from a FIFO queue; when the queue is empty a default
/// "mock response" text is streamed. Each response is split into text deltas
/// of `chunk_size` characters, followed by a usage delta.
///
/// Clones share the response queue and the recorded request, so a test can
/// keep a handle while the provider itself is moved behind
/// `Arc<dyn ProviderAdapter>`.
#[derive(Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    last_request: Arc<Mutex<Option<ProviderRequest>>>,
    chunk_size: usize,
    usage: TokenUsage,
}

impl MockProvider {
    /// A provider with an empty queue and whole-response chunks.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            last_request: Arc::new(Mutex::new(None)),
            chunk_size: usize::MAX,
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 20,
            },
        }
    }

    /// A provider pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Self::new()
        }
    }

    /// Split responses into deltas of at most `chunk_size` characters.
    ///
    /// Splits respect char boundaries, not marker boundaries, which is the
    /// point: a chunk edge can land anywhere inside a marker.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Override the usage reported at the end of each stream.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Append a response to the queue.
    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    /// The most recent request passed to [`ProviderAdapter::stream`].
    ///
    /// Lets tests assert what actually reached the provider, e.g. that
    /// user content was transformed before being forwarded.
    pub async fn last_request(&self) -> Option<ProviderRequest> {
        self.last_request.lock().await.clone()
    }

    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    async fn stream(&self, request: ProviderRequest) -> Result<DeltaStream, CauceError> {
        *self.last_request.lock().await = Some(request);

        let text = self.next_response().await;

        let mut deltas: Vec<Result<StreamDelta, CauceError>> = Vec::new();
        let chars: Vec<char> = text.chars().collect();
        for chunk in chars.chunks(self.chunk_size.min(chars.len().max(1))) {
            deltas.push(Ok(StreamDelta::text(chunk.iter().collect::<String>())));
        }
        deltas.push(Ok(StreamDelta::usage(self.usage)));

        Ok(Box::pin(stream::iter(deltas)))
    }
}
