// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for LLM integrations.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::CauceError;
use crate::types::{ProviderRequest, StreamDelta};

/// A boxed stream of provider deltas.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<StreamDelta, CauceError>> + Send>>;

/// Adapter for LLM provider integrations.
///
/// The gateway treats the provider as an opaque token-stream source: it sends
/// a request and pulls deltas. Each downstream read pulls at most one
/// upstream read, so backpressure is inherited from the consumer.
#[async_trait]
pub trait ProviderAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this provider.
    fn name(&self) -> &str;

    /// Sends a completion request and returns a stream of response deltas.
    async fn stream(&self, request: ProviderRequest) -> Result<DeltaStream, CauceError>;
}
