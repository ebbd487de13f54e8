// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI chat-completions provider adapter.
//!
//! Implements [`cauce_core::traits::ProviderAdapter`] against the
//! `/chat/completions` streaming API. The adapter is the only component that
//! knows the wire format; the rest of the workspace sees
//! [`cauce_core::StreamDelta`] items.

pub mod client;
pub mod sse;
pub mod types;

pub use client::OpenAiProvider;
