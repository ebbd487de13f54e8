// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared between the gateway, the guard components, and the
//! provider adapters.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Author of a chat message.
///
/// Only user-authored content passes through the anonymizer; assistant and
/// system content is trusted output and passes through unchanged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the message.
    pub role: Role,
    /// Plain UTF-8 message text.
    pub content: String,
}

/// A completion request sent to an LLM provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Model identifier (provider-specific).
    pub model: String,
    /// System prompt prepended to the conversation.
    pub system: String,
    /// Conversation history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

/// Token accounting reported by a provider at the end of a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub input_tokens: u64,
    /// Tokens generated in the response.
    pub output_tokens: u64,
}

/// One element of a provider's response stream.
///
/// Text deltas arrive incrementally; usage (if the provider reports it)
/// arrives once near the end of the stream. Either field may be absent on
/// any given delta.
#[derive(Debug, Clone, Default)]
pub struct StreamDelta {
    /// Incremental response text.
    pub text: Option<String>,
    /// Final token usage, reported once per stream.
    pub usage: Option<TokenUsage>,
}

impl StreamDelta {
    /// A delta carrying only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            usage: None,
        }
    }

    /// A delta carrying only usage accounting.
    pub fn usage(usage: TokenUsage) -> Self {
        Self {
            text: None,
            usage: Some(usage),
        }
    }
}
