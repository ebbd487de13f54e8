// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Cauce safety gateway.
//!
//! This crate provides the foundational error type, shared chat/provider
//! types, and the provider trait used across the Cauce workspace. The
//! gating components (guard, gate, stream) build on these; the gateway
//! composes them per request.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CauceError;
pub use traits::ProviderAdapter;
pub use types::{ChatMessage, ProviderRequest, Role, StreamDelta, TokenUsage};
