// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming marker removal.
//!
//! The model appends a fixed control marker to responses that recommend a
//! human referral. The marker must never reach user-visible text, but the
//! response must still stream incrementally, and a chunk boundary can fall
//! anywhere -- including inside the marker itself.
//!
//! [`MarkerFilter`] is a small state machine over an explicit `pending`
//! buffer: feed it chunks with [`MarkerFilter::push`], drain the tail with
//! [`MarkerFilter::finish`]. It is a pure `(state, chunk) -> (state',
//! emitted)` step function, so it is unit-testable without a real stream.

pub mod marker;

pub use marker::MarkerFilter;
