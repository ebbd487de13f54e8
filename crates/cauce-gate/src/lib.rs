// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Safety gates for the Cauce gateway.
//!
//! Three independent gates, composed by the chat orchestrator:
//!
//! - [`IpGate`]: persisted per-IP referral state machine
//!   (clear → in-grace → grace-expired → blocked → clear on expiry).
//! - [`RateLimiter`]: in-process fixed-window counter keyed by client IP,
//!   with a periodic sweep task and explicit shutdown.
//! - [`BillingGate`]: per-user active billing block lookup.
//!
//! The IP and billing gates read from SQLite and propagate storage errors to
//! the caller, which must fail closed on them. The rate limiter is in-memory
//! and advisory; its state is lost on restart.

pub mod billing;
pub mod ip;
pub mod ratelimit;

pub use billing::{BillingGate, BillingStatus};
pub use ip::{IpGate, IpStatus};
pub use ratelimit::{RateDecision, RateLimiter};
