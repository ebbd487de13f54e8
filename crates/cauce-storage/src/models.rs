// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row models for storage entities.
//!
//! Timestamps are stored as RFC 3339 UTC strings; parsing into
//! `chrono::DateTime` happens at the gate layer where time comparisons live.

use serde::{Deserialize, Serialize};

/// Per-IP referral record. One row per IP (unique `ip_address`).
///
/// A non-null `blocked_until` in the future means an active block; expiry is
/// computed at read time, never written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpReferral {
    pub id: String,
    pub ip_address: String,
    pub referred_at: String,
    pub blocked_at: Option<String>,
    pub blocked_until: Option<String>,
    pub attempts_after_referral: i64,
    pub last_attempt_at: Option<String>,
    pub reason: Option<String>,
    pub created_at: String,
}

/// Invoice row. Invoicing logic lives outside this service; the row exists
/// so billing blocks can join to display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub user_id: String,
    pub amount_usd: f64,
    pub due_date: String,
    pub status: String,
    pub paid_at: Option<String>,
    pub created_at: String,
}

/// A billing block event. `unblocked_at` null means the block is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingBlock {
    pub id: String,
    pub user_id: String,
    pub invoice_id: String,
    pub blocked_at: String,
    pub unblocked_at: Option<String>,
    pub created_at: String,
}

/// Emergency log record persisted when lockdown triggers.
///
/// `trigger_message` is already anonymized; `detected_keywords` is a JSON
/// array of matched phrases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyLog {
    pub id: String,
    pub user_id: Option<String>,
    pub trigger_message: String,
    pub detected_keywords: String,
    pub risk_level: String,
    pub lockdown_activated: bool,
    pub created_at: String,
}

/// Token usage recorded on stream completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub ip_address: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub created_at: String,
}
