// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text guards for the Cauce safety gateway.
//!
//! Two pure, deterministic transforms that run on every inbound user message:
//!
//! 1. **Anonymizer**: redacts PII (phones, emails, national IDs, addresses,
//!    proper names after relational keywords, URLs, card numbers) before text
//!    leaves the process.
//! 2. **Risk detector**: scans for crisis-risk phrases and classifies the
//!    message, deciding whether the lockdown flow must replace the normal
//!    chat flow.
//!
//! Matching is intentionally literal (exact phrase substrings, fixed regex
//! patterns) to keep behavior auditable. No ML, no tokenization, no stemming.

pub mod anonymize;
pub mod risk;

pub use anonymize::{anonymize, contains_pii};
pub use risk::{detect_risk, has_high_risk, RiskClassification, RiskLevel};
