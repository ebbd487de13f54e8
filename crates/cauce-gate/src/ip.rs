// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-IP referral state machine.
//!
//! Once a visitor is referred to a human professional, their IP keeps chat
//! access for a grace period. After the grace period, the next chat attempt
//! triggers a long block. All state is derived at read time from a single
//! persisted row per IP; expiry is never written back.
//!
//! The IP comes from forwarding headers and is client-controlled, so this is
//! abuse deterrence, not an auth boundary.

use cauce_core::CauceError;
use cauce_storage::queries::referrals;
use cauce_storage::{Database, IpReferral};
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

/// Gate status for an IP, computed from its referral row.
#[derive(Debug, Clone, PartialEq)]
pub enum IpStatus {
    /// No referral on record, or a previous block has expired.
    Clear,
    /// Referred, still within the grace period. Attempts are counted.
    InGrace { referral_id: String },
    /// Referred and the grace period has elapsed; the caller should block.
    GraceExpired { referral_id: String },
    /// Actively blocked until the given time.
    Blocked { blocked_until: DateTime<Utc> },
}

/// The persisted IP referral gate.
#[derive(Clone)]
pub struct IpGate {
    db: Database,
    grace_period: Duration,
    block_duration: Duration,
}

impl IpGate {
    pub fn new(db: Database, grace_period_days: i64, block_duration_days: i64) -> Self {
        Self {
            db,
            grace_period: Duration::days(grace_period_days),
            block_duration: Duration::days(block_duration_days),
        }
    }

    /// Compute the gate status for an IP.
    ///
    /// Storage errors propagate; callers must not treat them as `Clear`.
    pub async fn check_ip_status(&self, ip: &str) -> Result<IpStatus, CauceError> {
        self.check_ip_status_at(ip, Utc::now()).await
    }

    /// Status computation against an explicit clock, for deterministic tests.
    pub async fn check_ip_status_at(
        &self,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<IpStatus, CauceError> {
        let Some(referral) = referrals::get_referral_by_ip(&self.db, ip).await? else {
            return Ok(IpStatus::Clear);
        };

        if let Some(blocked_until) = &referral.blocked_until {
            let blocked_until = parse_timestamp(blocked_until)?;
            if blocked_until > now {
                return Ok(IpStatus::Blocked { blocked_until });
            }
            // Expired block. The row is replaced lazily by the next referral.
            return Ok(IpStatus::Clear);
        }

        let referred_at = parse_timestamp(&referral.referred_at)?;
        if is_grace_period_expired(referred_at, now, self.grace_period) {
            Ok(IpStatus::GraceExpired {
                referral_id: referral.id,
            })
        } else {
            Ok(IpStatus::InGrace {
                referral_id: referral.id,
            })
        }
    }

    /// Record a referral for an IP.
    ///
    /// Idempotent while a referral or unexpired block exists for the IP: the
    /// existing record is returned untouched. An expired block is replaced
    /// with a fresh referral row.
    pub async fn create_referral(
        &self,
        ip: &str,
        reason: &str,
    ) -> Result<IpReferral, CauceError> {
        self.create_referral_at(ip, reason, Utc::now()).await
    }

    pub async fn create_referral_at(
        &self,
        ip: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<IpReferral, CauceError> {
        if let Some(existing) = referrals::get_referral_by_ip(&self.db, ip).await? {
            let block_expired = match &existing.blocked_until {
                Some(blocked_until) => parse_timestamp(blocked_until)? <= now,
                None => false,
            };
            if !block_expired {
                return Ok(existing);
            }
        }

        let referral = IpReferral {
            id: Uuid::new_v4().to_string(),
            ip_address: ip.to_string(),
            referred_at: now.to_rfc3339(),
            blocked_at: None,
            blocked_until: None,
            attempts_after_referral: 0,
            last_attempt_at: None,
            reason: Some(reason.to_string()),
            created_at: now.to_rfc3339(),
        };
        referrals::upsert_referral(&self.db, &referral).await?;
        info!(ip, referral_id = %referral.id, "referral recorded");
        Ok(referral)
    }

    /// Block a referral's IP for the configured duration, returning the
    /// block's end time.
    ///
    /// Concurrent calls for the same referral write the same effective state.
    pub async fn block_ip(&self, referral_id: &str) -> Result<DateTime<Utc>, CauceError> {
        self.block_ip_at(referral_id, Utc::now()).await
    }

    pub async fn block_ip_at(
        &self,
        referral_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, CauceError> {
        let blocked_until = now + self.block_duration;
        referrals::set_block(
            &self.db,
            referral_id,
            &now.to_rfc3339(),
            &blocked_until.to_rfc3339(),
        )
        .await?;
        warn!(referral_id, %blocked_until, "IP blocked after grace period");
        Ok(blocked_until)
    }

    /// Count a post-referral chat attempt.
    pub async fn record_attempt(&self, referral_id: &str) -> Result<(), CauceError> {
        referrals::record_attempt(&self.db, referral_id, &Utc::now().to_rfc3339()).await
    }
}

/// Whether the grace period starting at `referred_at` has elapsed by `now`.
pub fn is_grace_period_expired(
    referred_at: DateTime<Utc>,
    now: DateTime<Utc>,
    grace_period: Duration,
) -> bool {
    now - referred_at >= grace_period
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, CauceError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CauceError::Internal(format!("malformed stored timestamp {value:?}: {e}")))
}
