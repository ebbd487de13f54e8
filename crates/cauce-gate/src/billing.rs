// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user billing gate.
//!
//! Read-only at request time: blocks are opened by the overdue-invoice job
//! and closed on payment, both outside this service. Any active block denies
//! chat regardless of IP or risk state.

use cauce_core::CauceError;
use cauce_storage::queries::billing;
use cauce_storage::Database;
use tracing::info;

/// Details of an active billing block, for the deny response.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingStatus {
    pub invoice_id: String,
    pub amount_usd: f64,
    pub due_date: String,
}

#[derive(Clone)]
pub struct BillingGate {
    db: Database,
}

impl BillingGate {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Look up the active billing block for a user.
    ///
    /// `Ok(None)` means the user is in good standing. Storage errors
    /// propagate; the caller fails closed on them.
    pub async fn check_billing_status(
        &self,
        user_id: &str,
    ) -> Result<Option<BillingStatus>, CauceError> {
        let Some(block) = billing::get_active_block(&self.db, user_id).await? else {
            return Ok(None);
        };
        info!(user_id, invoice_id = %block.invoice_id, "chat denied by billing block");
        Ok(Some(BillingStatus {
            invoice_id: block.invoice_id,
            amount_usd: block.amount_usd,
            due_date: block.due_date,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cauce_storage::{BillingBlock, Invoice};
    use tempfile::tempdir;

    async fn setup() -> (BillingGate, Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (BillingGate::new(db.clone()), db, dir)
    }

    #[tokio::test]
    async fn user_without_block_is_clear() {
        let (gate, db, _dir) = setup().await;
        assert!(gate.check_billing_status("user-1").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn active_block_surfaces_invoice_details() {
        let (gate, db, _dir) = setup().await;
        let invoice = Invoice {
            id: "inv-1".to_string(),
            user_id: "user-1".to_string(),
            amount_usd: 85.5,
            due_date: "2026-02-01T00:00:00+00:00".to_string(),
            status: "overdue".to_string(),
            paid_at: None,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
        };
        billing::insert_invoice(&db, &invoice).await.unwrap();
        billing::insert_block(
            &db,
            &BillingBlock {
                id: "blk-1".to_string(),
                user_id: "user-1".to_string(),
                invoice_id: "inv-1".to_string(),
                blocked_at: "2026-02-10T00:00:00+00:00".to_string(),
                unblocked_at: None,
                created_at: "2026-02-10T00:00:00+00:00".to_string(),
            },
        )
        .await
        .unwrap();

        let status = gate.check_billing_status("user-1").await.unwrap().unwrap();
        assert_eq!(status.invoice_id, "inv-1");
        assert_eq!(status.amount_usd, 85.5);
        assert_eq!(status.due_date, "2026-02-01T00:00:00+00:00");

        // Paying the invoice closes the block; the gate clears.
        billing::close_blocks_for_invoice(&db, "inv-1", "2026-02-12T00:00:00+00:00")
            .await
            .unwrap();
        assert!(gate.check_billing_status("user-1").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
