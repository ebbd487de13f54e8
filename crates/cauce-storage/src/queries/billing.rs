// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice and billing-block queries.
//!
//! A billing block is active while `unblocked_at` is null. The chat gate only
//! needs the active block joined to its invoice's display fields.

use cauce_core::CauceError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{BillingBlock, Invoice};

/// Active billing block joined to its invoice, as the chat gate consumes it.
#[derive(Debug, Clone)]
pub struct ActiveBlock {
    pub block_id: String,
    pub invoice_id: String,
    pub amount_usd: f64,
    pub due_date: String,
}

/// Find the active billing block for a user, joined to invoice details.
///
/// Returns the most recently created active block if more than one exists.
pub async fn get_active_block(
    db: &Database,
    user_id: &str,
) -> Result<Option<ActiveBlock>, CauceError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT b.id, b.invoice_id, i.amount_usd, i.due_date
                 FROM billing_blocks b
                 JOIN invoices i ON i.id = b.invoice_id
                 WHERE b.user_id = ?1 AND b.unblocked_at IS NULL
                 ORDER BY b.created_at DESC
                 LIMIT 1",
            )?;
            let result = stmt.query_row(params![user_id], |row| {
                Ok(ActiveBlock {
                    block_id: row.get(0)?,
                    invoice_id: row.get(1)?,
                    amount_usd: row.get(2)?,
                    due_date: row.get(3)?,
                })
            });
            match result {
                Ok(block) => Ok(Some(block)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert an invoice row.
pub async fn insert_invoice(db: &Database, invoice: &Invoice) -> Result<(), CauceError> {
    let invoice = invoice.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO invoices (id, user_id, amount_usd, due_date, status, paid_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    invoice.id,
                    invoice.user_id,
                    invoice.amount_usd,
                    invoice.due_date,
                    invoice.status,
                    invoice.paid_at,
                    invoice.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Open a billing block against an invoice.
pub async fn insert_block(db: &Database, block: &BillingBlock) -> Result<(), CauceError> {
    let block = block.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO billing_blocks (id, user_id, invoice_id, blocked_at, unblocked_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    block.id,
                    block.user_id,
                    block.invoice_id,
                    block.blocked_at,
                    block.unblocked_at,
                    block.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Close every open block for an invoice, stamping `unblocked_at`.
///
/// Returns how many blocks were closed.
pub async fn close_blocks_for_invoice(
    db: &Database,
    invoice_id: &str,
    unblocked_at: &str,
) -> Result<usize, CauceError> {
    let invoice_id = invoice_id.to_string();
    let unblocked_at = unblocked_at.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE billing_blocks SET unblocked_at = ?1
                 WHERE invoice_id = ?2 AND unblocked_at IS NULL",
                params![unblocked_at, invoice_id],
            )?;
            Ok(changed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
