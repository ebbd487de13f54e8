// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token usage accounting, written once per completed stream.

use cauce_core::CauceError;
use rusqlite::params;

use crate::database::Database;
use crate::models::UsageRecord;

/// Persist a usage record.
pub async fn insert_usage(db: &Database, record: &UsageRecord) -> Result<(), CauceError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO usage_log (id, user_id, ip_address, input_tokens, output_tokens, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.user_id,
                    record.ip_address,
                    record.input_tokens,
                    record.output_tokens,
                    record.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Sum token usage for an IP, for operational inspection.
pub async fn usage_totals_for_ip(
    db: &Database,
    ip: &str,
) -> Result<(i64, i64), CauceError> {
    let ip = ip.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(input_tokens), 0), COALESCE(SUM(output_tokens), 0)
                 FROM usage_log WHERE ip_address = ?1",
                params![ip],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}
