// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Emergency log persistence.
//!
//! Rows are written when the risk detector triggers a lockdown. The trigger
//! message must already be anonymized by the caller; this module never sees
//! raw PII.

use cauce_core::CauceError;
use rusqlite::params;

use crate::database::Database;
use crate::models::EmergencyLog;

/// Persist an emergency log entry.
pub async fn insert_emergency_log(db: &Database, log: &EmergencyLog) -> Result<(), CauceError> {
    let log = log.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO emergency_logs
                     (id, user_id, trigger_message, detected_keywords, risk_level,
                      lockdown_activated, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    log.id,
                    log.user_id,
                    log.trigger_message,
                    log.detected_keywords,
                    log.risk_level,
                    log.lockdown_activated,
                    log.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List emergency logs, newest first.
pub async fn list_emergency_logs(
    db: &Database,
    limit: u32,
) -> Result<Vec<EmergencyLog>, CauceError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, trigger_message, detected_keywords, risk_level,
                        lockdown_activated, created_at
                 FROM emergency_logs
                 ORDER BY created_at DESC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(EmergencyLog {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    trigger_message: row.get(2)?,
                    detected_keywords: row.get(3)?,
                    risk_level: row.get(4)?,
                    lockdown_activated: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?;
            let mut logs = Vec::new();
            for row in rows {
                logs.push(row?);
            }
            Ok(logs)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
