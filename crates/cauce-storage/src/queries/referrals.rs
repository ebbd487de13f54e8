// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! IP referral CRUD operations.
//!
//! One row per IP (`ip_address` is UNIQUE). `upsert_referral` replaces an
//! expired record in place, so readers never have to disambiguate multiple
//! historical rows for the same IP.

use cauce_core::CauceError;
use rusqlite::params;

use crate::database::Database;
use crate::models::IpReferral;

fn row_to_referral(row: &rusqlite::Row<'_>) -> Result<IpReferral, rusqlite::Error> {
    Ok(IpReferral {
        id: row.get(0)?,
        ip_address: row.get(1)?,
        referred_at: row.get(2)?,
        blocked_at: row.get(3)?,
        blocked_until: row.get(4)?,
        attempts_after_referral: row.get(5)?,
        last_attempt_at: row.get(6)?,
        reason: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const SELECT_COLUMNS: &str = "id, ip_address, referred_at, blocked_at, blocked_until, \
     attempts_after_referral, last_attempt_at, reason, created_at";

/// Get the referral record for an IP, if one exists.
pub async fn get_referral_by_ip(
    db: &Database,
    ip: &str,
) -> Result<Option<IpReferral>, CauceError> {
    let ip = ip.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM ip_referrals WHERE ip_address = ?1"
            ))?;
            let result = stmt.query_row(params![ip], row_to_referral);
            match result {
                Ok(referral) => Ok(Some(referral)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a referral record by ID.
pub async fn get_referral(db: &Database, id: &str) -> Result<Option<IpReferral>, CauceError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM ip_referrals WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_referral);
            match result {
                Ok(referral) => Ok(Some(referral)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a referral record, or replace the existing record for the same IP.
///
/// The caller decides whether replacement is allowed (only when the previous
/// record's block has expired); this query just performs the upsert.
pub async fn upsert_referral(db: &Database, referral: &IpReferral) -> Result<(), CauceError> {
    let referral = referral.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO ip_referrals
                     (id, ip_address, referred_at, blocked_at, blocked_until,
                      attempts_after_referral, last_attempt_at, reason, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT (ip_address) DO UPDATE SET
                     id = excluded.id,
                     referred_at = excluded.referred_at,
                     blocked_at = excluded.blocked_at,
                     blocked_until = excluded.blocked_until,
                     attempts_after_referral = excluded.attempts_after_referral,
                     last_attempt_at = excluded.last_attempt_at,
                     reason = excluded.reason,
                     created_at = excluded.created_at",
                params![
                    referral.id,
                    referral.ip_address,
                    referral.referred_at,
                    referral.blocked_at,
                    referral.blocked_until,
                    referral.attempts_after_referral,
                    referral.last_attempt_at,
                    referral.reason,
                    referral.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set the block fields on a referral.
///
/// Writing the same `blocked_until` twice is harmless, which is what makes
/// the unsynchronized read-then-block race in the gate tolerable.
pub async fn set_block(
    db: &Database,
    id: &str,
    blocked_at: &str,
    blocked_until: &str,
) -> Result<(), CauceError> {
    let id = id.to_string();
    let blocked_at = blocked_at.to_string();
    let blocked_until = blocked_until.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE ip_referrals SET blocked_at = ?1, blocked_until = ?2 WHERE id = ?3",
                params![blocked_at, blocked_until, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Increment the post-referral attempt counter and stamp the attempt time.
pub async fn record_attempt(
    db: &Database,
    id: &str,
    attempted_at: &str,
) -> Result<(), CauceError> {
    let id = id.to_string();
    let attempted_at = attempted_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE ip_referrals
                 SET attempts_after_referral = attempts_after_referral + 1,
                     last_attempt_at = ?1
                 WHERE id = ?2",
                params![attempted_at, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_referral(ip: &str) -> IpReferral {
        IpReferral {
            id: uuid::Uuid::new_v4().to_string(),
            ip_address: ip.to_string(),
            referred_at: "2026-01-01T00:00:00+00:00".to_string(),
            blocked_at: None,
            blocked_until: None,
            attempts_after_referral: 0,
            last_attempt_at: None,
            reason: Some("derivación de prueba".to_string()),
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_and_get_by_ip_round_trips() {
        let (db, _dir) = setup_db().await;
        let referral = make_referral("203.0.113.7");

        upsert_referral(&db, &referral).await.unwrap();
        let retrieved = get_referral_by_ip(&db, "203.0.113.7").await.unwrap().unwrap();
        assert_eq!(retrieved.id, referral.id);
        assert_eq!(retrieved.attempts_after_referral, 0);
        assert_eq!(retrieved.reason.as_deref(), Some("derivación de prueba"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_unknown_ip_returns_none() {
        let (db, _dir) = setup_db().await;
        let result = get_referral_by_ip(&db, "198.51.100.1").await.unwrap();
        assert!(result.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_replaces_row_for_same_ip() {
        let (db, _dir) = setup_db().await;
        let first = make_referral("203.0.113.7");
        upsert_referral(&db, &first).await.unwrap();

        let mut second = make_referral("203.0.113.7");
        second.referred_at = "2026-06-01T00:00:00+00:00".to_string();
        upsert_referral(&db, &second).await.unwrap();

        let retrieved = get_referral_by_ip(&db, "203.0.113.7").await.unwrap().unwrap();
        assert_eq!(retrieved.id, second.id, "row should be replaced, not duplicated");
        assert_eq!(retrieved.referred_at, "2026-06-01T00:00:00+00:00");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn set_block_updates_block_fields() {
        let (db, _dir) = setup_db().await;
        let referral = make_referral("203.0.113.7");
        upsert_referral(&db, &referral).await.unwrap();

        set_block(
            &db,
            &referral.id,
            "2026-01-03T00:00:00+00:00",
            "2026-04-03T00:00:00+00:00",
        )
        .await
        .unwrap();

        let retrieved = get_referral(&db, &referral.id).await.unwrap().unwrap();
        assert_eq!(retrieved.blocked_at.as_deref(), Some("2026-01-03T00:00:00+00:00"));
        assert_eq!(
            retrieved.blocked_until.as_deref(),
            Some("2026-04-03T00:00:00+00:00")
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn record_attempt_increments_counter() {
        let (db, _dir) = setup_db().await;
        let referral = make_referral("203.0.113.7");
        upsert_referral(&db, &referral).await.unwrap();

        record_attempt(&db, &referral.id, "2026-01-02T10:00:00+00:00")
            .await
            .unwrap();
        record_attempt(&db, &referral.id, "2026-01-02T11:00:00+00:00")
            .await
            .unwrap();

        let retrieved = get_referral(&db, &referral.id).await.unwrap().unwrap();
        assert_eq!(retrieved.attempts_after_referral, 2);
        assert_eq!(
            retrieved.last_attempt_at.as_deref(),
            Some("2026-01-02T11:00:00+00:00")
        );

        db.close().await.unwrap();
    }
}
