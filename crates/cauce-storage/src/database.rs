// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use cauce_core::CauceError;
use tracing::debug;

/// Handle to the SQLite database.
///
/// Cloning is cheap: clones share the same background connection thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, CauceError> {
        // Migrations run on a short-lived blocking connection so refinery
        // errors are not forced through the rusqlite error type.
        let migration_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), CauceError> {
            let mut conn = rusqlite::Connection::open(&migration_path)
                .map_err(|e| CauceError::Storage { source: Box::new(e) })?;
            crate::migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| CauceError::Internal(format!("migration task panicked: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| CauceError::Storage { source: Box::new(e) })?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and flush pending writes.
    pub async fn close(&self) -> Result<(), CauceError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the crate error type.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> CauceError {
    CauceError::Storage {
        source: Box::new(e),
    }
}
