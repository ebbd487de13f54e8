// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Cauce safety gateway.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed CRUD
//! operations for IP referrals, billing blocks, emergency logs, and token
//! usage.
//!
//! The single-writer pattern: [`Database`] wraps one
//! `tokio_rusqlite::Connection`; all query functions accept `&Database` and
//! run through `connection().call()`, which serializes closures on a single
//! background thread. Do not open additional connections for writes.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
