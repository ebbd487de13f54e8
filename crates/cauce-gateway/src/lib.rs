// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Cauce safety pipeline.
//!
//! Exposes the chat endpoint and its surrounding gates over axum:
//!
//! - `POST /v1/chat`: the orchestrated safety pipeline (auth, billing,
//!   rate limit, IP gate, risk check, anonymization, provider stream with
//!   marker removal).
//! - `POST /v1/referrals`: professional referral contact form.
//! - `GET /v1/ip-status`: block status for the caller's IP.
//! - `GET /health`: unauthenticated liveness probe.
//!
//! Gate denials are structured JSON with camelCase keys (the shape the web
//! client consumes); successful chat responses are chunked
//! `text/plain; charset=utf-8`.

pub mod auth;
pub mod chat;
pub mod client_ip;
pub mod handlers;
pub mod prompt;
pub mod server;

pub use server::{build_router, start_server, AppState, ChatSettings};
