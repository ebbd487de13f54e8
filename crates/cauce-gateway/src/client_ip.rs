// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client IP extraction from forwarding headers.
//!
//! `x-forwarded-for` (first hop) wins, then `x-real-ip`, then a fixed
//! fallback. Headers are client-controlled unless a trusted reverse proxy
//! overwrites them, so the extracted IP keys best-effort gates only.

use axum::http::HeaderMap;

/// Fallback when no forwarding header is present.
pub const UNKNOWN_IP: &str = "0.0.0.0";

/// Resolve the client IP from request headers.
pub fn extract_client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }
    UNKNOWN_IP.to_string()
}
