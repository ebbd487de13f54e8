// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Cauce integration tests.
//!
//! Provides a mock provider adapter for fast, deterministic, CI-runnable
//! tests without external API calls.

pub mod mock_provider;

pub use mock_provider::MockProvider;
