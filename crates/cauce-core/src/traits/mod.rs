// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for pluggable Cauce components.

pub mod provider;

pub use provider::ProviderAdapter;
