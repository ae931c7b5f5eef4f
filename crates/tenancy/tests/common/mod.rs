//! Test infrastructure for the tenancy layer.
//!
//! This module provides model fixtures and helpers shared by the integration
//! test binaries.

#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once per binary.
///
/// Set `RUST_LOG=helios_tenancy=debug` to see context changes and scope
/// installation while a test runs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
