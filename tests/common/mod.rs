//! Common test utilities for the soundboard store.
//!
//! - `cli`: CLI runner with output verification and fluent assertions
//! - `env`: Locked environment variable overrides
//! - `fixtures`: Legacy profile trees, audio payloads and store snapshots
// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

pub mod fixtures;

use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
