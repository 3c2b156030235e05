//! Shared setup for integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn my_test() {
//!     common::init_tracing();
//!     // ... test code
//! }
//! ```
//!
//! Structural events (splits, merges, rotations) are only emitted when the crate is built with
//! the `tracing` feature:
//!
//! ```bash
//! RUST_LOG=two_four_tree=trace cargo test --features tracing -- --nocapture
//! ```

#![allow(dead_code)]

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Ensures tracing is only initialized once across all tests.
static INIT: Once = Once::new();

/// Initialize a console subscriber filtered by `RUST_LOG`.
///
/// Safe to call multiple times - only the first call takes effect.
pub fn init_tracing() {
    INIT.call_once(setup_tracing);
}

/// Create an `EnvFilter` from `RUST_LOG` or use the default level.
fn make_filter(default_level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("{default_level}")))
}

fn setup_tracing() {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_test_writer()
        .with_target(true)
        .with_line_number(true)
        .compact()
        .with_filter(make_filter(Level::WARN));

    // try_init: another test binary helper may already have installed a subscriber.
    let _ = Registry::default().with(console_layer).try_init();
}
