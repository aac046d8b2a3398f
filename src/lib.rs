// Re-export all modules to make them accessible to tests
pub mod config;
pub mod core;
pub mod models;
pub mod service;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

// This crate is a library that's also built as a binary.
// The binary entry point is in main.rs, while this file
// serves as the library entry point for tests and other crates
// that might want to use our functionality.

/// AmethystKey library
///
/// This library provides a multi-tenant secret store: per-bucket encryption
/// keys, encrypted secret storage with a database-backed durable copy and a
/// local file mirror, a background reconciliation engine, and bucket-scoped
/// token authentication with IP allow-listing.
pub struct AmethystKey;

impl AmethystKey {
    /// Get the version of the AmethystKey service
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

/// Initialize logging for the application
pub fn init_logging(log_level: &str) {
    // Configure the global tracing subscriber
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(fmt::layer()
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .with_target(true)
            .compact())
        .init();
}
