pub mod config;
pub mod emitter;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod server;
pub mod signals;
pub mod store;
pub mod transform;
pub mod validator;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging
///
/// `RUST_LOG` takes precedence over `level`. `format` is `json` or anything
/// else for human-readable text.
///
/// Note: This function can only be called once.
pub fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if format == "json" {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}
