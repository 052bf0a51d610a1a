#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Courtbook: drives a court-reservation website through a remote browser to book
//! a slot a fixed number of days ahead.
//!
//! Modules, from the bottom up:
//! - `surface`: the remote page contract, its Chromium implementation, and errors.
//! - `executor`: single verified steps with retries, and the slot availability gate.
//! - `booking`: the wizard state machine and the bounded attempt controller.
//! - `auth`: one-time sign-in.
//! - `config`: configuration models, loader, and schema helpers.
//! - `utils`: locator interpolation and settle delays.
//!
//! Use `courtbook::prelude::*` to bring commonly used items into scope quickly.

/// Public module: account sign-in.
pub mod auth;
/// Public module: booking workflow (request, outcome, orchestrator, controller).
pub mod booking;
/// Public module: configuration (models, loader, schema helpers).
pub mod config;
/// Public module: step execution and availability checks.
pub mod executor;
/// Public module: remote page contract and drivers.
pub mod surface;
/// Public module: utilities (interpolation, delays).
pub mod utils;

use std::path::Path;
use tracing::Level;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse a level name (trace|debug|info|warn|error).
pub fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging) with a reasonable default.
/// - Honors the `RUST_LOG` environment variable if set.
/// - Falls back to `info` level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| parse_level(&s))
        .unwrap_or(Level::INFO);

    // Ignore the error if the global subscriber was already set.
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}

/// Initialize tracing at `level`, writing to `log_file` (appended, no ANSI colors)
/// when given and to stderr otherwise.
pub fn init_tracing_with(level: Level, log_file: Option<&Path>) -> anyhow::Result<()> {
    use anyhow::Context;
    use std::sync::Mutex;

    let builder = tracing_subscriber::fmt().with_max_level(level);
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.try_init();
        }
    }
    Ok(())
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use courtbook::prelude::*;`
pub mod prelude {
    // Common result/error handling
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};

    // Serialization
    pub use serde::{Deserialize, Serialize};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    // Timing helpers
    pub use std::time::Duration;
    pub use tokio::time::sleep;

    pub use crate as courtbook;
    pub use crate::auth::{Credentials, authenticate};
    pub use crate::booking::{BookingOutcome, BookingRequest, RunController, RunReport};
    pub use crate::config::Config;
    pub use crate::surface::{ChromiumSurface, RemoteSurface, SurfaceError};

    // Frequently used internal modules
    pub use crate::{auth, booking, config, executor, surface, utils};
}
