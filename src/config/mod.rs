//! Configuration module for courtbook.
//!
//! This module wires together the data models and loading/validation helpers used
//! throughout the crate. Import from here for a convenient, stable API.
//!
//! Example:
//! use courtbook::config::{Config, load_from_path_async};
//!
//! let cfg = load_from_path_async("config/default.json").await?;

pub mod loader;
pub mod models;

// Re-export core data models
pub use models::{
    BookingConfig, Config, CredentialsConfig, DriverConfig, Selectors, SiteConfig, Timing,
};

// Re-export loader utilities
pub use loader::{
    generate_schema, load_from_path_async, load_from_str, validate_config, write_schema_to_writer,
};
