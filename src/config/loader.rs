use anyhow::{Context, Result, anyhow, bail};
use schemars::{Schema, schema_for};
use serde_valid::Validate;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

use super::models::Config;
use crate::utils::interpolation;

/// Load configuration from a string slice.
pub fn load_from_str(s: &str) -> Result<Config> {
    let cfg: Config =
        serde_json::from_str(s).context("Failed to parse JSON config string into Config")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<Config> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let bytes = fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;
    let cfg: Config = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON config from {}", path_ref.display()))?;
    validate_config(&cfg)?;
    debug!(target: "courtbook::config", "Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Generate the JSON Schema for the Config model.
pub fn generate_schema() -> Schema {
    schema_for!(Config)
}

/// Write the JSON Schema for the Config model to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}

/// Field-level rules (via `serde_valid`) plus cross-field checks:
/// - every template carries the placeholder it will be rendered with
/// - category and slot labels are not blank
/// - marker token lists do not overlap
pub fn validate_config(cfg: &Config) -> Result<()> {
    cfg.validate()
        .map_err(|errors| anyhow!("Invalid configuration: {errors}"))?;

    let s = &cfg.selectors;
    for (name, template, placeholder) in [
        ("selectors.day", &s.day, "day"),
        ("selectors.category", &s.category, "category"),
        ("selectors.slot", &s.slot, "slot"),
        ("selectors.section", &s.section, "index"),
    ] {
        if !interpolation::placeholders(template).any(|p| p == placeholder) {
            bail!("'{name}' must contain the {{{{{placeholder}}}}} placeholder");
        }
    }

    for (idx, category) in cfg.booking.categories.iter().enumerate() {
        if category.trim().is_empty() {
            bail!("booking.categories[{idx}] is blank");
        }
    }
    for (idx, slot) in cfg.booking.slot_candidates.iter().enumerate() {
        if slot.trim().is_empty() {
            bail!("booking.slot_candidates[{idx}] is blank");
        }
    }
    if cfg.booking.categories.len() > 2 {
        warn!(
            target: "courtbook::config",
            configured = cfg.booking.categories.len(),
            "Only the first two booking categories are used per attempt"
        );
    }

    if let Some(token) = s
        .unavailable_markers
        .iter()
        .find(|t| s.selected_markers.contains(t))
    {
        bail!("marker '{token}' is listed as both unavailable and selected");
    }

    Ok(())
}
