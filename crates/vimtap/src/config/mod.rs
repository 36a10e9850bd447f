//! Configuration module for vimtap.
//!
//! Handles loading and validating configuration from:
//! - Default values
//! - Config file (~/.config/vimtap/config.toml)
//! - Environment variables (`VIMTAP_CONFIG_DIR`)
//! - Command-line arguments (`--config`, `--no-introspection`)

mod schema;

pub use schema::{ChordConfig, Config, FieldConfig, NormalConfig, TimingConfig};

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Returns the config directory path.
///
/// Checks `VIMTAP_CONFIG_DIR` environment variable first, then falls back
/// to the system default (~/.config/vimtap on Linux/macOS).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("VIMTAP_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|p| p.join("vimtap"))
}

/// Returns the default config file path (~/.config/vimtap/config.toml)
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Load configuration from the default path or return defaults
pub fn load_config() -> Result<Config> {
    if let Some(path) = config_path() {
        if path.exists() {
            return load_config_from(&path);
        }
    }
    Ok(Config::default())
}

/// Load configuration from a specific path
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    validate(&config)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(config)
}

/// Check the invariants serde cannot express.
pub fn validate(config: &Config) -> Result<()> {
    for chord in &config.chords {
        if chord.sequence.chars().count() != 2 {
            bail!(
                "chord {:?} must be exactly two keys long",
                chord.sequence
            );
        }
        if chord.timeout_ms == 0 {
            bail!("chord {:?} has a zero timeout", chord.sequence);
        }
        if chord.target.is_insert() {
            bail!("chord {:?} cannot target insert mode", chord.sequence);
        }
    }
    if config.timing.reply_timeout_ms == 0 {
        bail!("timing.reply_timeout_ms must be greater than zero");
    }
    if config.normal.max_count == 0 {
        bail!("normal.max_count must be greater than zero");
    }
    if config.start_mode.is_visual() {
        bail!("start_mode must be \"normal\" or \"insert\"");
    }
    Ok(())
}
