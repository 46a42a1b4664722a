//! XML configuration support.
//! - Loads settings from config.xml (quick_xml).
//! - Unknown XML fields are rejected so misconfigurations surface early.
//!
//! Example:
//! ```xml
//! <config>
//!   <log_level>debug</log_level>
//!   <durability>data</durability>
//!   <preserve_metadata>false</preserve_metadata>
//! </config>
//! ```

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::paths::default_config_path;
use super::types::{Config, Durability, LogLevel};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(rename = "log_level")]
    log_level: Option<String>,
    #[serde(rename = "log_file")]
    log_file: Option<String>,
    #[serde(rename = "json_logs", default, deserialize_with = "de_bool_trimmed_opt")]
    json_logs: Option<bool>,
    #[serde(rename = "durability")]
    durability: Option<String>,
    #[serde(rename = "preserve_metadata", default, deserialize_with = "de_bool_trimmed_opt")]
    preserve_metadata: Option<bool>,
    #[serde(
        rename = "log_convenience_failures",
        default,
        deserialize_with = "de_bool_trimmed_opt"
    )]
    log_convenience_failures: Option<bool>,
}

// Accept "true"/"false" with surrounding whitespace; anything else is treated as absent.
fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }))
}

// Map XmlConfig -> Config; absent or unparsable values keep their defaults.
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();

    if let Some(level) = parsed
        .log_level
        .as_deref()
        .and_then(|s| s.trim().parse::<LogLevel>().ok())
    {
        cfg.log_level = level;
    }
    if let Some(s) = parsed.log_file.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            cfg.log_file = Some(PathBuf::from(trimmed));
        }
    }
    if let Some(mode) = parsed
        .durability
        .as_deref()
        .and_then(|s| s.parse::<Durability>().ok())
    {
        cfg.durability = mode;
    }
    if let Some(v) = parsed.json_logs {
        cfg.json_logs = v;
    }
    if let Some(v) = parsed.preserve_metadata {
        cfg.preserve_metadata = v;
    }
    if let Some(v) = parsed.log_convenience_failures {
        cfg.log_convenience_failures = v;
    }
    cfg
}

/// Parse a Config from XML text.
pub fn parse_config_xml(contents: &str) -> Result<Config> {
    let parsed: XmlConfig = from_xml_str(contents).context("parse config xml")?;
    Ok(xml_to_config(parsed))
}

/// Load a Config from a specific XML file path (quick_xml).
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    Ok(xml_to_config(parsed))
}

/// Load the config from $FS_HANDLES_CONFIG or the platform default path.
/// Returns Ok(None) if no config file exists there.
pub fn load_config_from_env() -> Result<Option<Config>> {
    let Some(path) = default_config_path() else {
        debug!("no config directory available; using defaults");
        return Ok(None);
    };
    if !path.exists() {
        debug!(path = %path.display(), "config file not present; using defaults");
        return Ok(None);
    }
    let cfg = load_config_from_xml_path(&path)?;
    debug!(path = %path.display(), "loaded config");
    Ok(Some(cfg))
}
