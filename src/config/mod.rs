//! Config module.
//! Provides configuration types, default paths, XML loading, and the process-wide
//! configuration the handles consult (durability, metadata preservation, logging of
//! swallowed errors).

pub mod paths;
pub mod types;
pub mod xml;

use std::sync::OnceLock;

pub use paths::{CONFIG_ENV, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, Durability, LogLevel};
pub use xml::{load_config_from_env, load_config_from_xml_path, parse_config_xml};

static CONFIG: OnceLock<Config> = OnceLock::new();
static DEFAULT: OnceLock<Config> = OnceLock::new();

/// Install the process-wide configuration. Only the first call wins;
/// returns false if a configuration was already installed.
pub fn install(cfg: Config) -> bool {
    CONFIG.set(cfg).is_ok()
}

/// The installed configuration, or defaults if none was installed.
pub fn current() -> &'static Config {
    CONFIG
        .get()
        .unwrap_or_else(|| DEFAULT.get_or_init(Config::default))
}
