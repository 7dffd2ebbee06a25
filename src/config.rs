//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/regview/config.toml`
//! 3. Environment variables: `REGVIEW_*` prefix

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Tool settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Destination for offline exports when `--output` is not given
    pub default_output: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_output: PathBuf::from("registry_output.json"),
        }
    }
}

/// Path of the global config file, if a home directory can be determined.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "regview").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load settings from all layers.
pub fn load() -> Result<Settings, ConfigError> {
    let mut builder =
        Config::builder().set_default("default_output", "registry_output.json")?;
    if let Some(path) = global_config_path() {
        builder = builder.add_source(File::from(path).required(false));
    }
    builder = builder.add_source(Environment::with_prefix("REGVIEW"));
    builder.build()?.try_deserialize()
}

/// Parse settings from a TOML string layered over the defaults.
pub fn load_from_str(toml_text: &str) -> Result<Settings, ConfigError> {
    Config::builder()
        .set_default("default_output", "registry_output.json")?
        .add_source(File::from_str(toml_text, FileFormat::Toml))
        .build()?
        .try_deserialize()
}
