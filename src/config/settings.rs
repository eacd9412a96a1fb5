//! TOML-based configuration for folio.
//!
//! Supports a config file (folio.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [store]
//! path = ".database/db.json"
//!
//! [database]
//! driver = "sqlite"
//! path = "${REPORTS_DB}"
//!
//! [render]
//! instruction_limit = 1000000
//! memory_limit_bytes = 67108864
//!
//! [print]
//! char_width_mm = 1.9
//! line_height_mm = 4.5
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::connection::{ConnectionConfig, Driver};
use crate::render::RenderLimits;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Catalog document location.
    pub store: StoreSettings,

    /// Database the report queries run against.
    pub database: DatabaseSettings,

    /// Renderer sandbox limits.
    pub render: RenderSettings,

    /// Print measurement parameters.
    pub print: PrintSettings,
}

/// Catalog store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path of the JSON catalog (supports ${ENV_VAR} expansion).
    pub path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: ".database/db.json".to_string(),
        }
    }
}

impl StoreSettings {
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        Ok(PathBuf::from(expand_env_vars(&self.path)?))
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database driver (sqlite).
    pub driver: String,

    /// Database file, or `:memory:` (supports ${ENV_VAR} expansion).
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            driver: "sqlite".to_string(),
            path: ":memory:".to_string(),
        }
    }
}

impl DatabaseSettings {
    /// Get the driver type.
    pub fn driver_type(&self) -> Result<Driver, SettingsError> {
        Driver::from_str(&self.driver)
            .map_err(|_| SettingsError::UnsupportedDriver(self.driver.clone()))
    }

    /// Resolve into a connection config with environment variables expanded.
    pub fn connection(&self) -> Result<ConnectionConfig, SettingsError> {
        Ok(ConnectionConfig {
            driver: self.driver_type()?,
            path: expand_env_vars(&self.path)?,
        })
    }
}

/// Renderer sandbox limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Lua instructions a single renderer call may execute.
    pub instruction_limit: u64,

    /// Memory cap of the renderer state in bytes.
    pub memory_limit_bytes: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        let limits = RenderLimits::default();
        Self {
            instruction_limit: limits.instruction_limit,
            memory_limit_bytes: limits.memory_limit_bytes,
        }
    }
}

impl RenderSettings {
    pub fn limits(&self) -> RenderLimits {
        RenderLimits {
            instruction_limit: self.instruction_limit,
            memory_limit_bytes: self.memory_limit_bytes,
        }
    }
}

/// Parameters of the text row-height measurer, in millimetres.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrintSettings {
    /// Average advance of one narrow character.
    pub char_width_mm: f64,

    pub line_height_mm: f64,

    /// Inner padding of every cell, applied on each side.
    pub cell_padding_mm: f64,

    /// Report title band at the top of every sheet.
    pub title_band_mm: f64,

    /// Page-number band at the bottom of every sheet.
    pub footer_band_mm: f64,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            char_width_mm: 1.9,
            line_height_mm: 4.5,
            cell_padding_mm: 1.0,
            title_band_mm: 10.0,
            footer_band_mm: 6.0,
        }
    }
}

impl PrintSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let fields = [
            ("char_width_mm", self.char_width_mm),
            ("line_height_mm", self.line_height_mm),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::InvalidConfig(format!(
                    "print.{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.print.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `FOLIO_CONFIG`
    /// 2. `./folio.toml`
    /// 3. `~/.config/folio/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("FOLIO_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("folio.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("folio").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut var_name = String::new();
        while let Some(&ch) = chars.peek() {
            if braced && ch == '}' {
                chars.next();
                break;
            }
            if !braced && !(ch.is_alphanumeric() || ch == '_') {
                break;
            }
            var_name.push(ch);
            chars.next();
        }

        if var_name.is_empty() && !braced {
            // Lone $, keep it
            result.push('$');
            continue;
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
