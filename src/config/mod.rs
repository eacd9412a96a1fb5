//! Configuration module for folio.
//!
//! Handles the config file, database connection settings, and environment
//! variable expansion.

mod connection;
mod settings;

pub use connection::{ConnectionConfig, ConnectionError, Driver};
pub use settings::{
    expand_env_vars, DatabaseSettings, PrintSettings, RenderSettings, Settings, SettingsError,
    StoreSettings,
};
