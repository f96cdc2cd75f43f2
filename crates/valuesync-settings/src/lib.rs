//! ValueSync Settings Crate
//!
//! Handles bus tuning and calculator page layout configuration.

pub mod config;
pub mod error;

pub use config::{BusSettings, Config, InputProps, SummaryProps};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
