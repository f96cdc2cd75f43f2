//! Configuration and settings management for ValueSync
//!
//! Supports JSON and TOML file formats. Configuration is organized into:
//! - Bus tuning (retry and announce delays, buffering, fallback)
//! - Input widget props, one entry per mounted slider
//! - Summary widget props, one entry per mounted summary

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use valuesync_core::{CalculatorGroup, Field, FieldDomain, FieldError, SummaryKind};

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Bus tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    /// Delay before a failed primary endpoint is reopened (ms)
    pub reconnect_delay_ms: u64,
    /// Delay before a publisher announces its value on join (ms)
    pub announce_delay_ms: u64,
    /// Frames buffered per receiver on the primary transport
    pub channel_capacity: usize,
    /// Propagate over the same-process fallback as well
    pub enable_fallback: bool,
    /// Consecutive reopen attempts before giving up; unlimited when absent
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 100,
            announce_delay_ms: 50,
            channel_capacity: 64,
            enable_fallback: true,
            max_reconnect_attempts: None,
        }
    }
}

/// Props the host supplies to an Input widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputProps {
    /// Field this input owns
    pub field: Field,
    /// Custom label; the field's display name when absent
    pub label: Option<String>,
    /// Whether the label is rendered
    pub show_label: bool,
    /// Lower bound override
    pub custom_min: Option<i64>,
    /// Upper bound override
    pub custom_max: Option<i64>,
    /// Step override
    pub custom_step: Option<i64>,
    /// Group the input synchronises within
    pub calculator_id: CalculatorGroup,
}

impl Default for InputProps {
    fn default() -> Self {
        Self {
            field: Field::PropertyValue,
            label: None,
            show_label: true,
            custom_min: None,
            custom_max: None,
            custom_step: None,
            calculator_id: CalculatorGroup::default(),
        }
    }
}

impl InputProps {
    /// Default props for `field` in `group`
    pub fn for_field(field: Field, group: &CalculatorGroup) -> Self {
        Self {
            field,
            calculator_id: group.clone(),
            ..Default::default()
        }
    }

    /// Effective slider range: overrides applied, confined to the field
    pub fn domain(&self) -> Result<FieldDomain, FieldError> {
        let base = self.field.domain();
        let domain = FieldDomain::new(
            self.field,
            self.custom_min.unwrap_or(base.min),
            self.custom_max.unwrap_or(base.max),
            self.custom_step.unwrap_or(base.step),
        )?;
        if !base.encloses(&domain) {
            return Err(FieldError::InvalidRange {
                field: self.field.id().to_string(),
                reason: format!(
                    "[{}, {}] exceeds domain [{}, {}]",
                    domain.min, domain.max, base.min, base.max
                ),
            });
        }
        Ok(domain)
    }

    /// Label to render
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|label| !label.is_empty())
            .unwrap_or(self.field.spec().display_name)
    }
}

/// Props the host supplies to a Summary widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryProps {
    /// Derived quantity shown
    pub summary_type: SummaryKind,
    /// Custom heading; the summary's display name when absent
    pub label: Option<String>,
    /// Whether the derivation text is rendered
    pub show_description: bool,
    /// Whether missing inputs are listed
    pub show_warnings: bool,
    /// Group the summary listens to
    pub calculator_id: CalculatorGroup,
    /// Colour of a complete result
    pub highlight_color: String,
}

impl Default for SummaryProps {
    fn default() -> Self {
        Self {
            summary_type: SummaryKind::LendingCapacity,
            label: None,
            show_description: true,
            show_warnings: true,
            calculator_id: CalculatorGroup::default(),
            highlight_color: "#007272".to_string(),
        }
    }
}

impl SummaryProps {
    /// Default props for `kind` in `group`
    pub fn for_kind(kind: SummaryKind, group: &CalculatorGroup) -> Self {
        Self {
            summary_type: kind,
            calculator_id: group.clone(),
            ..Default::default()
        }
    }

    /// Heading to render
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|label| !label.is_empty())
            .unwrap_or(self.summary_type.display_name())
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bus tuning
    pub bus: BusSettings,
    /// Input widgets to mount
    pub inputs: Vec<InputProps>,
    /// Summary widgets to mount
    pub summaries: Vec<SummaryProps>,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// A page with one input per field and one summary per kind in `group`
    pub fn full_page(group: &CalculatorGroup) -> Self {
        Self {
            bus: BusSettings::default(),
            inputs: Field::ALL
                .into_iter()
                .map(|field| InputProps::for_field(field, group))
                .collect(),
            summaries: SummaryKind::ALL
                .into_iter()
                .map(|kind| SummaryProps::for_kind(kind, group))
                .collect(),
        }
    }

    /// Default location: `<config dir>/valuesync/config.toml`
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("valuesync").join("config.toml"))
            .ok_or_else(|| ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }

    /// Load from `path`, or fall back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match Format::of(path)? {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.bus.reconnect_delay_ms == 0 {
            return Err(out_of_range("bus.reconnect_delay_ms", 0));
        }
        if self.bus.announce_delay_ms == 0 {
            return Err(out_of_range("bus.announce_delay_ms", 0));
        }
        if self.bus.channel_capacity == 0 {
            return Err(out_of_range("bus.channel_capacity", 0));
        }
        if self.bus.max_reconnect_attempts == Some(0) {
            return Err(out_of_range("bus.max_reconnect_attempts", 0));
        }

        for input in &self.inputs {
            input.domain()?;
        }

        Ok(())
    }
}

fn out_of_range(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}
