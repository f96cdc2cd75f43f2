//! Field catalogue
//!
//! The fixed set of quantities a calculator page can synchronise, with their
//! numeric domains, slider granularity, defaults and display formats.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::FieldError;
use crate::format::FormatKind;

/// A semantic quantity exchanged between calculator widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Desired property value (NOK)
    PropertyValue,
    /// Savings horizon in years
    TimeHorizon,
    /// Yearly income (NOK)
    Income,
    /// Equity (NOK)
    Equity,
    /// Existing debt (NOK)
    Debt,
}

impl Field {
    /// Every field, in catalogue order
    pub const ALL: [Field; 5] = [
        Field::PropertyValue,
        Field::TimeHorizon,
        Field::Income,
        Field::Equity,
        Field::Debt,
    ];

    /// Stable identifier used in configuration and host props
    pub fn id(self) -> &'static str {
        match self {
            Field::PropertyValue => "propertyValue",
            Field::TimeHorizon => "timeHorizon",
            Field::Income => "income",
            Field::Equity => "equity",
            Field::Debt => "debt",
        }
    }

    /// Channel naming fragment shared with the rest of the calculator suite
    pub fn channel_type(self) -> &'static str {
        match self {
            Field::PropertyValue => "property_value",
            Field::TimeHorizon => "time_horizon",
            Field::Income => "income",
            Field::Equity => "equity",
            Field::Debt => "debt",
        }
    }

    /// Message type carried by every update for this field
    pub fn message_type(self) -> String {
        format!("{}_value_change", self.channel_type())
    }

    /// Reverse of [`Field::message_type`]
    pub fn from_message_type(message_type: &str) -> Option<Field> {
        let channel = message_type.strip_suffix("_value_change")?;
        Field::ALL
            .into_iter()
            .find(|field| field.channel_type() == channel)
    }

    /// Static description of this field
    pub fn spec(self) -> &'static FieldSpec {
        match self {
            Field::PropertyValue => &PROPERTY_VALUE,
            Field::TimeHorizon => &TIME_HORIZON,
            Field::Income => &INCOME,
            Field::Equity => &EQUITY,
            Field::Debt => &DEBT,
        }
    }

    /// The field's full numeric domain
    pub fn domain(self) -> FieldDomain {
        self.spec().domain
    }

    /// Clamp a value into the field's domain
    pub fn clamp(self, value: i64) -> i64 {
        self.spec().domain.clamp(value)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Field {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.id() == s)
            .ok_or_else(|| FieldError::UnknownField { id: s.to_string() })
    }
}

/// Inclusive integer range with slider granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDomain {
    /// Lower bound
    pub min: i64,
    /// Upper bound
    pub max: i64,
    /// Slider step, measured from `min`
    pub step: i64,
}

impl FieldDomain {
    /// Create a domain, rejecting empty ranges and non-positive steps
    pub fn new(field: Field, min: i64, max: i64, step: i64) -> Result<Self, FieldError> {
        if min >= max {
            return Err(FieldError::InvalidRange {
                field: field.id().to_string(),
                reason: format!("min {} must be below max {}", min, max),
            });
        }
        if step <= 0 {
            return Err(FieldError::InvalidRange {
                field: field.id().to_string(),
                reason: format!("step {} must be positive", step),
            });
        }
        Ok(Self { min, max, step })
    }

    /// Clamp into `[min, max]`
    pub fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }

    /// Whether the value lies inside `[min, max]`
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Snap to the nearest step from `min`, then clamp.
    ///
    /// Ties round up, matching how a range input resolves a drag position.
    pub fn snap(&self, value: i64) -> i64 {
        let clamped = self.clamp(value);
        let offset = clamped - self.min;
        let steps = (offset + self.step / 2) / self.step;
        self.clamp(self.min + steps * self.step)
    }

    /// Whether `other` lies entirely inside this domain
    pub fn encloses(&self, other: &FieldDomain) -> bool {
        other.min >= self.min && other.max <= self.max
    }

    /// Position of `value` along the track, 0.0 to 100.0
    pub fn fill_percent(&self, value: i64) -> f64 {
        let span = (self.max - self.min) as f64;
        (self.clamp(value) - self.min) as f64 / span * 100.0
    }
}

/// Static description of a field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field this spec belongs to
    pub field: Field,
    /// Label shown above an input
    pub display_name: &'static str,
    /// Shorter name used in missing-input warnings
    pub short_name: &'static str,
    /// Numeric domain and granularity
    pub domain: FieldDomain,
    /// Value announced by a publisher that has not been moved yet
    pub default_value: i64,
    /// How values are rendered
    pub format: FormatKind,
}

static PROPERTY_VALUE: FieldSpec = FieldSpec {
    field: Field::PropertyValue,
    display_name: "Ønsket boligverdi",
    short_name: "Ønsket boligverdi",
    domain: FieldDomain {
        min: 1_000_000,
        max: 20_000_000,
        step: 100_000,
    },
    default_value: 11_000_000,
    format: FormatKind::Currency,
};

static TIME_HORIZON: FieldSpec = FieldSpec {
    field: Field::TimeHorizon,
    display_name: "Sparehorisont (år)",
    short_name: "Sparehorisont",
    domain: FieldDomain {
        min: 1,
        max: 10,
        step: 1,
    },
    default_value: 4,
    format: FormatKind::Duration,
};

static INCOME: FieldSpec = FieldSpec {
    field: Field::Income,
    display_name: "Årsinntekt",
    short_name: "Årsinntekt",
    domain: FieldDomain {
        min: 200_000,
        max: 3_000_000,
        step: 50_000,
    },
    default_value: 2_000_000,
    format: FormatKind::Currency,
};

static EQUITY: FieldSpec = FieldSpec {
    field: Field::Equity,
    display_name: "Egenkapital",
    short_name: "Egenkapital",
    domain: FieldDomain {
        min: 0,
        max: 10_000_000,
        step: 25_000,
    },
    default_value: 1_025_000,
    format: FormatKind::Currency,
};

static DEBT: FieldSpec = FieldSpec {
    field: Field::Debt,
    display_name: "Gjeld",
    short_name: "Gjeld",
    domain: FieldDomain {
        min: 0,
        max: 5_000_000,
        step: 25_000,
    },
    default_value: 300_000,
    format: FormatKind::Currency,
};
