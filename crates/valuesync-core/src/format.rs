//! Value formatting
//!
//! Renders field values the way the calculator widgets display them:
//! Norwegian kroner without decimals, year counts, or plain integers.

use serde::{Deserialize, Serialize};

/// Thousands separator used by Norwegian number formatting
const GROUP_SEPARATOR: char = '\u{a0}';

/// How a value is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// Norwegian kroner, whole units
    Currency,
    /// Number of years
    Duration,
    /// Decimal integer
    Plain,
}

impl FormatKind {
    /// Format an integer value
    pub fn format(self, value: i64) -> String {
        match self {
            FormatKind::Currency => format_currency(value),
            FormatKind::Duration => format!("{} år", value),
            FormatKind::Plain => value.to_string(),
        }
    }
}

/// Format a whole-kroner amount, e.g. `11 000 000 kr`
pub fn format_currency(value: i64) -> String {
    format!("{}{}kr", group_thousands(value), GROUP_SEPARATOR)
}

/// Format a fractional amount rounded to whole kroner
pub fn format_currency_f64(value: f64) -> String {
    if !value.is_finite() {
        return format_currency(0);
    }
    format_currency(value.round() as i64)
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(ch);
    }
    grouped
}
