//! Summary aggregation
//!
//! Derived quantities computed from the latest known field values. Every
//! derivation is a pure function; callers re-evaluate on each bus update.
//!
//! A field that has never been received is `None`, which is distinct from a
//! received zero. A summary with any required field missing has no result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::FieldError;
use crate::field::Field;

/// Latest known value per field; `None` until a publisher has emitted one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    values: BTreeMap<Field, i64>,
}

impl FieldValues {
    /// All fields unknown
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `field`
    pub fn get(&self, field: Field) -> Option<i64> {
        self.values.get(&field).copied()
    }

    /// Overwrite the cached value; returns whether the state changed
    pub fn set(&mut self, field: Field, value: i64) -> bool {
        self.values.insert(field, value) != Some(value)
    }

    /// Forget a field
    pub fn clear(&mut self, field: Field) {
        self.values.remove(&field);
    }

    /// Fields from `required` that have no value yet, in the given order
    pub fn missing(&self, required: &[Field]) -> Vec<Field> {
        required
            .iter()
            .copied()
            .filter(|field| !self.values.contains_key(field))
            .collect()
    }
}

impl FromIterator<(Field, i64)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (Field, i64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Result of evaluating a summary
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOutcome {
    /// Derived value; `None` whenever `missing` is non-empty
    pub result: Option<f64>,
    /// Required fields without a value
    pub missing: Vec<Field>,
}

impl SummaryOutcome {
    /// Whether every required input was present
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Yearly income multiplier used for lending capacity
pub const INCOME_MULTIPLIER: i64 = 5;

/// Equity multiplier capping the purchasable property value
pub const EQUITY_MULTIPLIER: i64 = 10;

/// `max(0, income × 5 − debt)`
pub fn lending_capacity(income: i64, debt: i64) -> i64 {
    (income * INCOME_MULTIPLIER - debt).max(0)
}

/// `min(lendingCapacity + equity, min(equity × 10, propertyValue))`
pub fn total_buying_power(income: i64, debt: i64, equity: i64, property_value: i64) -> i64 {
    let by_income = lending_capacity(income, debt) + equity;
    let by_equity = (equity * EQUITY_MULTIPLIER).min(property_value);
    by_income.min(by_equity)
}

/// `max(0, propertyValue − totalBuyingPower)`
pub fn savings_needed(income: i64, debt: i64, equity: i64, property_value: i64) -> i64 {
    (property_value - total_buying_power(income, debt, equity, property_value)).max(0)
}

/// `savingsNeeded / (timeHorizon × 12)`, or 0 for a non-positive horizon
pub fn monthly_savings(
    income: i64,
    debt: i64,
    equity: i64,
    property_value: i64,
    time_horizon: i64,
) -> f64 {
    if time_horizon <= 0 {
        return 0.0;
    }
    savings_needed(income, debt, equity, property_value) as f64 / (time_horizon * 12) as f64
}

/// The fixed set of derived quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SummaryKind {
    /// Maximum loan from income and debt
    LendingCapacity,
    /// Purchasable property value
    TotalBuyingPower,
    /// Gap between desired and purchasable value
    SavingsNeeded,
    /// Savings gap spread over the horizon
    MonthlySavings,
}

impl SummaryKind {
    /// Every summary kind
    pub const ALL: [SummaryKind; 4] = [
        SummaryKind::LendingCapacity,
        SummaryKind::TotalBuyingPower,
        SummaryKind::SavingsNeeded,
        SummaryKind::MonthlySavings,
    ];

    /// Stable identifier used in configuration
    pub fn id(self) -> &'static str {
        match self {
            SummaryKind::LendingCapacity => "lendingCapacity",
            SummaryKind::TotalBuyingPower => "totalBuyingPower",
            SummaryKind::SavingsNeeded => "savingsNeeded",
            SummaryKind::MonthlySavings => "monthlySavings",
        }
    }

    /// Heading shown by a summary widget
    pub fn display_name(self) -> &'static str {
        match self {
            SummaryKind::LendingCapacity => "Lånekapasitet",
            SummaryKind::TotalBuyingPower => "Total kjøpekraft",
            SummaryKind::SavingsNeeded => "Sparing som trengs",
            SummaryKind::MonthlySavings => "Månedlig sparing",
        }
    }

    /// One-line explanation of the derivation
    pub fn description(self) -> &'static str {
        match self {
            SummaryKind::LendingCapacity => "Beregnet som (årsinntekt × 5) - gjeld",
            SummaryKind::TotalBuyingPower => {
                "Lånekapasitet + egenkapital (begrenset av boligverdi)"
            }
            SummaryKind::SavingsNeeded => "Ønsket boligverdi - total kjøpekraft",
            SummaryKind::MonthlySavings => "Sparebeløp fordelt på måneder",
        }
    }

    /// Fields this summary needs before it has a result
    pub fn required_fields(self) -> &'static [Field] {
        match self {
            SummaryKind::LendingCapacity => &[Field::Income, Field::Debt],
            SummaryKind::TotalBuyingPower => &[
                Field::Income,
                Field::Debt,
                Field::Equity,
                Field::PropertyValue,
            ],
            SummaryKind::SavingsNeeded => &[
                Field::PropertyValue,
                Field::Income,
                Field::Debt,
                Field::Equity,
            ],
            SummaryKind::MonthlySavings => &[
                Field::PropertyValue,
                Field::Income,
                Field::Debt,
                Field::Equity,
                Field::TimeHorizon,
            ],
        }
    }

    /// Evaluate against the current values
    pub fn evaluate(self, values: &FieldValues) -> SummaryOutcome {
        let missing = values.missing(self.required_fields());
        if !missing.is_empty() {
            return SummaryOutcome {
                result: None,
                missing,
            };
        }

        let get = |field| values.get(field).unwrap_or_default();
        let income = get(Field::Income);
        let debt = get(Field::Debt);
        let equity = get(Field::Equity);
        let property_value = get(Field::PropertyValue);

        let result = match self {
            SummaryKind::LendingCapacity => lending_capacity(income, debt) as f64,
            SummaryKind::TotalBuyingPower => {
                total_buying_power(income, debt, equity, property_value) as f64
            }
            SummaryKind::SavingsNeeded => {
                savings_needed(income, debt, equity, property_value) as f64
            }
            SummaryKind::MonthlySavings => monthly_savings(
                income,
                debt,
                equity,
                property_value,
                get(Field::TimeHorizon),
            ),
        };

        SummaryOutcome {
            result: Some(result),
            missing,
        }
    }
}

impl std::fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for SummaryKind {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SummaryKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| FieldError::UnknownSummary { id: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reference_values() -> FieldValues {
        [
            (Field::Income, 2_000_000),
            (Field::Debt, 300_000),
            (Field::Equity, 1_025_000),
            (Field::PropertyValue, 11_000_000),
            (Field::TimeHorizon, 4),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_reference_scenario() {
        let values = reference_values();
        let eval = |kind: SummaryKind| kind.evaluate(&values).result;

        assert_eq!(eval(SummaryKind::LendingCapacity), Some(9_700_000.0));
        assert_eq!(eval(SummaryKind::TotalBuyingPower), Some(10_250_000.0));
        assert_eq!(eval(SummaryKind::SavingsNeeded), Some(750_000.0));
        assert_eq!(eval(SummaryKind::MonthlySavings), Some(15_625.0));
    }

    #[test]
    fn test_missing_fields() {
        let values: FieldValues = [(Field::Income, 2_000_000)].into_iter().collect();

        let outcome = SummaryKind::LendingCapacity.evaluate(&values);
        assert_eq!(outcome.result, None);
        assert_eq!(outcome.missing, vec![Field::Debt]);
        assert!(!outcome.is_complete());

        let outcome = SummaryKind::MonthlySavings.evaluate(&FieldValues::new());
        assert_eq!(
            outcome.missing,
            SummaryKind::MonthlySavings.required_fields().to_vec()
        );
    }

    #[test]
    fn test_zero_is_not_missing() {
        let values: FieldValues = [(Field::Income, 200_000), (Field::Debt, 0)]
            .into_iter()
            .collect();
        let outcome = SummaryKind::LendingCapacity.evaluate(&values);
        assert!(outcome.is_complete());
        assert_eq!(outcome.result, Some(1_000_000.0));
    }

    #[test]
    fn test_lending_capacity_floor() {
        assert_eq!(lending_capacity(200_000, 5_000_000), 0);
    }

    #[test]
    fn test_monthly_savings_zero_horizon() {
        assert_eq!(monthly_savings(200_000, 0, 0, 20_000_000, 0), 0.0);
    }

    #[test]
    fn test_field_values_set_reports_change() {
        let mut values = FieldValues::new();
        assert!(values.set(Field::Debt, 0));
        assert!(!values.set(Field::Debt, 0));
        assert!(values.set(Field::Debt, 25_000));
        values.clear(Field::Debt);
        assert_eq!(values.get(Field::Debt), None);
    }

    #[test]
    fn test_summary_ids() {
        for kind in SummaryKind::ALL {
            assert_eq!(kind.id().parse::<SummaryKind>(), Ok(kind));
        }
        assert!("netWorth".parse::<SummaryKind>().is_err());
    }

    proptest! {
        #[test]
        fn savings_never_negative(
            income in 200_000i64..=3_000_000,
            debt in 0i64..=5_000_000,
            equity in 0i64..=10_000_000,
            property in 1_000_000i64..=20_000_000,
        ) {
            let power = total_buying_power(income, debt, equity, property);
            prop_assert!(power <= property);
            let needed = savings_needed(income, debt, equity, property);
            prop_assert!(needed >= 0);
            prop_assert_eq!(needed, (property - power).max(0));
        }
    }
}
