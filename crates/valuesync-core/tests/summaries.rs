use valuesync_core::{format_currency_f64, Field, FieldValues, SummaryKind};

fn page(values: &[(Field, i64)]) -> FieldValues {
    values.iter().copied().collect()
}

fn evaluate_all(values: &FieldValues) -> Vec<Option<f64>> {
    SummaryKind::ALL
        .into_iter()
        .map(|kind| kind.evaluate(values).result)
        .collect()
}

#[test]
fn test_default_page_figures() {
    let values = page(&[
        (Field::PropertyValue, 11_000_000),
        (Field::TimeHorizon, 4),
        (Field::Income, 2_000_000),
        (Field::Equity, 1_025_000),
        (Field::Debt, 300_000),
    ]);

    assert_eq!(
        evaluate_all(&values),
        vec![
            Some(9_700_000.0),
            Some(10_250_000.0),
            Some(750_000.0),
            Some(15_625.0)
        ]
    );
}

#[test]
fn test_debt_beyond_income_floors_lending_at_zero() {
    let values = page(&[
        (Field::PropertyValue, 4_000_000),
        (Field::TimeHorizon, 2),
        (Field::Income, 200_000),
        (Field::Equity, 400_000),
        (Field::Debt, 5_000_000),
    ]);

    assert_eq!(
        evaluate_all(&values),
        vec![Some(0.0), Some(400_000.0), Some(3_600_000.0), Some(150_000.0)]
    );
}

#[test]
fn test_no_equity_means_no_buying_power() {
    let values = page(&[
        (Field::PropertyValue, 3_000_000),
        (Field::Income, 1_000_000),
        (Field::Equity, 0),
        (Field::Debt, 0),
    ]);

    assert_eq!(
        SummaryKind::TotalBuyingPower.evaluate(&values).result,
        Some(0.0)
    );
    assert_eq!(
        SummaryKind::SavingsNeeded.evaluate(&values).result,
        Some(3_000_000.0)
    );
}

#[test]
fn test_property_value_caps_buying_power() {
    let values = page(&[
        (Field::PropertyValue, 5_000_000),
        (Field::TimeHorizon, 10),
        (Field::Income, 3_000_000),
        (Field::Equity, 10_000_000),
        (Field::Debt, 0),
    ]);

    assert_eq!(
        evaluate_all(&values),
        vec![
            Some(15_000_000.0),
            Some(5_000_000.0),
            Some(0.0),
            Some(0.0)
        ]
    );
}

#[test]
fn test_received_zero_is_not_missing() {
    let values = page(&[(Field::Income, 1_000_000), (Field::Debt, 0)]);
    let outcome = SummaryKind::LendingCapacity.evaluate(&values);
    assert!(outcome.is_complete());
    assert_eq!(outcome.result, Some(5_000_000.0));
}

#[test]
fn test_missing_fields_follow_required_order() {
    let values = page(&[(Field::Debt, 100_000)]);

    let outcome = SummaryKind::MonthlySavings.evaluate(&values);
    assert_eq!(outcome.result, None);
    assert_eq!(
        outcome.missing,
        vec![
            Field::PropertyValue,
            Field::Income,
            Field::Equity,
            Field::TimeHorizon
        ]
    );

    let outcome = SummaryKind::LendingCapacity.evaluate(&values);
    assert_eq!(outcome.missing, vec![Field::Income]);
}

#[test]
fn test_fractional_monthly_savings_round_when_formatted() {
    let values = page(&[
        (Field::PropertyValue, 11_000_000),
        (Field::TimeHorizon, 7),
        (Field::Income, 2_000_000),
        (Field::Equity, 1_025_000),
        (Field::Debt, 300_000),
    ]);

    let monthly = SummaryKind::MonthlySavings
        .evaluate(&values)
        .result
        .expect("complete");
    assert!((monthly - 750_000.0 / 84.0).abs() < 1e-9);
    assert_eq!(format_currency_f64(monthly), "8\u{a0}929\u{a0}kr");
}
