//! Calculator pages built from independent widgets.

use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use valuesync_bus::{BroadcastHub, BusConfig, EventTarget, ValueSyncBus};
use valuesync_core::{CalculatorGroup, Field, SummaryKind, SummaryOutcome};
use valuesync_settings::{Config, InputProps, SummaryProps};
use valuesync_widgets::{InputWidget, Page, SummaryWidget, MUTED_COLOR};

fn fast_config() -> BusConfig {
    BusConfig {
        announce_delay: Duration::from_millis(10),
        reconnect_delay: Duration::from_millis(10),
        ..Default::default()
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(60)).await;
}

fn amount(page: &Page, kind: SummaryKind) -> String {
    page.summary(kind, &CalculatorGroup::default())
        .expect("summary mounted")
        .view()
        .amount_text
}

#[tokio::test]
async fn test_default_page_converges_on_reference_figures() {
    let bus = ValueSyncBus::with_config(fast_config());
    let page = Page::mount(&bus, &Config::full_page(&CalculatorGroup::default()));

    for view in page.summary_views() {
        assert!(!view.is_complete);
    }

    settle().await;

    assert_eq!(amount(&page, SummaryKind::LendingCapacity), "9\u{a0}700\u{a0}000\u{a0}kr");
    assert_eq!(amount(&page, SummaryKind::TotalBuyingPower), "10\u{a0}250\u{a0}000\u{a0}kr");
    assert_eq!(amount(&page, SummaryKind::SavingsNeeded), "750\u{a0}000\u{a0}kr");
    assert_eq!(amount(&page, SummaryKind::MonthlySavings), "15\u{a0}625\u{a0}kr");

    let monthly = page
        .summary(SummaryKind::MonthlySavings, &CalculatorGroup::default())
        .expect("summary mounted")
        .view();
    assert!(monthly.is_complete);
    assert_eq!(monthly.color, "#007272");
    assert_eq!(monthly.note.as_deref(), Some("Basert på 4 års sparehorisont"));
    assert!(monthly.warning.is_none());
}

#[tokio::test]
async fn test_summary_in_other_context_follows_inputs() {
    let hub = BroadcastHub::new(64);
    let host = ValueSyncBus::attached(fast_config(), Arc::clone(&hub), EventTarget::new("host"));
    let tab = ValueSyncBus::attached(fast_config(), hub, EventTarget::new("tab"));
    let group = CalculatorGroup::default();

    let summary = SummaryWidget::mount(&tab, SummaryProps::for_kind(SummaryKind::LendingCapacity, &group));
    let income = InputWidget::mount(&host, InputProps::for_field(Field::Income, &group));
    let debt = InputWidget::mount(&host, InputProps::for_field(Field::Debt, &group));
    settle().await;

    assert_eq!(summary.outcome().result, Some(9_700_000.0));

    income.set_value(1_000_000);
    debt.set_value(1_234_567);
    settle().await;

    assert_eq!(summary.value(Field::Debt), Some(1_225_000));
    assert_eq!(summary.outcome().result, Some(3_775_000.0));
}

#[tokio::test]
async fn test_missing_inputs_are_reported() {
    let bus = ValueSyncBus::with_config(fast_config());
    let group = CalculatorGroup::default();
    let config = Config {
        inputs: vec![InputProps::for_field(Field::Income, &group)],
        summaries: vec![
            SummaryProps::for_kind(SummaryKind::LendingCapacity, &group),
            SummaryProps::for_kind(SummaryKind::MonthlySavings, &group),
        ],
        ..Default::default()
    };
    let page = Page::mount(&bus, &config);
    settle().await;

    let lending = page
        .summary(SummaryKind::LendingCapacity, &group)
        .expect("summary mounted")
        .view();
    assert!(!lending.is_complete);
    assert_eq!(lending.amount_text, "0\u{a0}kr");
    assert_eq!(lending.color, MUTED_COLOR);
    let warning = lending.warning.expect("warning shown");
    assert_eq!(warning.heading, "Mangler input-felt:");
    assert_eq!(warning.fields, vec!["Gjeld"]);

    let monthly = page
        .summary(SummaryKind::MonthlySavings, &group)
        .expect("summary mounted")
        .view();
    assert_eq!(
        monthly.warning.expect("warning shown").fields,
        vec!["Ønsket boligverdi", "Gjeld", "Egenkapital", "Sparehorisont"]
    );
    assert!(monthly.note.is_none());
}

#[tokio::test]
async fn test_watch_reports_each_change() {
    let bus = ValueSyncBus::with_config(fast_config());
    let group = CalculatorGroup::default();

    let summary = SummaryWidget::mount(&bus, SummaryProps::for_kind(SummaryKind::LendingCapacity, &group));
    let outcomes: Arc<Mutex<Vec<SummaryOutcome>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&outcomes);
    summary.watch(move |outcome| sink.lock().push(outcome.clone()));

    let income = InputWidget::mount(&bus, InputProps::for_field(Field::Income, &group));
    let debt = InputWidget::mount(&bus, InputProps::for_field(Field::Debt, &group));
    settle().await;
    income.set_value(600_000);
    settle().await;

    let results: Vec<Option<f64>> = outcomes.lock().iter().map(|o| o.result).collect();
    assert_eq!(results, vec![None, Some(9_700_000.0), Some(2_700_000.0)]);

    debt.unmount();
    summary.unmount();
    income.set_value(800_000);
    settle().await;
    assert_eq!(outcomes.lock().len(), 3);
}

#[tokio::test]
async fn test_second_input_mirrors_the_first() {
    let bus = ValueSyncBus::with_config(fast_config());
    let group = CalculatorGroup::default();

    let first = InputWidget::mount(&bus, InputProps::for_field(Field::Equity, &group));
    let second = InputWidget::mount(&bus, InputProps::for_field(Field::Equity, &group));
    assert!(first.is_publisher());
    assert!(!second.is_publisher());

    first.set_value(2_000_000);
    assert_eq!(second.value(), 2_000_000);

    second.set_value(3_010_000);
    assert_eq!(second.value(), 3_000_000);
    assert_eq!(first.value(), 3_000_000);
    settle().await;

    // The announcement reads the value at fire time, so nothing is rolled back.
    assert_eq!(first.value(), 3_000_000);
    assert_eq!(second.value(), 3_000_000);
}

#[tokio::test]
async fn test_mirror_respects_custom_range() {
    let bus = ValueSyncBus::with_config(fast_config());
    let group = CalculatorGroup::default();

    let full = InputWidget::mount(&bus, InputProps::for_field(Field::Income, &group));
    let mut narrow = InputProps::for_field(Field::Income, &group);
    narrow.custom_max = Some(1_000_000);
    let narrow = InputWidget::mount(&bus, narrow);

    full.set_value(2_500_000);
    assert_eq!(narrow.value(), 1_000_000);
    assert_eq!(narrow.view().fill_percent, 100.0);
}

#[tokio::test]
async fn test_groups_on_one_page_are_independent() {
    let bus = ValueSyncBus::with_config(fast_config());
    let (a, b) = (
        CalculatorGroup::new("calc-a").expect("valid group"),
        CalculatorGroup::new("calc-b").expect("valid group"),
    );
    let mut config = Config::full_page(&a);
    let other = Config::full_page(&b);
    config.inputs.extend(other.inputs);
    config.summaries.extend(other.summaries);

    let page = Page::mount(&bus, &config);
    settle().await;

    page.input(Field::Income, &a)
        .expect("input mounted")
        .set_value(1_000_000);

    let lending = |group: &CalculatorGroup| {
        page.summary(SummaryKind::LendingCapacity, group)
            .expect("summary mounted")
            .outcome()
            .result
    };
    assert_eq!(lending(&a), Some(4_700_000.0));
    assert_eq!(lending(&b), Some(9_700_000.0));
}

#[tokio::test]
async fn test_late_summary_waits_for_next_change() {
    let bus = ValueSyncBus::with_config(fast_config());
    let group = CalculatorGroup::default();

    let income = InputWidget::mount(&bus, InputProps::for_field(Field::Income, &group));
    let _debt = InputWidget::mount(&bus, InputProps::for_field(Field::Debt, &group));
    settle().await;

    let summary = SummaryWidget::mount(&bus, SummaryProps::for_kind(SummaryKind::LendingCapacity, &group));
    assert!(summary.values().get(Field::Income).is_none());
    assert!(!summary.outcome().is_complete());

    income.set_value(400_000);
    assert_eq!(summary.value(Field::Income), Some(400_000));
    assert_eq!(summary.outcome().missing, vec![Field::Debt]);
}

#[tokio::test]
async fn test_late_input_restores_group_value() {
    let bus = ValueSyncBus::with_config(fast_config());
    let group = CalculatorGroup::default();

    let first = InputWidget::mount(&bus, InputProps::for_field(Field::PropertyValue, &group));
    first.set_value(6_000_000);

    let late = InputWidget::mount(&bus, InputProps::for_field(Field::PropertyValue, &group));
    assert_eq!(late.value(), 6_000_000);
}

#[tokio::test]
async fn test_unmounted_page_leaves_no_state() {
    let bus = ValueSyncBus::with_config(fast_config());
    let page = Page::mount(&bus, &Config::full_page(&CalculatorGroup::default()));
    settle().await;

    drop(page);
    assert_eq!(bus.registry().group_count(), 0);
}

proptest! {
    #[test]
    fn prop_slider_values_stay_on_the_track(raw in -5_000_000i64..30_000_000i64) {
        let bus = ValueSyncBus::new();
        for field in Field::ALL {
            let input = InputWidget::mount(&bus, InputProps::for_field(field, &CalculatorGroup::default()));
            let domain = input.domain();
            let value = input.set_value(raw);
            prop_assert!(domain.contains(value));
            prop_assert!(value == domain.max || (value - domain.min) % domain.step == 0);
        }
    }
}
