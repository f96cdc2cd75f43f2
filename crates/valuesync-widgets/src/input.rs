//! Input widget model
//!
//! Owns one field's value within a calculator group. Every slider change is
//! snapped to the widget's range and published; updates published by other
//! instances of the same field are mirrored locally.

use parking_lot::Mutex;
use std::sync::Arc;
use valuesync_bus::{Subscription, SyncClient, ValueSyncBus};
use valuesync_core::{thread_safe, CalculatorGroup, Field, FieldDomain, ThreadSafe};
use valuesync_settings::InputProps;

/// Renderable state of an input
#[derive(Debug, Clone, PartialEq)]
pub struct InputView {
    /// Heading, absent when labels are hidden
    pub label: Option<String>,
    /// Current value
    pub value: i64,
    /// Current value, formatted
    pub value_text: String,
    /// Lower bound, formatted
    pub min_text: String,
    /// Upper bound, formatted
    pub max_text: String,
    /// Filled share of the track, 0 to 100
    pub fill_percent: f64,
    /// Slider range
    pub domain: FieldDomain,
}

impl std::fmt::Display for InputView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{}: ", label)?;
        }
        write!(
            f,
            "{} [{} .. {}] {:.0}%",
            self.value_text, self.min_text, self.max_text, self.fill_percent
        )
    }
}

/// A mounted input widget
pub struct InputWidget {
    props: InputProps,
    domain: FieldDomain,
    value: ThreadSafe<i64>,
    client: Arc<SyncClient>,
    subscription: Mutex<Option<Subscription>>,
    publisher: bool,
}

impl InputWidget {
    /// Mount onto `bus`: mirror the topic, and when this instance holds the
    /// publisher role, announce the starting value after the announce delay.
    pub fn mount(bus: &ValueSyncBus, props: InputProps) -> Self {
        let field = props.field;
        let group = props.calculator_id.clone();
        let domain = props.domain().unwrap_or_else(|err| {
            tracing::warn!("Ignoring custom range: {}", err);
            field.domain()
        });

        let client = bus.client();
        let start = client
            .current(field, &group)
            .unwrap_or(field.spec().default_value);
        let value = thread_safe(domain.clamp(start));

        let mirror = Arc::clone(&value);
        let subscription = client.subscribe(field, &group, move |_, received| {
            *mirror.lock() = domain.clamp(received);
        });

        let publisher = client.claim_publisher(field, &group);
        if publisher {
            let announced = Arc::clone(&value);
            client.announce(field, &group, move || *announced.lock());
        }

        tracing::debug!(
            "Input {} mounted in {} (publisher: {})",
            field,
            group,
            publisher
        );

        Self {
            props,
            domain,
            value,
            client,
            subscription: Mutex::new(Some(subscription)),
            publisher,
        }
    }

    /// Field this input owns
    pub fn field(&self) -> Field {
        self.props.field
    }

    /// Group this input synchronises within
    pub fn group(&self) -> &CalculatorGroup {
        &self.props.calculator_id
    }

    /// Props the widget was mounted with
    pub fn props(&self) -> &InputProps {
        &self.props
    }

    /// Effective slider range
    pub fn domain(&self) -> FieldDomain {
        self.domain
    }

    /// Whether this instance announced on join
    pub fn is_publisher(&self) -> bool {
        self.publisher
    }

    /// Current value
    pub fn value(&self) -> i64 {
        *self.value.lock()
    }

    /// Handle a slider change: snap, store, publish. Returns the stored value.
    pub fn set_value(&self, raw: i64) -> i64 {
        let value = self.domain.snap(raw);
        *self.value.lock() = value;
        self.client.publish(self.props.field, &self.props.calculator_id, value);
        value
    }

    /// Renderable state
    pub fn view(&self) -> InputView {
        let value = self.value();
        let format = self.props.field.spec().format;
        InputView {
            label: self
                .props
                .show_label
                .then(|| self.props.display_label().to_string()),
            value,
            value_text: format.format(value),
            min_text: format.format(self.domain.min),
            max_text: format.format(self.domain.max),
            fill_percent: self.domain.fill_percent(value),
            domain: self.domain,
        }
    }

    /// Release bus resources; idempotent
    pub fn unmount(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.dispose();
            self.client.close();
            tracing::debug!("Input {} unmounted", self.props.field);
        }
    }

    /// Whether the widget is still mounted
    pub fn is_mounted(&self) -> bool {
        self.subscription.lock().is_some()
    }
}

impl Drop for InputWidget {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for InputWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputWidget")
            .field("field", &self.props.field)
            .field("group", &self.props.calculator_id)
            .field("value", &self.value())
            .field("publisher", &self.publisher)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults() {
        let bus = ValueSyncBus::new();
        let input = InputWidget::mount(
            &bus,
            InputProps::for_field(Field::PropertyValue, &CalculatorGroup::default()),
        );
        assert_eq!(input.value(), 11_000_000);
        assert!(input.is_publisher());

        let view = input.view();
        assert_eq!(view.label.as_deref(), Some("Ønsket boligverdi"));
        assert_eq!(view.value_text, "11\u{a0}000\u{a0}000\u{a0}kr");
        assert_eq!(view.min_text, "1\u{a0}000\u{a0}000\u{a0}kr");
        assert_eq!(view.max_text, "20\u{a0}000\u{a0}000\u{a0}kr");
    }

    #[tokio::test]
    async fn test_set_value_snaps_and_clamps() {
        let bus = ValueSyncBus::new();
        let input = InputWidget::mount(
            &bus,
            InputProps::for_field(Field::TimeHorizon, &CalculatorGroup::default()),
        );
        assert_eq!(input.set_value(7), 7);
        assert_eq!(input.set_value(0), 1);
        assert_eq!(input.set_value(25), 10);
        assert_eq!(input.view().value_text, "10 år");
    }

    #[tokio::test]
    async fn test_invalid_custom_range_falls_back() {
        let bus = ValueSyncBus::new();
        let mut props = InputProps::for_field(Field::Debt, &CalculatorGroup::default());
        props.custom_min = Some(-10);
        let input = InputWidget::mount(&bus, props);
        assert_eq!(input.domain(), Field::Debt.domain());
    }

    #[tokio::test]
    async fn test_hidden_label() {
        let bus = ValueSyncBus::new();
        let mut props = InputProps::for_field(Field::Debt, &CalculatorGroup::default());
        props.show_label = false;
        let input = InputWidget::mount(&bus, props);
        assert_eq!(input.view().label, None);
    }

    #[tokio::test]
    async fn test_unmount_is_idempotent() {
        let bus = ValueSyncBus::new();
        let input = InputWidget::mount(
            &bus,
            InputProps::for_field(Field::Equity, &CalculatorGroup::default()),
        );
        assert_eq!(bus.registry().group_count(), 1);
        input.unmount();
        input.unmount();
        assert!(!input.is_mounted());
        assert_eq!(bus.registry().group_count(), 0);
    }
}
