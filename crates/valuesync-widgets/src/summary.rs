//! Summary widget model
//!
//! Listens to every field of its calculator group, caches the latest value
//! of each, and re-evaluates its derivation on demand. Until every required
//! field has been received the summary reports which inputs are missing
//! instead of a number.

use parking_lot::Mutex;
use std::sync::Arc;
use valuesync_bus::{Subscription, SyncClient, ValueSyncBus};
use valuesync_core::{
    format_currency_f64, thread_safe, CalculatorGroup, Field, FieldValues, SummaryKind,
    SummaryOutcome, ThreadSafe,
};
use valuesync_settings::SummaryProps;

/// Colour of an amount that is still waiting for inputs
pub const MUTED_COLOR: &str = "#999";

/// Heading of the missing-inputs warning
pub const MISSING_HEADING: &str = "Mangler input-felt:";

/// Guidance shown under the missing-inputs list
pub const MISSING_HINT: &str = "Legg til de manglende DNB Input-komponentene på siden.";

type OutcomeListener = Arc<dyn Fn(&SummaryOutcome) + Send + Sync>;

/// Warning block for a summary with missing inputs
#[derive(Debug, Clone, PartialEq)]
pub struct MissingInputsWarning {
    /// Warning heading
    pub heading: &'static str,
    /// Short names of the missing fields
    pub fields: Vec<&'static str>,
    /// What the page author should do
    pub hint: &'static str,
}

/// Renderable state of a summary
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
    /// Heading
    pub title: String,
    /// Formatted amount; zero while inputs are missing
    pub amount_text: String,
    /// Whether the amount is a computed result
    pub is_complete: bool,
    /// Colour of the amount
    pub color: String,
    /// Derivation text, when enabled
    pub description: Option<&'static str>,
    /// Missing-inputs block, when enabled and applicable
    pub warning: Option<MissingInputsWarning>,
    /// Horizon note for monthly savings
    pub note: Option<String>,
}

impl std::fmt::Display for SummaryView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.amount_text)?;
        if !self.is_complete {
            write!(f, " (venter på input)")?;
        }
        if let Some(note) = &self.note {
            write!(f, " - {}", note)?;
        }
        if let Some(warning) = &self.warning {
            write!(f, "\n  {} {}", warning.heading, warning.fields.join(", "))?;
        }
        Ok(())
    }
}

/// A mounted summary widget
pub struct SummaryWidget {
    props: SummaryProps,
    values: ThreadSafe<FieldValues>,
    listener: ThreadSafe<Option<OutcomeListener>>,
    client: Arc<SyncClient>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SummaryWidget {
    /// Mount onto `bus` and subscribe to every field of the group
    pub fn mount(bus: &ValueSyncBus, props: SummaryProps) -> Self {
        let client = bus.client();
        let values = thread_safe(FieldValues::new());
        let listener: ThreadSafe<Option<OutcomeListener>> = thread_safe(None);
        let kind = props.summary_type;

        let subscriptions = Field::ALL
            .into_iter()
            .map(|field| {
                let values = Arc::clone(&values);
                let listener = Arc::clone(&listener);
                client.subscribe(field, &props.calculator_id, move |field, value| {
                    let outcome = {
                        let mut values = values.lock();
                        if !values.set(field, value) {
                            return;
                        }
                        kind.evaluate(&values)
                    };
                    let listener = listener.lock().clone();
                    if let Some(listener) = listener {
                        listener(&outcome);
                    }
                })
            })
            .collect();

        tracing::debug!("Summary {} mounted in {}", kind, props.calculator_id);

        Self {
            props,
            values,
            listener,
            client,
            subscriptions: Mutex::new(subscriptions),
        }
    }

    /// Derived quantity shown
    pub fn kind(&self) -> SummaryKind {
        self.props.summary_type
    }

    /// Group this summary listens to
    pub fn group(&self) -> &CalculatorGroup {
        &self.props.calculator_id
    }

    /// Props the widget was mounted with
    pub fn props(&self) -> &SummaryProps {
        &self.props
    }

    /// Call `listener` with the new outcome whenever a cached value changes
    pub fn watch<F>(&self, listener: F)
    where
        F: Fn(&SummaryOutcome) + Send + Sync + 'static,
    {
        *self.listener.lock() = Some(Arc::new(listener));
    }

    /// Cached value of `field`
    pub fn value(&self, field: Field) -> Option<i64> {
        self.values.lock().get(field)
    }

    /// Copy of every cached value
    pub fn values(&self) -> FieldValues {
        self.values.lock().clone()
    }

    /// Evaluate against the cached values
    pub fn outcome(&self) -> SummaryOutcome {
        self.props.summary_type.evaluate(&self.values.lock())
    }

    /// Renderable state
    pub fn view(&self) -> SummaryView {
        let kind = self.props.summary_type;
        let values = self.values();
        let outcome = kind.evaluate(&values);
        let is_complete = outcome.is_complete();

        let warning = (self.props.show_warnings && !is_complete).then(|| MissingInputsWarning {
            heading: MISSING_HEADING,
            fields: outcome
                .missing
                .iter()
                .map(|field| field.spec().short_name)
                .collect(),
            hint: MISSING_HINT,
        });

        let note = match (kind, is_complete, values.get(Field::TimeHorizon)) {
            (SummaryKind::MonthlySavings, true, Some(years)) if years > 0 => {
                Some(format!("Basert på {} års sparehorisont", years))
            }
            _ => None,
        };

        SummaryView {
            title: self.props.display_label().to_string(),
            amount_text: format_currency_f64(outcome.result.unwrap_or(0.0)),
            is_complete,
            color: if is_complete {
                self.props.highlight_color.clone()
            } else {
                MUTED_COLOR.to_string()
            },
            description: self.props.show_description.then(|| kind.description()),
            warning,
            note,
        }
    }

    /// Release bus resources; idempotent
    pub fn unmount(&self) {
        let subscriptions: Vec<Subscription> = self.subscriptions.lock().drain(..).collect();
        if subscriptions.is_empty() {
            return;
        }
        for subscription in &subscriptions {
            subscription.dispose();
        }
        self.client.close();
        self.listener.lock().take();
        tracing::debug!("Summary {} unmounted", self.props.summary_type);
    }

    /// Whether the widget is still mounted
    pub fn is_mounted(&self) -> bool {
        !self.subscriptions.lock().is_empty()
    }
}

impl Drop for SummaryWidget {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for SummaryWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryWidget")
            .field("kind", &self.props.summary_type)
            .field("group", &self.props.calculator_id)
            .field("values", &self.values())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mount(kind: SummaryKind) -> (ValueSyncBus, SummaryWidget) {
        let bus = ValueSyncBus::new();
        let summary = SummaryWidget::mount(&bus, SummaryProps::for_kind(kind, &CalculatorGroup::default()));
        (bus, summary)
    }

    #[tokio::test]
    async fn test_starts_waiting_for_inputs() {
        let (_bus, summary) = mount(SummaryKind::LendingCapacity);
        let view = summary.view();

        assert!(!view.is_complete);
        assert_eq!(view.title, "Lånekapasitet");
        assert_eq!(view.amount_text, "0\u{a0}kr");
        assert_eq!(view.color, MUTED_COLOR);
        assert_eq!(view.description, Some("Beregnet som (årsinntekt × 5) - gjeld"));

        let warning = view.warning.expect("missing inputs are listed");
        assert_eq!(warning.fields, vec!["Årsinntekt", "Gjeld"]);
        assert_eq!(warning.hint, MISSING_HINT);
    }

    #[tokio::test]
    async fn test_warnings_can_be_hidden() {
        let bus = ValueSyncBus::new();
        let mut props = SummaryProps::for_kind(SummaryKind::SavingsNeeded, &CalculatorGroup::default());
        props.show_warnings = false;
        props.show_description = false;
        let summary = SummaryWidget::mount(&bus, props);

        let view = summary.view();
        assert!(view.warning.is_none());
        assert!(view.description.is_none());
        assert!(!view.is_complete);
    }

    #[tokio::test]
    async fn test_unmount_releases_group() {
        let (bus, summary) = mount(SummaryKind::MonthlySavings);
        assert_eq!(bus.registry().lease_count(&CalculatorGroup::default()), 5);
        summary.unmount();
        summary.unmount();
        assert_eq!(bus.registry().group_count(), 0);
    }
}
