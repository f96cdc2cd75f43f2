//! A host page: every widget a configuration places on one document,
//! mounted onto one bus.

use valuesync_bus::ValueSyncBus;
use valuesync_core::{CalculatorGroup, Field, SummaryKind};
use valuesync_settings::Config;

use crate::input::InputWidget;
use crate::summary::{SummaryView, SummaryWidget};

/// Widgets mounted from one configuration
#[derive(Debug)]
pub struct Page {
    bus: ValueSyncBus,
    inputs: Vec<InputWidget>,
    summaries: Vec<SummaryWidget>,
}

impl Page {
    /// Mount every input, then every summary, in configuration order
    pub fn mount(bus: &ValueSyncBus, config: &Config) -> Self {
        let inputs = config
            .inputs
            .iter()
            .map(|props| InputWidget::mount(bus, props.clone()))
            .collect::<Vec<_>>();
        let summaries = config
            .summaries
            .iter()
            .map(|props| SummaryWidget::mount(bus, props.clone()))
            .collect::<Vec<_>>();

        tracing::info!(
            "Page mounted: {} inputs, {} summaries",
            inputs.len(),
            summaries.len()
        );

        Self {
            bus: bus.clone(),
            inputs,
            summaries,
        }
    }

    /// Bus the page is mounted on
    pub fn bus(&self) -> &ValueSyncBus {
        &self.bus
    }

    /// Mounted inputs
    pub fn inputs(&self) -> &[InputWidget] {
        &self.inputs
    }

    /// Mounted summaries
    pub fn summaries(&self) -> &[SummaryWidget] {
        &self.summaries
    }

    /// First input for `field` in `group`
    pub fn input(&self, field: Field, group: &CalculatorGroup) -> Option<&InputWidget> {
        self.inputs
            .iter()
            .find(|input| input.field() == field && input.group() == group)
    }

    /// First summary of `kind` in `group`
    pub fn summary(&self, kind: SummaryKind, group: &CalculatorGroup) -> Option<&SummaryWidget> {
        self.summaries
            .iter()
            .find(|summary| summary.kind() == kind && summary.group() == group)
    }

    /// Views of every summary, in mount order
    pub fn summary_views(&self) -> Vec<SummaryView> {
        self.summaries.iter().map(SummaryWidget::view).collect()
    }

    /// Unmount every widget; idempotent
    pub fn unmount(&self) {
        let mounted = self.inputs.iter().any(InputWidget::is_mounted)
            || self.summaries.iter().any(SummaryWidget::is_mounted);
        for input in &self.inputs {
            input.unmount();
        }
        for summary in &self.summaries {
            summary.unmount();
        }
        if mounted {
            tracing::info!("Page unmounted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_full_page_lookup() {
        let bus = ValueSyncBus::new();
        let group = CalculatorGroup::default();
        let page = Page::mount(&bus, &Config::full_page(&group));

        assert_eq!(page.inputs().len(), 5);
        assert_eq!(page.summaries().len(), 4);
        assert!(page.input(Field::Debt, &group).is_some());
        assert!(page.summary(SummaryKind::SavingsNeeded, &group).is_some());

        let other = CalculatorGroup::new("other").expect("valid group");
        assert!(page.input(Field::Debt, &other).is_none());

        page.unmount();
        page.unmount();
        assert_eq!(bus.registry().group_count(), 0);
    }
}
