//! Scripted demo: mount a page, move its sliders, collect summary views.

use anyhow::Context;
use std::path::Path;
use std::time::Duration;
use valuesync_core::{CalculatorGroup, Field};
use valuesync_settings::Config;
use valuesync_widgets::{Page, SummaryView};

/// Slider moves performed by the demo, in order
pub const DEFAULT_SCRIPT: [(Field, i64); 6] = [
    (Field::Income, 1_500_000),
    (Field::Debt, 450_000),
    (Field::Equity, 600_000),
    (Field::PropertyValue, 7_500_000),
    (Field::TimeHorizon, 6),
    (Field::Debt, 0),
];

/// Summary views after one scripted step
#[derive(Debug, Clone)]
pub struct Frame {
    /// What changed, e.g. `income = 1 500 000 kr`; `None` for the initial frame
    pub change: Option<String>,
    /// Views of every summary in `group`
    pub views: Vec<SummaryView>,
}

/// Pick the page layout: an explicit file, else the default config location,
/// else one input per field and one summary per kind in `group`
pub fn resolve_config(path: Option<&Path>, group: &CalculatorGroup) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => match Config::default_path() {
            Ok(path) => Config::load_or_default(&path)
                .with_context(|| format!("loading {}", path.display()))?,
            Err(err) => {
                tracing::debug!("No default config location: {}", err);
                Config::default()
            }
        },
    };

    if config.inputs.is_empty() && config.summaries.is_empty() {
        tracing::info!("No widgets configured, mounting a full page in {}", group);
        return Ok(Config {
            bus: config.bus,
            ..Config::full_page(group)
        });
    }
    Ok(config)
}

/// Drive `script` against the inputs of `group`, waiting `settle` after each
/// move so announcements and cross-context deliveries land
pub async fn run(
    page: &Page,
    group: &CalculatorGroup,
    script: &[(Field, i64)],
    settle: Duration,
) -> Vec<Frame> {
    tokio::time::sleep(settle).await;
    let mut frames = vec![Frame {
        change: None,
        views: views(page, group),
    }];

    for &(field, raw) in script {
        let Some(input) = page.input(field, group) else {
            tracing::warn!("No {} input in {}, skipping", field, group);
            continue;
        };
        let value = input.set_value(raw);
        tokio::time::sleep(settle).await;

        frames.push(Frame {
            change: Some(format!(
                "{} = {}",
                input.props().display_label(),
                field.spec().format.format(value)
            )),
            views: views(page, group),
        });
    }

    frames
}

fn views(page: &Page, group: &CalculatorGroup) -> Vec<SummaryView> {
    page.summaries()
        .iter()
        .filter(|summary| summary.group() == group)
        .map(|summary| summary.view())
        .collect()
}
