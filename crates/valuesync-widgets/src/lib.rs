//! Headless calculator widgets.
//!
//! An [`InputWidget`] owns one field's slider and publishes every change on
//! its calculator group; a [`SummaryWidget`] listens to all fields of its
//! group and derives a figure once its required inputs have been seen.
//! Widgets only ever talk to each other through a
//! [`ValueSyncBus`](valuesync_bus::ValueSyncBus).

pub mod input;
pub mod page;
pub mod summary;

pub use input::{InputView, InputWidget};
pub use page::Page;
pub use summary::{
    MissingInputsWarning, SummaryView, SummaryWidget, MISSING_HEADING, MISSING_HINT, MUTED_COLOR,
};
