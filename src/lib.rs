//! # ValueSync
//!
//! Keeps independently embedded calculator widgets consistent with each
//! other. Input widgets publish slider values per calculator group; Summary
//! widgets listen and derive lending capacity, buying power and savings
//! figures, without any widget holding a reference to another.
//!
//! ## Architecture
//!
//! ValueSync is organized as a workspace with multiple crates:
//!
//! 1. **valuesync-core** - Fields, groups, topics, messages, formatting, summaries
//! 2. **valuesync-bus** - Propagation transports, group registry, clients
//! 3. **valuesync-widgets** - Headless Input and Summary widget models
//! 4. **valuesync-settings** - Bus tuning and page layout configuration
//! 5. **valuesync** - This crate: re-exports, logging, and the demo binary

pub mod demo;

pub use valuesync_core::{
    format_currency, format_currency_f64, CalculatorGroup, Error, Field, FieldDomain, FieldError,
    FieldSpec, FieldValues, FormatKind, GroupError, MessageError, Result, SenderId, SummaryKind,
    SummaryOutcome, SyncMessage, Topic, TransportError, DEFAULT_GROUP,
};

pub use valuesync_bus::{
    init_sync_bus, sync_bus, BroadcastHub, BroadcastTransport, BusConfig, EventTarget,
    GroupRegistry, LocalEventTransport, PropagationTransport, Subscription, SyncClient,
    TransportEndpoint, ValueSyncBus,
};

pub use valuesync_widgets::{
    InputView, InputWidget, MissingInputsWarning, Page, SummaryView, SummaryWidget,
};

pub use valuesync_settings::{
    BusSettings, Config, ConfigError, InputProps, SettingsError, SummaryProps,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - RUST_LOG environment variable support, INFO by default
/// - Pretty console output, or one JSON object per line when `json` is set
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_level(true)
            .json();
        registry.with(fmt_layer).try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_level(true)
            .with_thread_names(true)
            .with_line_number(true)
            .pretty();
        registry.with(fmt_layer).try_init()?;
    }

    Ok(())
}
