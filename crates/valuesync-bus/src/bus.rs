//! ValueSyncBus implementation.
//!
//! Composes a primary and an optional fallback transport with one group
//! registry, and hands out per-widget [`SyncClient`]s. A bus stands for one
//! execution context (one document); buses attached to the same
//! [`BroadcastHub`] reach each other through the primary transport.

use std::sync::{Arc, OnceLock};
use std::time::Duration;
use valuesync_settings::BusSettings;

use crate::client::SyncClient;
use crate::registry::GroupRegistry;
use crate::transport::{
    BroadcastHub, BroadcastTransport, EventTarget, LocalEventTransport, PropagationTransport,
};

/// Configuration for the value sync bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Delay before a failed primary endpoint is reopened.
    pub reconnect_delay: Duration,
    /// Delay before a publisher announces its value on join.
    pub announce_delay: Duration,
    /// Frames buffered per receiver on the primary transport.
    pub channel_capacity: usize,
    /// Whether to propagate over the fallback transport as well.
    pub enable_fallback: bool,
    /// Consecutive reopen attempts before giving up; `None` retries forever.
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(100),
            announce_delay: Duration::from_millis(50),
            channel_capacity: 64,
            enable_fallback: true,
            max_reconnect_attempts: None,
        }
    }
}

impl From<&BusSettings> for BusConfig {
    fn from(settings: &BusSettings) -> Self {
        Self {
            reconnect_delay: Duration::from_millis(settings.reconnect_delay_ms),
            announce_delay: Duration::from_millis(settings.announce_delay_ms),
            channel_capacity: settings.channel_capacity,
            enable_fallback: settings.enable_fallback,
            max_reconnect_attempts: settings.max_reconnect_attempts,
        }
    }
}

struct BusInner {
    config: BusConfig,
    primary: Arc<dyn PropagationTransport>,
    fallback: Option<Arc<dyn PropagationTransport>>,
    registry: Arc<GroupRegistry>,
}

/// Value propagation bus for one execution context
#[derive(Clone)]
pub struct ValueSyncBus {
    inner: Arc<BusInner>,
}

impl ValueSyncBus {
    /// Create a bus with default configuration and private transports
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Create a bus with private transports: a fresh hub and event target
    pub fn with_config(config: BusConfig) -> Self {
        let hub = BroadcastHub::new(config.channel_capacity);
        Self::attached(config, hub, EventTarget::new("window"))
    }

    /// Create a bus attached to a shared hub, dispatching fallback events
    /// through `window`.
    ///
    /// With the fallback enabled, peers in this context are reached through
    /// `window` only and the hub carries traffic between contexts.
    pub fn attached(config: BusConfig, hub: Arc<BroadcastHub>, window: Arc<EventTarget>) -> Self {
        let fallback: Option<Arc<dyn PropagationTransport>> = if config.enable_fallback {
            Some(Arc::new(LocalEventTransport::new(window)))
        } else {
            None
        };
        let primary = BroadcastTransport::new(hub).skip_own_context(fallback.is_some());
        Self::with_transports(config, Arc::new(primary), fallback)
    }

    /// Create a bus over arbitrary transports
    pub fn with_transports(
        config: BusConfig,
        primary: Arc<dyn PropagationTransport>,
        fallback: Option<Arc<dyn PropagationTransport>>,
    ) -> Self {
        tracing::debug!(
            "Value sync bus created (primary: {}, fallback: {})",
            primary.name(),
            fallback.as_ref().map(|f| f.name()).unwrap_or("none")
        );
        Self {
            inner: Arc::new(BusInner {
                config,
                primary,
                fallback,
                registry: GroupRegistry::new(),
            }),
        }
    }

    /// Create a client for one widget instance, with a fresh sender identity
    pub fn client(&self) -> Arc<SyncClient> {
        Arc::new(SyncClient::new(self.clone()))
    }

    /// The registry of groups live in this context
    pub fn registry(&self) -> &Arc<GroupRegistry> {
        &self.inner.registry
    }

    /// Get the current configuration
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    pub(crate) fn primary(&self) -> Arc<dyn PropagationTransport> {
        Arc::clone(&self.inner.primary)
    }

    pub(crate) fn fallback(&self) -> Option<Arc<dyn PropagationTransport>> {
        self.inner.fallback.clone()
    }
}

impl Default for ValueSyncBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValueSyncBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueSyncBus")
            .field("primary", &self.inner.primary.name())
            .field("fallback", &self.inner.fallback.as_ref().map(|t| t.name()))
            .field("groups", &self.inner.registry.group_count())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Global bus instance
static SYNC_BUS: OnceLock<ValueSyncBus> = OnceLock::new();

/// Get or initialize the global bus
///
/// Widgets mounted without an explicit bus share this one.
pub fn sync_bus() -> &'static ValueSyncBus {
    SYNC_BUS.get_or_init(ValueSyncBus::new)
}

/// Initialize the global bus with custom configuration
///
/// Must be called before any calls to `sync_bus()`. Returns the rejected
/// configuration if the bus has already been initialized.
pub fn init_sync_bus(config: BusConfig) -> Result<(), BusConfig> {
    SYNC_BUS
        .set(ValueSyncBus::with_config(config))
        .map_err(|bus| bus.inner.config.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = BusSettings {
            reconnect_delay_ms: 30,
            announce_delay_ms: 10,
            channel_capacity: 8,
            enable_fallback: false,
            max_reconnect_attempts: Some(3),
        };
        let config = BusConfig::from(&settings);
        assert_eq!(config.reconnect_delay, Duration::from_millis(30));
        assert_eq!(config.announce_delay, Duration::from_millis(10));
        assert_eq!(config.channel_capacity, 8);
        assert!(!config.enable_fallback);
        assert_eq!(config.max_reconnect_attempts, Some(3));
    }

    #[test]
    fn test_fallback_toggle() {
        let bus = ValueSyncBus::with_config(BusConfig {
            enable_fallback: false,
            ..Default::default()
        });
        assert!(bus.fallback().is_none());
        assert!(ValueSyncBus::new().fallback().is_some());
    }

    #[test]
    fn test_global_bus_is_shared() {
        let first = sync_bus();
        let second = sync_bus();
        assert!(Arc::ptr_eq(&first.inner, &second.inner));
        assert!(init_sync_bus(BusConfig::default()).is_err());
    }
}
