//! Per-topic link owned by one client.
//!
//! A link holds the client's primary and fallback endpoints for one topic,
//! fans inbound updates out to the client's callbacks, and re-establishes the
//! primary endpoint after faults. Transport errors stop here.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use valuesync_core::{SenderId, SyncMessage, Topic, UpdateCallback};

use crate::bus::BusConfig;
use crate::registry::{GroupLease, GroupRegistry};
use crate::transport::{Inbound, InboundHandler, PropagationTransport, TransportEndpoint};

type Endpoint = Arc<dyn TransportEndpoint>;

#[derive(Default)]
struct PrimaryState {
    endpoint: Option<Endpoint>,
    reconnect_pending: bool,
    failed_attempts: u32,
}

pub(crate) struct TopicLink {
    topic: Topic,
    sender: SenderId,
    config: BusConfig,
    primary_transport: Arc<dyn PropagationTransport>,
    fallback_transport: Option<Arc<dyn PropagationTransport>>,
    registry: Arc<GroupRegistry>,
    lease: Mutex<Option<GroupLease>>,
    primary: Mutex<PrimaryState>,
    fallback: Mutex<Option<Endpoint>>,
    callbacks: Mutex<Vec<(u64, UpdateCallback)>>,
    next_callback: AtomicU64,
    publishing: AtomicBool,
    closed: AtomicBool,
}

impl TopicLink {
    pub(crate) fn open(
        topic: Topic,
        sender: SenderId,
        config: BusConfig,
        primary_transport: Arc<dyn PropagationTransport>,
        fallback_transport: Option<Arc<dyn PropagationTransport>>,
        registry: Arc<GroupRegistry>,
    ) -> Arc<Self> {
        let lease = registry.join(topic.group());
        let link = Arc::new(Self {
            topic,
            sender,
            config,
            primary_transport,
            fallback_transport,
            registry,
            lease: Mutex::new(Some(lease)),
            primary: Mutex::new(PrimaryState::default()),
            fallback: Mutex::new(None),
            callbacks: Mutex::new(Vec::new()),
            next_callback: AtomicU64::new(1),
            publishing: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        });
        link.connect_fallback();
        link.connect_primary();
        tracing::debug!("{} linked to {}", link.sender, link.topic);
        link
    }

    pub(crate) fn topic(&self) -> &Topic {
        &self.topic
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn has_primary(&self) -> bool {
        self.primary.lock().endpoint.is_some()
    }

    fn handler(self: &Arc<Self>) -> InboundHandler {
        let weak = Arc::downgrade(self);
        Arc::new(move |inbound| {
            if let Some(link) = weak.upgrade() {
                link.on_inbound(inbound);
            }
        })
    }

    fn connect_fallback(self: &Arc<Self>) {
        let Some(transport) = self.fallback_transport.clone() else {
            return;
        };
        match transport.open(&self.topic, self.handler()) {
            Ok(endpoint) => *self.fallback.lock() = Some(Arc::from(endpoint)),
            Err(err) => tracing::warn!("Fallback {} unusable for {}: {}", transport.name(), self.topic, err),
        }
    }

    fn connect_primary(self: &Arc<Self>) {
        if self.is_closed() {
            return;
        }
        if !self.primary_transport.is_available() {
            tracing::debug!(
                "{} unavailable, {} relies on fallback only",
                self.primary_transport.name(),
                self.topic
            );
            return;
        }

        match self.primary_transport.open(&self.topic, self.handler()) {
            Ok(endpoint) => {
                let mut state = self.primary.lock();
                if self.is_closed() {
                    endpoint.close();
                    return;
                }
                state.endpoint = Some(Arc::from(endpoint));
                state.failed_attempts = 0;
            }
            Err(err) => {
                tracing::warn!("Primary endpoint on {} failed to open: {}", self.topic, err);
                if err.is_recoverable() {
                    self.schedule_reconnect();
                }
            }
        }
    }

    /// Drop the current primary endpoint and reopen it after the retry delay
    fn schedule_reconnect(self: &Arc<Self>) {
        let stale = {
            let mut state = self.primary.lock();
            if state.reconnect_pending || self.is_closed() {
                return;
            }
            if let Some(max) = self.config.max_reconnect_attempts {
                if state.failed_attempts >= max {
                    tracing::warn!(
                        "Giving up on primary endpoint for {} after {} attempts",
                        self.topic,
                        state.failed_attempts
                    );
                    return;
                }
            }
            state.failed_attempts += 1;
            state.reconnect_pending = true;
            state.endpoint.take()
        };
        if let Some(stale) = stale {
            stale.close();
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime, {} stays on fallback", self.topic);
            self.primary.lock().reconnect_pending = false;
            return;
        };

        let weak = Arc::downgrade(self);
        let delay = self.config.reconnect_delay;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(link) = weak.upgrade() {
                link.primary.lock().reconnect_pending = false;
                tracing::debug!("Re-establishing primary endpoint on {}", link.topic);
                link.connect_primary();
            }
        });
    }

    fn on_inbound(self: &Arc<Self>, inbound: Inbound) {
        match inbound {
            Inbound::Message(message) => self.deliver(message),
            Inbound::Malformed(err) => {
                tracing::debug!("Ignoring malformed payload on {}: {}", self.topic, err);
            }
            Inbound::Fault(err) => {
                tracing::warn!("Transport fault on {}: {}", self.topic, err);
                if err.is_recoverable() {
                    self.schedule_reconnect();
                }
            }
        }
    }

    fn deliver(&self, message: SyncMessage) {
        if self.is_closed() || message.sender_id == self.sender {
            return;
        }
        let value = match message.value_for(&self.topic) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!("Dropping update on {}: {}", self.topic, err);
                return;
            }
        };

        let field = self.topic.field();
        self.registry.record(field, self.topic.group(), value);

        let callbacks: Vec<UpdateCallback> = self
            .callbacks
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(field, value);
        }
    }

    /// Broadcast `value` on both transports; returns the clamped value sent
    pub(crate) fn publish(self: &Arc<Self>, value: i64) -> i64 {
        let message = SyncMessage::update(self.topic.field(), self.topic.group(), value, self.sender);
        if self.is_closed() {
            return message.value;
        }
        self.publishing.store(true, Ordering::SeqCst);
        self.registry
            .record(self.topic.field(), self.topic.group(), message.value);

        let primary = self.primary.lock().endpoint.clone();
        match primary.map(|endpoint| endpoint.post(&message)) {
            Some(Ok(())) => {}
            Some(Err(err)) => {
                tracing::warn!("Dropped update on {}: {}", self.topic, err);
                if err.is_recoverable() {
                    self.schedule_reconnect();
                }
            }
            None => tracing::trace!("Primary endpoint on {} not connected", self.topic),
        }

        let fallback = self.fallback.lock().clone();
        if let Some(endpoint) = fallback {
            if let Err(err) = endpoint.post(&message) {
                tracing::debug!("Fallback post on {} failed: {}", self.topic, err);
            }
        }

        tracing::trace!("{} published {} on {}", self.sender, message.value, self.topic);
        message.value
    }

    pub(crate) fn add_callback(&self, callback: UpdateCallback) -> u64 {
        let id = self.next_callback.fetch_add(1, Ordering::Relaxed);
        self.callbacks.lock().push((id, callback));
        id
    }

    /// Remove a callback; returns true when the link is no longer needed
    pub(crate) fn remove_callback(&self, id: u64) -> bool {
        let mut callbacks = self.callbacks.lock();
        callbacks.retain(|(callback_id, _)| *callback_id != id);
        callbacks.is_empty() && !self.publishing.load(Ordering::SeqCst)
    }

    /// Release both endpoints and the group lease; idempotent
    pub(crate) fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let primary = self.primary.lock().endpoint.take();
        if let Some(endpoint) = primary {
            endpoint.close();
        }
        let fallback = self.fallback.lock().take();
        if let Some(endpoint) = fallback {
            endpoint.close();
        }
        self.callbacks.lock().clear();
        self.registry
            .release_publisher(self.topic.field(), self.topic.group(), self.sender);
        self.lease.lock().take();
        tracing::debug!("{} unlinked from {}", self.sender, self.topic);
    }
}

impl Drop for TopicLink {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for TopicLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicLink")
            .field("topic", &self.topic)
            .field("sender", &self.sender)
            .field("closed", &self.is_closed())
            .finish()
    }
}
