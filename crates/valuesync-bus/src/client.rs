//! Per-widget view of the bus.
//!
//! A [`SyncClient`] carries one sender identity and lazily opens one link per
//! topic it touches. Its operations never fail: transport faults are logged
//! and retried below this layer.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use valuesync_core::{CalculatorGroup, Field, SenderId, Topic};

use crate::bus::ValueSyncBus;
use crate::link::TopicLink;

/// One widget instance's connection to the bus
pub struct SyncClient {
    id: SenderId,
    bus: ValueSyncBus,
    links: Mutex<HashMap<Topic, Arc<TopicLink>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl SyncClient {
    pub(crate) fn new(bus: ValueSyncBus) -> Self {
        Self {
            id: SenderId::new(),
            bus,
            links: Mutex::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Sender identity stamped on every publish
    pub fn id(&self) -> SenderId {
        self.id
    }

    /// Whether [`SyncClient::close`] has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn link(&self, field: Field, group: &CalculatorGroup) -> Option<Arc<TopicLink>> {
        if self.is_closed() {
            return None;
        }
        let topic = Topic::new(field, group);
        let mut links = self.links.lock();
        if let Some(link) = links.get(&topic) {
            if !link.is_closed() {
                return Some(Arc::clone(link));
            }
        }
        let link = TopicLink::open(
            topic.clone(),
            self.id,
            self.bus.config().clone(),
            self.bus.primary(),
            self.bus.fallback(),
            Arc::clone(self.bus.registry()),
        );
        links.insert(topic, Arc::clone(&link));
        Some(link)
    }

    /// Broadcast `value` for `(field, group)`.
    ///
    /// The value is clamped into the field's domain first; the clamped value
    /// is returned. Delivery is best-effort.
    pub fn publish(&self, field: Field, group: &CalculatorGroup, value: i64) -> i64 {
        match self.link(field, group) {
            Some(link) => link.publish(value),
            None => {
                tracing::debug!("{} closed, publish on {} skipped", self.id, field);
                field.clamp(value)
            }
        }
    }

    /// Invoke `on_update` for every update on `(field, group)` sent by
    /// another instance. The returned handle unsubscribes when disposed or
    /// dropped.
    pub fn subscribe<F>(&self, field: Field, group: &CalculatorGroup, on_update: F) -> Subscription
    where
        F: Fn(Field, i64) + Send + Sync + 'static,
    {
        let Some(link) = self.link(field, group) else {
            return Subscription::inert();
        };
        let id = link.add_callback(Arc::new(on_update));
        tracing::debug!("{} subscribed to {}", self.id, link.topic());
        Subscription {
            link: Some(link),
            id,
            disposed: AtomicBool::new(false),
        }
    }

    /// Claim the publisher role for `(field, group)` in this context
    pub fn claim_publisher(&self, field: Field, group: &CalculatorGroup) -> bool {
        if self.link(field, group).is_none() {
            return false;
        }
        self.bus.registry().claim_publisher(field, group, self.id)
    }

    /// Publish the value produced by `current` once the announce delay has
    /// passed, so late joiners converge without waiting for user input.
    pub fn announce<F>(self: &Arc<Self>, field: Field, group: &CalculatorGroup, current: F)
    where
        F: FnOnce() -> i64 + Send + 'static,
    {
        // Open the link now so the endpoint is ready when the delay ends.
        if self.link(field, group).is_none() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.publish(field, group, current());
            return;
        };

        let weak = Arc::downgrade(self);
        let group = group.clone();
        let delay = self.bus.config().announce_delay;
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(client) = weak.upgrade() {
                let value = client.publish(field, &group, current());
                tracing::debug!("{} announced {} = {}", client.id, field, value);
            }
        });

        let mut tasks = self.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    /// Latest value observed for `(field, group)` in this context
    pub fn current(&self, field: Field, group: &CalculatorGroup) -> Option<i64> {
        self.bus.registry().current(field, group)
    }

    /// Whether the primary transport is currently connected for the topic
    pub fn is_connected(&self, field: Field, group: &CalculatorGroup) -> bool {
        self.links
            .lock()
            .get(&Topic::new(field, group))
            .is_some_and(|link| !link.is_closed() && link.has_primary())
    }

    /// Release every transport resource; idempotent
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        let links: Vec<Arc<TopicLink>> = self.links.lock().drain().map(|(_, link)| link).collect();
        for link in links {
            link.close();
        }
        tracing::debug!("{} closed", self.id);
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("id", &self.id)
            .field("links", &self.links.lock().len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Handle for one registered update callback
#[must_use = "dropping a Subscription unsubscribes it"]
pub struct Subscription {
    link: Option<Arc<TopicLink>>,
    id: u64,
    disposed: AtomicBool,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            link: None,
            id: 0,
            disposed: AtomicBool::new(true),
        }
    }

    /// Topic this subscription listens on
    pub fn topic(&self) -> Option<&Topic> {
        self.link.as_ref().map(|link| link.topic())
    }

    /// Whether updates are still being delivered
    pub fn is_active(&self) -> bool {
        !self.disposed.load(Ordering::SeqCst)
            && self.link.as_ref().is_some_and(|link| !link.is_closed())
    }

    /// Stop delivery; releases the link's transport endpoints when nothing
    /// else uses them. Safe to call any number of times.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(link) = &self.link {
            if link.remove_callback(self.id) {
                link.close();
            }
            tracing::debug!("Subscription on {} disposed", link.topic());
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic().map(Topic::key))
            .field("active", &self.is_active())
            .finish()
    }
}
