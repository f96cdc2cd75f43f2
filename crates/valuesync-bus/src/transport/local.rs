//! Fallback transport: same-process event dispatch.
//!
//! An [`EventTarget`] stands for one document's global event target. Events
//! are dispatched synchronously to every listener registered under the event
//! name, including the one belonging to the poster. Targets can be linked as
//! parent and child frames; a post is forwarded one hop across each link, and
//! links between different origins refuse the forward.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use valuesync_core::{SyncMessage, Topic, TransportError};

use super::{Inbound, InboundHandler, PropagationTransport, TransportEndpoint};

#[derive(Clone)]
struct FrameLink {
    target: Weak<EventTarget>,
    same_origin: bool,
}

/// Global event target of one document
pub struct EventTarget {
    name: String,
    listeners: RwLock<HashMap<String, Vec<(u64, InboundHandler)>>>,
    parent: RwLock<Option<FrameLink>>,
    children: RwLock<Vec<FrameLink>>,
    next_listener: AtomicU64,
}

impl EventTarget {
    /// Create a detached target
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            listeners: RwLock::new(HashMap::new()),
            parent: RwLock::new(None),
            children: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        })
    }

    /// Name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Embed `child` as a frame of `parent`
    pub fn embed(parent: &Arc<EventTarget>, child: &Arc<EventTarget>, same_origin: bool) {
        *child.parent.write() = Some(FrameLink {
            target: Arc::downgrade(parent),
            same_origin,
        });
        parent.children.write().push(FrameLink {
            target: Arc::downgrade(child),
            same_origin,
        });
        tracing::debug!(
            "Frame {} embedded in {} (same origin: {})",
            child.name,
            parent.name,
            same_origin
        );
    }

    /// Register a listener for `event`, returning its handle
    pub fn add_listener(&self, event: &str, handler: InboundHandler) -> u64 {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .entry(event.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    /// Remove a listener; returns true if it was registered
    pub fn remove_listener(&self, event: &str, id: u64) -> bool {
        let mut listeners = self.listeners.write();
        let Some(handlers) = listeners.get_mut(event) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    /// Number of listeners for `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map(Vec::len).unwrap_or(0)
    }

    /// Dispatch to this target's listeners only
    pub fn dispatch(&self, event: &str, message: &SyncMessage) -> usize {
        self.deliver(event, || Inbound::Message(message.clone()))
    }

    /// Dispatch raw text as a foreign script would
    pub fn dispatch_raw(&self, event: &str, payload: &str) -> usize {
        let inbound = match SyncMessage::decode(payload) {
            Ok(message) => Inbound::Message(message),
            Err(err) => Inbound::Malformed(err),
        };
        self.deliver(event, || inbound.clone())
    }

    fn deliver(&self, event: &str, inbound: impl Fn() -> Inbound) -> usize {
        // Snapshot first: handlers may add or remove listeners.
        let handlers: Vec<InboundHandler> = self
            .listeners
            .read()
            .get(event)
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();
        for handler in &handlers {
            handler(inbound());
        }
        handlers.len()
    }

    /// Forward across every frame boundary, one hop
    fn forward(&self, event: &str, message: &SyncMessage) -> Vec<TransportError> {
        let mut links: Vec<FrameLink> = self.children.read().clone();
        if let Some(parent) = self.parent.read().clone() {
            links.push(parent);
        }

        let mut rejected = Vec::new();
        for link in links {
            let Some(target) = link.target.upgrade() else {
                continue;
            };
            if link.same_origin {
                target.dispatch(event, message);
            } else {
                rejected.push(TransportError::CrossOrigin {
                    topic: event.to_string(),
                });
            }
        }
        rejected
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("name", &self.name)
            .field("events", &self.listeners.read().len())
            .field("children", &self.children.read().len())
            .finish()
    }
}

/// [`PropagationTransport`] over an [`EventTarget`]
#[derive(Debug, Clone)]
pub struct LocalEventTransport {
    target: Arc<EventTarget>,
}

impl LocalEventTransport {
    /// Dispatch through `target`
    pub fn new(target: Arc<EventTarget>) -> Self {
        Self { target }
    }

    /// The event target this transport dispatches through
    pub fn target(&self) -> &Arc<EventTarget> {
        &self.target
    }
}

impl PropagationTransport for LocalEventTransport {
    fn name(&self) -> &'static str {
        "window-event"
    }

    fn open(
        &self,
        topic: &Topic,
        handler: InboundHandler,
    ) -> Result<Box<dyn TransportEndpoint>, TransportError> {
        let listener = self.target.add_listener(topic.key(), handler);
        Ok(Box::new(LocalEndpoint {
            target: Arc::clone(&self.target),
            event: topic.key().to_string(),
            listener: RwLock::new(Some(listener)),
        }))
    }
}

struct LocalEndpoint {
    target: Arc<EventTarget>,
    event: String,
    listener: RwLock<Option<u64>>,
}

impl TransportEndpoint for LocalEndpoint {
    fn post(&self, message: &SyncMessage) -> Result<(), TransportError> {
        if self.listener.read().is_none() {
            return Err(TransportError::Closed {
                topic: self.event.clone(),
            });
        }
        self.target.dispatch(&self.event, message);
        for rejection in self.target.forward(&self.event, message) {
            tracing::debug!("Frame forward ignored: {}", rejection);
        }
        Ok(())
    }

    fn close(&self) {
        if let Some(listener) = self.listener.write().take() {
            self.target.remove_listener(&self.event, listener);
        }
    }
}

impl Drop for LocalEndpoint {
    fn drop(&mut self) {
        self.close();
    }
}
