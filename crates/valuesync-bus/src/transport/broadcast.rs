//! Primary transport: named broadcast channels.
//!
//! A [`BroadcastHub`] is the shared namespace of channel names. Every
//! execution context attached to the same hub (tabs, frames, independent
//! buses) can reach every other one by opening the same topic key. Payloads
//! travel as JSON text, so receivers must tolerate undecodable frames.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use valuesync_core::{SyncMessage, Topic, TransportError};

use super::{Inbound, InboundHandler, PropagationTransport, TransportEndpoint};

/// A frame on a broadcast channel
#[derive(Debug, Clone)]
struct Frame {
    /// Endpoint that posted the frame; zero for foreign posts
    origin: u64,
    /// Transport instance that posted the frame; zero for foreign posts
    context: u64,
    payload: String,
}

/// Shared namespace of broadcast channels
#[derive(Debug)]
pub struct BroadcastHub {
    channels: Mutex<HashMap<String, broadcast::Sender<Frame>>>,
    capacity: usize,
    available: AtomicBool,
    next_id: AtomicU64,
}

impl BroadcastHub {
    /// Create a hub whose channels buffer up to `capacity` frames per receiver
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            available: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
        })
    }

    /// Mark the primitive as present or absent in this environment
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Whether endpoints can currently be opened
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Tear down a channel. Open endpoints observe a fault and posts fail
    /// until a new endpoint recreates the channel.
    pub fn disconnect(&self, key: &str) -> bool {
        let removed = self.channels.lock().remove(key).is_some();
        if removed {
            tracing::debug!("Broadcast channel {} torn down", key);
        }
        removed
    }

    /// Post raw text on a channel as a foreign script would
    pub fn post_raw(&self, key: &str, payload: impl Into<String>) -> usize {
        let sender = self.channels.lock().get(key).cloned();
        sender
            .and_then(|sender| {
                sender
                    .send(Frame {
                        origin: 0,
                        context: 0,
                        payload: payload.into(),
                    })
                    .ok()
            })
            .unwrap_or(0)
    }

    /// Number of live receivers on a channel
    pub fn receiver_count(&self, key: &str) -> usize {
        self.channels
            .lock()
            .get(key)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    fn join(&self, key: &str) -> broadcast::Receiver<Frame> {
        let mut channels = self.channels.lock();
        channels
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    fn sender(&self, key: &str) -> Option<broadcast::Sender<Frame>> {
        self.channels.lock().get(key).cloned()
    }
}

/// [`PropagationTransport`] over a [`BroadcastHub`]
///
/// Each instance is one execution context on the hub.
#[derive(Debug, Clone)]
pub struct BroadcastTransport {
    hub: Arc<BroadcastHub>,
    context: u64,
    skip_own_context: bool,
}

impl BroadcastTransport {
    /// Attach to `hub` as a new context
    pub fn new(hub: Arc<BroadcastHub>) -> Self {
        let context = hub.next_id.fetch_add(1, Ordering::Relaxed);
        Self {
            hub,
            context,
            skip_own_context: false,
        }
    }

    /// Deliver only frames posted by other contexts. Used when a same-context
    /// transport already reaches local peers, so they do not receive every
    /// update a second time, possibly after a newer one.
    pub fn skip_own_context(mut self, skip: bool) -> Self {
        self.skip_own_context = skip;
        self
    }

    /// The hub this transport is attached to
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }
}

impl PropagationTransport for BroadcastTransport {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    fn is_available(&self) -> bool {
        self.hub.is_available()
    }

    fn open(
        &self,
        topic: &Topic,
        handler: InboundHandler,
    ) -> Result<Box<dyn TransportEndpoint>, TransportError> {
        if !self.hub.is_available() {
            return Err(TransportError::Unavailable {
                transport: self.name().to_string(),
            });
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            TransportError::OpenFailed {
                transport: self.name().to_string(),
                topic: topic.key().to_string(),
                reason: e.to_string(),
            }
        })?;

        let id = self.hub.next_id.fetch_add(1, Ordering::Relaxed);
        let receiver = self.hub.join(topic.key());
        let skip_context = self.skip_own_context.then_some(self.context);
        let task = runtime.spawn(receive_loop(
            id,
            skip_context,
            topic.key().to_string(),
            receiver,
            handler,
        ));

        tracing::trace!("Broadcast endpoint {} opened on {}", id, topic);
        Ok(Box::new(BroadcastEndpoint {
            id,
            context: self.context,
            key: topic.key().to_string(),
            hub: Arc::clone(&self.hub),
            task: Mutex::new(Some(task)),
        }))
    }
}

async fn receive_loop(
    id: u64,
    skip_context: Option<u64>,
    key: String,
    mut receiver: broadcast::Receiver<Frame>,
    handler: InboundHandler,
) {
    loop {
        match receiver.recv().await {
            Ok(frame) if frame.origin == id => continue,
            Ok(frame) if Some(frame.context) == skip_context => continue,
            Ok(frame) => match SyncMessage::decode(&frame.payload) {
                Ok(message) => handler(Inbound::Message(message)),
                Err(err) => handler(Inbound::Malformed(err)),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Endpoint {} on {} lagged, {} frames dropped", id, key, skipped);
            }
            Err(broadcast::error::RecvError::Closed) => {
                handler(Inbound::Fault(TransportError::Closed { topic: key }));
                break;
            }
        }
    }
}

struct BroadcastEndpoint {
    id: u64,
    context: u64,
    key: String,
    hub: Arc<BroadcastHub>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TransportEndpoint for BroadcastEndpoint {
    fn post(&self, message: &SyncMessage) -> Result<(), TransportError> {
        if self.task.lock().is_none() {
            return Err(TransportError::Closed {
                topic: self.key.clone(),
            });
        }
        let sender = self.hub.sender(&self.key).ok_or_else(|| TransportError::SendFailed {
            topic: self.key.clone(),
            reason: "channel no longer exists".to_string(),
        })?;
        // Posting with no other listener is not an error
        let _ = sender.send(Frame {
            origin: self.id,
            context: self.context,
            payload: message.encode(),
        });
        Ok(())
    }

    fn close(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            tracing::trace!("Broadcast endpoint {} closed on {}", self.id, self.key);
        }
    }
}

impl Drop for BroadcastEndpoint {
    fn drop(&mut self) {
        self.close();
    }
}
