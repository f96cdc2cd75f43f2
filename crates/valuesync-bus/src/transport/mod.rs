//! Propagation transports
//!
//! A transport moves [`SyncMessage`]s between every endpoint opened on the
//! same topic. The bus composes two of them:
//! - a primary transport ([`BroadcastTransport`]) shared by every execution
//!   context attached to the same hub
//! - a fallback transport ([`LocalEventTransport`]) that notifies listeners
//!   of the same event target and, across a frame boundary, its parent and
//!   child targets
//!
//! Endpoints never receive their own primary posts, and a primary transport
//! can be told to ignore posts from its own context. Fallback dispatch does
//! reach the poster, so receivers filter by sender identity.

mod broadcast;
mod local;

pub use broadcast::{BroadcastHub, BroadcastTransport};
pub use local::{EventTarget, LocalEventTransport};

use std::sync::Arc;
use valuesync_core::{MessageError, SyncMessage, Topic, TransportError};

/// Something arriving at an endpoint
#[derive(Debug, Clone)]
pub enum Inbound {
    /// A decoded update
    Message(SyncMessage),
    /// A payload that could not be decoded
    Malformed(MessageError),
    /// The endpoint failed and will not deliver further messages
    Fault(TransportError),
}

/// Callback receiving everything that arrives at an endpoint
pub type InboundHandler = Arc<dyn Fn(Inbound) + Send + Sync>;

/// A propagation primitive
pub trait PropagationTransport: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether the environment provides this primitive at all
    fn is_available(&self) -> bool {
        true
    }

    /// Open an endpoint on `topic` delivering inbound traffic to `handler`
    fn open(
        &self,
        topic: &Topic,
        handler: InboundHandler,
    ) -> Result<Box<dyn TransportEndpoint>, TransportError>;
}

/// One open connection to a topic
pub trait TransportEndpoint: Send + Sync {
    /// Post a message to every other endpoint on the topic
    fn post(&self, message: &SyncMessage) -> Result<(), TransportError>;

    /// Stop delivering and release the underlying resource; idempotent
    fn close(&self);
}
