//! Error handling for ValueSync
//!
//! Provides the error taxonomy for every layer of the synchronisation stack:
//! - Field errors (unknown identifiers, invalid ranges)
//! - Group errors (calculator group identifiers)
//! - Message errors (malformed inbound payloads)
//! - Transport errors (propagation primitives)
//!
//! None of these are surfaced to the widget layer by the bus; they exist so
//! transports and decoders can report precisely what was swallowed.

use thiserror::Error;

/// Field error type
///
/// Represents errors related to the fixed field catalogue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Identifier does not name a known field
    #[error("Unknown field: {id}")]
    UnknownField {
        /// The identifier that was not recognised.
        id: String,
    },

    /// A custom range does not fit the field's domain
    #[error("Invalid range for {field}: {reason}")]
    InvalidRange {
        /// The field identifier.
        field: String,
        /// Why the range was rejected.
        reason: String,
    },

    /// Identifier does not name a known summary
    #[error("Unknown summary type: {id}")]
    UnknownSummary {
        /// The identifier that was not recognised.
        id: String,
    },
}

/// Calculator group error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupError {
    /// Group identifiers must contain at least one non-whitespace character
    #[error("Calculator group identifier must not be empty")]
    Empty,
}

/// Message error type
///
/// Represents an inbound propagation payload that cannot be applied.
/// Receivers drop these without affecting their cached state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Payload could not be decoded
    #[error("Undecodable payload: {reason}")]
    Undecodable {
        /// Decoder diagnostic.
        reason: String,
    },

    /// Message type does not map to any field
    #[error("Unknown message type: {message_type}")]
    UnknownMessageType {
        /// The unrecognised message type.
        message_type: String,
    },

    /// Message arrived on a topic it does not belong to
    #[error("Message for {message_type}/{group} delivered on topic {topic}")]
    TopicMismatch {
        /// Message type carried by the payload.
        message_type: String,
        /// Group carried by the payload.
        group: String,
        /// Topic key the payload arrived on.
        topic: String,
    },

    /// Value is outside the field's domain
    #[error("Value {value} outside domain [{min}, {max}] of {field}")]
    OutOfDomain {
        /// The field identifier.
        field: String,
        /// The offending value.
        value: i64,
        /// Domain lower bound.
        min: i64,
        /// Domain upper bound.
        max: i64,
    },
}

/// Transport error type
///
/// Represents faults of a propagation transport. The bus retries setup
/// failures and drops send failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The environment lacks this propagation primitive
    #[error("Transport {transport} unavailable")]
    Unavailable {
        /// Transport name.
        transport: String,
    },

    /// Endpoint could not be created
    #[error("Failed to open {transport} endpoint on {topic}: {reason}")]
    OpenFailed {
        /// Transport name.
        transport: String,
        /// Topic key.
        topic: String,
        /// Failure diagnostic.
        reason: String,
    },

    /// Message could not be posted
    #[error("Failed to send on {topic}: {reason}")]
    SendFailed {
        /// Topic key.
        topic: String,
        /// Failure diagnostic.
        reason: String,
    },

    /// Endpoint was closed underneath its owner
    #[error("Endpoint on {topic} is closed")]
    Closed {
        /// Topic key.
        topic: String,
    },

    /// A frame boundary refused the notification
    #[error("Cross-origin frame rejected notification on {topic}")]
    CrossOrigin {
        /// Topic key.
        topic: String,
    },
}

impl TransportError {
    /// Whether the bus should attempt to re-establish the endpoint
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TransportError::OpenFailed { .. }
                | TransportError::SendFailed { .. }
                | TransportError::Closed { .. }
        )
    }
}

/// Main error type for ValueSync
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Field error
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Group error
    #[error(transparent)]
    Group(#[from] GroupError),

    /// Message error
    #[error(transparent)]
    Message(#[from] MessageError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a transport error
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if this is a malformed message
    pub fn is_message_error(&self) -> bool {
        matches!(self, Error::Message(_))
    }

    /// Check if this is a field error
    pub fn is_field_error(&self) -> bool {
        matches!(self, Error::Field(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
