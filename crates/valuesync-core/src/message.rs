//! Propagation message
//!
//! The transport-agnostic payload exchanged between widget instances. Both
//! the primary and the fallback transports carry exactly this shape.

use serde::{Deserialize, Serialize};

use crate::error::MessageError;
use crate::field::Field;
use crate::topic::{CalculatorGroup, SenderId, Topic};

/// A field update as seen on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMessage {
    /// Derived from the field, see [`Field::message_type`]
    pub message_type: String,
    /// Published value, already clamped by the sender
    pub value: i64,
    /// Publishing widget instance
    pub sender_id: SenderId,
    /// Calculator group identifier
    pub group: String,
}

impl SyncMessage {
    /// Build an update for `field`, clamping `value` into the field's domain
    pub fn update(field: Field, group: &CalculatorGroup, value: i64, sender_id: SenderId) -> Self {
        Self {
            message_type: field.message_type(),
            value: field.clamp(value),
            sender_id,
            group: group.as_str().to_string(),
        }
    }

    /// Field named by the message type
    pub fn field(&self) -> Result<Field, MessageError> {
        Field::from_message_type(&self.message_type).ok_or_else(|| {
            MessageError::UnknownMessageType {
                message_type: self.message_type.clone(),
            }
        })
    }

    /// Check that this message may be applied on `topic` and return its value
    pub fn value_for(&self, topic: &Topic) -> Result<i64, MessageError> {
        let field = self.field()?;
        if field != topic.field() || self.group != topic.group().as_str() {
            return Err(MessageError::TopicMismatch {
                message_type: self.message_type.clone(),
                group: self.group.clone(),
                topic: topic.key().to_string(),
            });
        }
        let domain = field.domain();
        if !domain.contains(self.value) {
            return Err(MessageError::OutOfDomain {
                field: field.id().to_string(),
                value: self.value,
                min: domain.min,
                max: domain.max,
            });
        }
        Ok(self.value)
    }

    /// Serialise to the JSON text carried by string-based transports
    pub fn encode(&self) -> String {
        // Plain struct of strings and integers: serialisation cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse JSON text received from a string-based transport
    pub fn decode(raw: &str) -> Result<Self, MessageError> {
        serde_json::from_str(raw).map_err(|e| MessageError::Undecodable {
            reason: e.to_string(),
        })
    }
}
