//! Addressing: calculator groups, topics and sender identities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::GroupError;
use crate::field::Field;

/// Calculator group used by widgets that were not given one
pub const DEFAULT_GROUP: &str = "dnb-sparekalkulator";

/// Opaque identifier scoping a set of widgets that stay synchronised
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalculatorGroup(String);

impl CalculatorGroup {
    /// Create a group identifier; surrounding whitespace is not significant
    pub fn new(id: impl Into<String>) -> Result<Self, GroupError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(GroupError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The identifier string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CalculatorGroup {
    fn default() -> Self {
        Self(DEFAULT_GROUP.to_string())
    }
}

impl fmt::Display for CalculatorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CalculatorGroup {
    type Error = GroupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CalculatorGroup> for String {
    fn from(group: CalculatorGroup) -> Self {
        group.0
    }
}

/// Propagation address for one field within one group
///
/// Publishers and subscribers meet only through the topic key, so the key
/// format must never change independently on either side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic {
    field: Field,
    group: CalculatorGroup,
    key: String,
}

impl Topic {
    /// Derive the topic for `(field, group)`
    pub fn new(field: Field, group: &CalculatorGroup) -> Self {
        let key = format!("{}_slider_state_{}", field.channel_type(), group.as_str());
        Self {
            field,
            group: group.clone(),
            key,
        }
    }

    /// Field addressed by this topic
    pub fn field(&self) -> Field {
        self.field
    }

    /// Group addressed by this topic
    pub fn group(&self) -> &CalculatorGroup {
        &self.group
    }

    /// Channel name shared by every endpoint on this topic
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Identity of one widget instance, used to suppress self-echo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(Uuid);

impl SenderId {
    /// Create a new unique sender identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SenderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sender({})", &self.0.to_string()[..8])
    }
}
