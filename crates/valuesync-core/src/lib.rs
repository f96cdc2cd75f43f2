//! # ValueSync Core
//!
//! Core types for synchronising calculator widgets.
//! Provides the field catalogue, group and topic addressing, the
//! propagation message, value formatting, summary derivations and the
//! error taxonomy shared by every other crate.

pub mod error;
pub mod field;
pub mod format;
pub mod message;
pub mod summary;
pub mod topic;
pub mod types;

pub use error::{Error, FieldError, GroupError, MessageError, Result, TransportError};
pub use field::{Field, FieldDomain, FieldSpec};
pub use format::{format_currency, format_currency_f64, FormatKind};
pub use message::SyncMessage;
pub use summary::{FieldValues, SummaryKind, SummaryOutcome};
pub use topic::{CalculatorGroup, SenderId, Topic, DEFAULT_GROUP};

pub use types::{thread_safe, ThreadSafe, UpdateCallback};
