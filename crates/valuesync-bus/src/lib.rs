//! # ValueSync Bus
//!
//! Best-effort propagation of calculator field values between widget
//! instances that never reference each other.
//!
//! ## Overview
//!
//! - Every `(field, group)` pair maps to a [`Topic`]; publishers and
//!   subscribers meet only through its key
//! - Updates travel over a primary transport and, in parallel, a fallback
//!   transport carrying the identical payload
//! - Subscribers never see their own publishes and treat the latest arrival
//!   as authoritative
//! - Transport faults are logged and retried, never surfaced to widgets
//!
//! ## Usage
//!
//! ```rust,ignore
//! use valuesync_bus::ValueSyncBus;
//! use valuesync_core::{CalculatorGroup, Field};
//!
//! let bus = ValueSyncBus::new();
//! let group = CalculatorGroup::new("calc-a")?;
//!
//! let summary = bus.client();
//! let subscription = summary.subscribe(Field::Income, &group, |field, value| {
//!     println!("{field} is now {value}");
//! });
//!
//! let input = bus.client();
//! input.publish(Field::Income, &group, 2_000_000);
//!
//! subscription.dispose();
//! ```
//!
//! [`Topic`]: valuesync_core::Topic

mod bus;
mod client;
mod link;
pub mod registry;
pub mod transport;

pub use bus::{init_sync_bus, sync_bus, BusConfig, ValueSyncBus};
pub use client::{Subscription, SyncClient};
pub use registry::{GroupLease, GroupRegistry};
pub use transport::{
    BroadcastHub, BroadcastTransport, EventTarget, Inbound, InboundHandler, LocalEventTransport,
    PropagationTransport, TransportEndpoint,
};
