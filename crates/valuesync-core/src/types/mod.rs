//! Type system utilities and aliases.
//!
//! ## Modules
//!
//! - [`aliases`]: Type aliases for `Arc<Mutex<T>>` and update callbacks

pub mod aliases;

pub use aliases::*;
