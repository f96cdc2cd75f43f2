//! Type aliases for commonly used complex types.
//!
//! Widgets and bus internals share state across tokio tasks, so every
//! shared wrapper here is thread-safe and built on `parking_lot`.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::field::Field;

/// A thread-safe, mutex-protected wrapper for cross-task sharing.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// Callback invoked with a field's newly received value.
pub type UpdateCallback = Arc<dyn Fn(Field, i64) + Send + Sync>;

/// Create a new `ThreadSafe<T>` from a value.
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_safe() {
        let counter: ThreadSafe<i32> = thread_safe(0);
        let clone = Arc::clone(&counter);
        *clone.lock() += 1;
        assert_eq!(*counter.lock(), 1);
    }
}
