//! Group registry
//!
//! Tracks, per execution context, which calculator groups are in use, the
//! latest value observed for each of their fields, and which sender holds
//! the publisher role for each field. A group entry is created when the first
//! lease for it is taken and torn down when the last lease is dropped, so no
//! state outlives the widgets that reference it.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use valuesync_core::{CalculatorGroup, Field, FieldValues, SenderId};

#[derive(Debug, Default)]
struct GroupState {
    leases: usize,
    values: FieldValues,
    publishers: HashMap<Field, SenderId>,
}

/// Registry of live calculator groups
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: Mutex<HashMap<CalculatorGroup, GroupState>>,
}

impl GroupRegistry {
    /// Create an empty registry
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take a lease on `group`, creating its entry if needed
    pub fn join(self: &Arc<Self>, group: &CalculatorGroup) -> GroupLease {
        let mut groups = self.groups.lock();
        let state = groups.entry(group.clone()).or_insert_with(|| {
            tracing::debug!("Calculator group {} created", group);
            GroupState::default()
        });
        state.leases += 1;
        GroupLease {
            registry: Arc::downgrade(self),
            group: group.clone(),
        }
    }

    fn leave(&self, group: &CalculatorGroup) {
        let mut groups = self.groups.lock();
        let Some(state) = groups.get_mut(group) else {
            return;
        };
        state.leases = state.leases.saturating_sub(1);
        if state.leases == 0 {
            groups.remove(group);
            tracing::debug!("Calculator group {} torn down", group);
        }
    }

    /// Latest value observed for `(field, group)`, if any
    pub fn current(&self, field: Field, group: &CalculatorGroup) -> Option<i64> {
        self.groups
            .lock()
            .get(group)
            .and_then(|state| state.values.get(field))
    }

    /// All values observed for `group`
    pub fn snapshot(&self, group: &CalculatorGroup) -> FieldValues {
        self.groups
            .lock()
            .get(group)
            .map(|state| state.values.clone())
            .unwrap_or_default()
    }

    /// Record an observed value; ignored for groups nobody holds a lease on
    pub fn record(&self, field: Field, group: &CalculatorGroup, value: i64) {
        if let Some(state) = self.groups.lock().get_mut(group) {
            state.values.set(field, value);
        }
    }

    /// Claim the publisher role for `(field, group)`.
    ///
    /// Returns true if `sender` now holds the role (including when it already
    /// did). Fails for groups nobody holds a lease on.
    pub fn claim_publisher(&self, field: Field, group: &CalculatorGroup, sender: SenderId) -> bool {
        let mut groups = self.groups.lock();
        let Some(state) = groups.get_mut(group) else {
            return false;
        };
        let holder = *state.publishers.entry(field).or_insert(sender);
        holder == sender
    }

    /// Release the publisher role for `(field, group)` if `sender` holds it
    pub fn release_publisher(&self, field: Field, group: &CalculatorGroup, sender: SenderId) {
        if let Some(state) = self.groups.lock().get_mut(group) {
            if state.publishers.get(&field) == Some(&sender) {
                state.publishers.remove(&field);
            }
        }
    }

    /// Current holder of the publisher role for `(field, group)`
    pub fn publisher(&self, field: Field, group: &CalculatorGroup) -> Option<SenderId> {
        self.groups
            .lock()
            .get(group)
            .and_then(|state| state.publishers.get(&field).copied())
    }

    /// Number of live groups
    pub fn group_count(&self) -> usize {
        self.groups.lock().len()
    }

    /// Number of leases held on `group`
    pub fn lease_count(&self, group: &CalculatorGroup) -> usize {
        self.groups
            .lock()
            .get(group)
            .map(|state| state.leases)
            .unwrap_or(0)
    }
}

/// Keeps a group alive in its registry until dropped
#[derive(Debug)]
pub struct GroupLease {
    registry: Weak<GroupRegistry>,
    group: CalculatorGroup,
}

impl GroupLease {
    /// Group this lease belongs to
    pub fn group(&self) -> &CalculatorGroup {
        &self.group
    }
}

impl Drop for GroupLease {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.leave(&self.group);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn group(id: &str) -> CalculatorGroup {
        CalculatorGroup::new(id).expect("valid group")
    }

    #[test]
    fn test_group_lifecycle() {
        let registry = GroupRegistry::new();
        let a = group("a");

        let first = registry.join(&a);
        let second = registry.join(&a);
        assert_eq!(registry.group_count(), 1);
        assert_eq!(registry.lease_count(&a), 2);

        registry.record(Field::Debt, &a, 25_000);
        drop(first);
        assert_eq!(registry.current(Field::Debt, &a), Some(25_000));

        drop(second);
        assert_eq!(registry.group_count(), 0);
        assert_eq!(registry.current(Field::Debt, &a), None);
    }

    #[test]
    fn test_record_without_lease_is_ignored() {
        let registry = GroupRegistry::new();
        registry.record(Field::Debt, &group("ghost"), 1);
        assert_eq!(registry.group_count(), 0);
    }

    #[test]
    fn test_publisher_claims() {
        let registry = GroupRegistry::new();
        let a = group("a");
        let _lease = registry.join(&a);
        let first = SenderId::new();
        let second = SenderId::new();

        assert!(registry.claim_publisher(Field::Income, &a, first));
        assert!(registry.claim_publisher(Field::Income, &a, first));
        assert!(!registry.claim_publisher(Field::Income, &a, second));
        assert!(registry.claim_publisher(Field::Debt, &a, second));

        registry.release_publisher(Field::Income, &a, second);
        assert_eq!(registry.publisher(Field::Income, &a), Some(first));
        registry.release_publisher(Field::Income, &a, first);
        assert_eq!(registry.publisher(Field::Income, &a), None);
        assert!(registry.claim_publisher(Field::Income, &a, second));
    }

    proptest! {
        #[test]
        fn prop_latest_record_wins(
            writes in proptest::collection::vec((0usize..5, 0i64..1_000_000), 1..40)
        ) {
            let registry = GroupRegistry::new();
            let a = group("a");
            let _lease = registry.join(&a);

            for &(index, value) in &writes {
                registry.record(Field::ALL[index], &a, value);
            }
            for (index, field) in Field::ALL.into_iter().enumerate() {
                let last = writes.iter().rev().find(|(i, _)| *i == index).map(|(_, v)| *v);
                prop_assert_eq!(registry.current(field, &a), last);
            }
        }
    }

    #[test]
    fn test_groups_are_isolated() {
        let registry = GroupRegistry::new();
        let (a, b) = (group("a"), group("b"));
        let _la = registry.join(&a);
        let _lb = registry.join(&b);

        registry.record(Field::Equity, &a, 100_000);
        assert_eq!(registry.current(Field::Equity, &b), None);
        assert_eq!(registry.snapshot(&a).get(Field::Equity), Some(100_000));
    }
}
