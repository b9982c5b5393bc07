use crate::message::MessageId;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Tracks the messages that currently have an enrichment pass outstanding.
///
/// `try_admit` and `release` bracket a pass: an identity sits in the set iff
/// a pass for it is in flight. Callable from any number of concurrent
/// completion tasks.
#[derive(Debug, Default)]
pub struct InFlightGuard {
    inner: Mutex<HashSet<MessageId>>,
}

impl InFlightGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically admit `id` unless a pass for it is already outstanding.
    ///
    /// Returns false and changes nothing on contention.
    pub fn try_admit(&self, id: &MessageId) -> bool {
        self.lock().insert(id.clone())
    }

    /// Remove `id` from the in-flight set.
    ///
    /// Idempotent: releasing an identity that was never admitted (or was
    /// already released) is a no-op.
    pub fn release(&self, id: &MessageId) {
        self.lock().remove(id);
    }

    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.lock().contains(id)
    }

    /// Number of passes currently outstanding.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<MessageId>> {
        // Insert/remove cannot leave the set half-updated, so a lock
        // poisoned by a panicking holder is still safe to reuse.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::InFlightGuard;
    use crate::message::MessageId;

    #[test]
    fn admits_each_identity_once() {
        let guard = InFlightGuard::new();
        let id = MessageId::new("m1");

        assert!(guard.try_admit(&id));
        assert!(!guard.try_admit(&id));
        assert!(guard.contains(&id));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn release_makes_identity_admittable_again() {
        let guard = InFlightGuard::new();
        let id = MessageId::new("m1");

        assert!(guard.try_admit(&id));
        guard.release(&id);
        assert!(!guard.contains(&id));
        assert!(guard.try_admit(&id));
    }

    #[test]
    fn release_is_idempotent_and_tolerates_unknown_ids() {
        let guard = InFlightGuard::new();
        let id = MessageId::new("never-admitted");

        guard.release(&id);
        guard.release(&id);
        assert!(guard.is_empty());

        assert!(guard.try_admit(&id));
        guard.release(&id);
        guard.release(&id);
        assert!(guard.is_empty());
    }

    #[test]
    fn distinct_identities_do_not_contend() {
        let guard = InFlightGuard::new();
        assert!(guard.try_admit(&MessageId::new("a")));
        assert!(guard.try_admit(&MessageId::new("b")));
        assert_eq!(guard.len(), 2);
    }

    #[test]
    fn concurrent_admits_of_one_identity_win_exactly_once() {
        let guard = InFlightGuard::new();
        let id = MessageId::new("contended");

        let admitted = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| scope.spawn(|| guard.try_admit(&id)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("thread panicked"))
                .filter(|won| *won)
                .count()
        });

        assert_eq!(admitted, 1);
        assert_eq!(guard.len(), 1);
    }
}
