//! Observable controller state.
//!
//! A [`StateStore`] owns a state value behind a mutex and fans out one
//! [`StateChange`] per field mutation to every subscriber. Notifications are
//! queued while the lock is held, so every subscriber sees mutations in the
//! order they were applied, whichever task applied them.

use std::sync::Mutex;
use tokio::sync::mpsc;

/// Notification for one field mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange<S, F> {
    /// The field that changed.
    pub field: F,
    /// The whole state right after the change.
    pub state: S,
}

struct Inner<S, F> {
    state: S,
    subscribers: Vec<mpsc::UnboundedSender<StateChange<S, F>>>,
}

impl<S: Clone, F: Copy> Inner<S, F> {
    fn notify(&mut self, field: F) {
        let state = &self.state;
        // Receivers that were dropped are forgotten.
        self.subscribers.retain(|tx| {
            tx.send(StateChange {
                field,
                state: state.clone(),
            })
            .is_ok()
        });
    }
}

/// Mutex-guarded state with change subscriptions.
pub struct StateStore<S, F> {
    inner: Mutex<Inner<S, F>>,
}

impl<S: Clone, F: Copy> StateStore<S, F> {
    pub fn new(state: S) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> S {
        self.inner.lock().expect("state lock poisoned").state.clone()
    }

    /// Receive a notification for every mutation made from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StateChange<S, F>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .lock()
            .expect("state lock poisoned")
            .subscribers
            .push(tx);
        rx
    }

    /// Mutate a single field.
    pub fn set(&self, field: F, f: impl FnOnce(&mut S)) {
        self.transaction(|tx| tx.set(field, f));
    }

    /// Run `f` with exclusive access to the state.
    ///
    /// Reads and mutations made through the [`Transaction`] are atomic with
    /// respect to every other store access.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut Transaction<'_, S, F>) -> R) -> R {
        let mut inner = self.inner.lock().expect("state lock poisoned");
        let mut tx = Transaction { inner: &mut *inner };
        f(&mut tx)
    }
}

/// Exclusive access to a [`StateStore`] for the duration of a
/// [`StateStore::transaction`] call.
pub struct Transaction<'a, S, F> {
    inner: &'a mut Inner<S, F>,
}

impl<S: Clone, F: Copy> Transaction<'_, S, F> {
    pub fn state(&self) -> &S {
        &self.inner.state
    }

    /// Apply `f` and notify subscribers that `field` changed.
    pub fn set(&mut self, field: F, f: impl FnOnce(&mut S)) {
        f(&mut self.inner.state);
        self.inner.notify(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        value: u32,
        label: String,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Field {
        Value,
        Label,
    }

    #[test]
    fn test_one_notification_per_mutation_in_order() {
        let store = StateStore::<Counter, Field>::new(Counter::default());
        let mut rx = store.subscribe();

        store.transaction(|tx| {
            tx.set(Field::Value, |s| s.value = 1);
            tx.set(Field::Label, |s| s.label = "one".into());
        });
        store.set(Field::Value, |s| s.value += 1);

        let first = rx.try_recv().unwrap();
        assert_eq!(first.field, Field::Value);
        assert_eq!(first.state.value, 1);
        assert_eq!(first.state.label, "");

        let second = rx.try_recv().unwrap();
        assert_eq!(second.field, Field::Label);
        assert_eq!(second.state.label, "one");

        let third = rx.try_recv().unwrap();
        assert_eq!(third.field, Field::Value);
        assert_eq!(third.state.value, 2);

        assert!(rx.try_recv().is_err());
        assert_eq!(store.snapshot().value, 2);
    }

    #[test]
    fn test_every_subscriber_is_notified() {
        let store = StateStore::<Counter, Field>::new(Counter::default());
        let mut a = store.subscribe();
        let mut b = store.subscribe();

        store.set(Field::Value, |s| s.value = 7);

        assert_eq!(a.try_recv().unwrap().state.value, 7);
        assert_eq!(b.try_recv().unwrap().state.value, 7);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let store = StateStore::<Counter, Field>::new(Counter::default());
        let dropped = store.subscribe();
        let mut kept = store.subscribe();
        drop(dropped);

        store.set(Field::Value, |s| s.value = 3);

        assert_eq!(kept.try_recv().unwrap().field, Field::Value);
        assert_eq!(store.inner.lock().unwrap().subscribers.len(), 1);
    }

    #[test]
    fn test_transaction_reads_without_notifying() {
        let store = StateStore::<Counter, Field>::new(Counter::default());
        let mut rx = store.subscribe();

        let value = store.transaction(|tx| tx.state().value);

        assert_eq!(value, 0);
        assert!(rx.try_recv().is_err());
    }
}
