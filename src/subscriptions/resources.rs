//! Per-entry resource bookkeeping behind `manage_each_entry`.

use std::cell::{Cell, RefCell};

use super::types::Subscription;

/// Cleanup action returned by a resource setup function.
pub(crate) type Cleanup = Box<dyn FnOnce()>;

/// Cleanups keyed by entry, plus the listeners that feed them.
///
/// Each cleanup is taken out of the table before it runs, so it runs at most
/// once even if a cleanup removes further entries.
pub(crate) struct ManagedResources<T> {
    cleanups: RefCell<Vec<(T, Cleanup)>>,
    listeners: RefCell<Vec<Subscription>>,
    released: Cell<bool>,
}

impl<T: PartialEq> ManagedResources<T> {
    pub(crate) fn new() -> Self {
        Self {
            cleanups: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            released: Cell::new(false),
        }
    }

    /// Record the cleanup for an entry. After `release_all` the cleanup runs
    /// immediately instead.
    pub(crate) fn track(&self, entry: T, cleanup: Cleanup) {
        if self.released.get() {
            cleanup();
            return;
        }
        self.cleanups.borrow_mut().push((entry, cleanup));
    }

    /// Keep a listener alive until `release_all`.
    pub(crate) fn hold(&self, subscription: Subscription) {
        if self.released.get() {
            subscription.dispose();
            return;
        }
        self.listeners.borrow_mut().push(subscription);
    }

    /// Run the cleanup for one entry, if it has one.
    pub(crate) fn release(&self, entry: &T) {
        let cleanup = {
            let mut cleanups = self.cleanups.borrow_mut();
            cleanups
                .iter()
                .position(|(tracked, _)| tracked == entry)
                .map(|pos| cleanups.remove(pos))
        };
        if let Some((_, cleanup)) = cleanup {
            cleanup();
        }
    }

    /// Stop listening and run every outstanding cleanup. Idempotent.
    pub(crate) fn release_all(&self) {
        self.released.set(true);
        for subscription in self.listeners.take() {
            subscription.dispose();
        }
        for (_, cleanup) in self.cleanups.take() {
            cleanup();
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_count(&self) -> usize {
        self.cleanups.borrow().len()
    }
}
