//! Subscription handles and the entry destruction signal.

use std::cell::RefCell;
use std::fmt;

use super::emitter::Emitter;

/// Unique identifier for a listener within one emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to a registered listener (or any other releasable resource).
///
/// Dropping the handle disposes it. `dispose` runs the release action at
/// most once and may be called from inside an event callback.
#[must_use = "dropping a Subscription disposes it immediately"]
pub struct Subscription {
    disposer: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    /// Wrap a release action.
    pub fn new(disposer: impl FnOnce() + 'static) -> Self {
        Self {
            disposer: RefCell::new(Some(Box::new(disposer))),
        }
    }

    /// A handle that is already disposed.
    pub fn inert() -> Self {
        Self {
            disposer: RefCell::new(None),
        }
    }

    /// Run the release action if it has not run yet.
    pub fn dispose(&self) {
        let disposer = self.disposer.borrow_mut().take();
        if let Some(disposer) = disposer {
            disposer();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposer.borrow().is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// One-shot "this entry is going away" notification an entry can expose.
///
/// Clones share state. After [`notify`](Self::notify) the signal is spent:
/// later listeners are refused and later notifications do nothing.
#[derive(Clone, Default)]
pub struct DestructionSignal {
    emitter: Emitter<()>,
}

impl DestructionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for the destruction notification.
    pub fn on_did_destroy(&self, callback: impl Fn() + 'static) -> Subscription {
        self.emitter.subscribe(move |_| callback())
    }

    /// Fire the notification once, then release every listener.
    pub fn notify(&self) {
        if self.emitter.is_closed() {
            return;
        }
        self.emitter.emit(&());
        self.emitter.close();
    }

    pub fn is_notified(&self) -> bool {
        self.emitter.is_closed()
    }

    /// Number of callbacks still waiting for the notification.
    pub fn listener_count(&self) -> usize {
        self.emitter.listener_count()
    }
}

impl fmt::Debug for DestructionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestructionSignal")
            .field("notified", &self.is_notified())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
