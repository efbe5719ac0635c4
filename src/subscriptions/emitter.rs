//! Typed, single-threaded event channel.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::types::{Subscription, SubscriptionId};

/// A registered listener.
struct Listener<E> {
    id: SubscriptionId,
    /// Cleared on disposal so an in-flight dispatch skips it.
    active: Cell<bool>,
    callback: Box<dyn Fn(&E)>,
}

struct EmitterInner<E> {
    listeners: RefCell<Vec<Rc<Listener<E>>>>,
    next_id: Cell<u64>,
    closed: Cell<bool>,
}

impl<E> EmitterInner<E> {
    fn remove(&self, id: SubscriptionId) {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            listeners
                .iter()
                .position(|l| l.id == id)
                .map(|pos| listeners.remove(pos))
        };
        if let Some(listener) = removed {
            listener.active.set(false);
        }
    }
}

/// Multi-subscriber notification channel.
///
/// Listeners run synchronously, in subscription order, on the emitting
/// thread. Dispatch walks a snapshot of the listener list, so listeners may
/// subscribe or dispose (themselves or others) while an event is in flight:
/// a disposed listener that has not run yet is skipped, and a listener added
/// mid-dispatch first sees the next event.
///
/// Clones share the same listener list.
pub struct Emitter<E> {
    inner: Rc<EmitterInner<E>>,
}

impl<E: 'static> Emitter<E> {
    /// Create an open emitter with no listeners.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(EmitterInner {
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                closed: Cell::new(false),
            }),
        }
    }

    /// Register a listener.
    ///
    /// On a closed emitter this returns an already-disposed handle and the
    /// callback is dropped.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        if self.inner.closed.get() {
            tracing::debug!("subscribe on closed emitter ignored");
            return Subscription::inert();
        }

        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        self.inner.listeners.borrow_mut().push(Rc::new(Listener {
            id,
            active: Cell::new(true),
            callback: Box::new(callback),
        }));

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove(id);
            }
        })
    }

    /// Deliver an event to every listener registered before this call.
    pub fn emit(&self, event: &E) {
        if self.inner.closed.get() {
            return;
        }

        let snapshot: Vec<Rc<Listener<E>>> = self.inner.listeners.borrow().clone();
        for listener in snapshot {
            if self.inner.closed.get() {
                break;
            }
            if listener.active.get() {
                (listener.callback)(event);
            }
        }
    }

    /// Drop every listener and refuse new ones. Idempotent.
    pub fn close(&self) {
        self.inner.closed.set(true);
        let listeners = self.inner.listeners.take();
        for listener in &listeners {
            listener.active.set(false);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl<E: 'static> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.inner.listeners.borrow().len())
            .field("closed", &self.inner.closed.get())
            .finish()
    }
}
