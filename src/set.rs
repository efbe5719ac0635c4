//! The selection-tracking ordered set.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{Result, SetError};
use crate::snapshot::{validate_layout, SetSnapshot};
use crate::subscriptions::resources::ManagedResources;
use crate::subscriptions::{Emitter, Subscription};
use crate::types::{SetConfig, SetEntry, SetEvent};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

struct SetState<T> {
    entries: Vec<T>,
    /// `None` exactly when `entries` is empty.
    selected: Option<usize>,
}

struct SetInner<T> {
    state: RefCell<SetState<T>>,
    alive: Cell<bool>,
    transaction_depth: Cell<usize>,
    /// Dirty flag for `EntriesChanged`, cleared when the outermost
    /// transaction flushes.
    entries_changed: Cell<bool>,
    /// Non-zero while a listener is running.
    emit_depth: Cell<usize>,
    emitter: Emitter<SetEvent<T>>,
    destruction_subscriptions: RefCell<Vec<(T, Subscription)>>,
    managed: RefCell<Vec<Rc<ManagedResources<T>>>>,
    diagnostics: Rc<dyn DiagnosticSink>,
}

impl<T> Drop for SetInner<T> {
    fn drop(&mut self) {
        // Entry signals outlive the set; don't leave callbacks behind on them.
        for (_, subscription) in self.destruction_subscriptions.get_mut().drain(..) {
            subscription.dispose();
        }
    }
}

/// Increments a counter for the lifetime of the guard, unwinding included.
struct DepthGuard<'a>(&'a Cell<usize>);

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

/// An ordered, duplicate-free collection with exactly one selected entry
/// whenever it is non-empty.
///
/// The set is a single-threaded handle; clones alias the same set. All
/// mutators run inside a transaction: `EntryAdded`/`EntryRemoved` fire at the
/// moment of mutation, while `EntriesChanged`/`SelectedEntryChanged` fire at
/// most once, when the outermost transaction completes. Wrap several calls in
/// [`transact`](Self::transact) to coalesce their bulk events.
///
/// Entries that expose a [`DestructionSignal`](crate::DestructionSignal) are
/// removed automatically when the signal fires.
pub struct SelectionOrderedSet<T: SetEntry> {
    inner: Rc<SetInner<T>>,
}

impl<T: SetEntry> SelectionOrderedSet<T> {
    /// Create an empty set with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SetConfig::default())
    }

    /// Create an empty set.
    pub fn with_config(config: SetConfig) -> Self {
        Self::build(config, Vec::new(), None)
    }

    /// Create a set holding `entries` with `selected_index` selected.
    ///
    /// The selection must be `Some` with a valid index exactly when
    /// `entries` is non-empty, and entries must be distinct.
    pub fn from_entries(entries: Vec<T>, selected_index: Option<usize>) -> Result<Self> {
        Self::from_entries_with_config(SetConfig::default(), entries, selected_index)
    }

    pub fn from_entries_with_config(
        config: SetConfig,
        entries: Vec<T>,
        selected_index: Option<usize>,
    ) -> Result<Self> {
        validate_layout(&entries, selected_index)?;

        let set = Self::build(config, entries, selected_index);
        for entry in set.entries() {
            set.watch_destruction(&entry);
        }
        Ok(set)
    }

    /// Rebuild a set from its persisted form.
    pub fn from_snapshot(snapshot: SetSnapshot<T>) -> Result<Self> {
        Self::from_entries(snapshot.entries, snapshot.selected_index)
    }

    /// Rebuild a set from a snapshot of entry representations.
    pub fn from_snapshot_with<R>(
        config: SetConfig,
        snapshot: SetSnapshot<R>,
        decode: impl FnMut(R) -> Result<T>,
    ) -> Result<Self> {
        let snapshot = snapshot.try_map(decode)?;
        Self::from_entries_with_config(config, snapshot.entries, snapshot.selected_index)
    }

    fn build(config: SetConfig, entries: Vec<T>, selected: Option<usize>) -> Self {
        Self {
            inner: Rc::new(SetInner {
                state: RefCell::new(SetState { entries, selected }),
                alive: Cell::new(true),
                transaction_depth: Cell::new(0),
                entries_changed: Cell::new(false),
                emit_depth: Cell::new(0),
                emitter: Emitter::new(),
                destruction_subscriptions: RefCell::new(Vec::new()),
                managed: RefCell::new(Vec::new()),
                diagnostics: config.diagnostics,
            }),
        }
    }

    // --- Queries ---

    pub fn len(&self) -> usize {
        self.inner.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.borrow().entries.is_empty()
    }

    /// Owned copy of the entries, in order.
    pub fn entries(&self) -> Vec<T> {
        self.inner.state.borrow().entries.clone()
    }

    /// `None` exactly when the set is empty.
    pub fn selected_index(&self) -> Option<usize> {
        self.inner.state.borrow().selected
    }

    pub fn selected_entry(&self) -> Option<T> {
        let state = self.inner.state.borrow();
        state.selected.map(|index| state.entries[index].clone())
    }

    pub fn includes(&self, entry: &T) -> bool {
        self.index_of(entry).is_some()
    }

    pub fn index_of(&self, entry: &T) -> Option<usize> {
        self.inner
            .state
            .borrow()
            .entries
            .iter()
            .position(|e| e == entry)
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.get()
    }

    pub fn is_destroyed(&self) -> bool {
        !self.inner.alive.get()
    }

    /// True while one of this set's listeners is running.
    pub fn is_emitting(&self) -> bool {
        self.inner.emit_depth.get() > 0
    }

    pub fn is_in_transaction(&self) -> bool {
        self.inner.transaction_depth.get() > 0
    }

    /// Persisted form of the set.
    pub fn snapshot(&self) -> SetSnapshot<T> {
        let state = self.inner.state.borrow();
        SetSnapshot::new(state.entries.clone(), state.selected)
    }

    /// Persisted form with each entry converted by `encode`.
    pub fn snapshot_with<R>(&self, encode: impl FnMut(&T) -> R) -> SetSnapshot<R> {
        let state = self.inner.state.borrow();
        SetSnapshot::new(state.entries.iter().map(encode).collect(), state.selected)
    }

    // --- Mutation ---

    /// Append an entry. Returns its index.
    pub fn add(&self, entry: T) -> Result<usize> {
        let len = self.len();
        self.add_at(entry, len)
    }

    /// Insert an entry at `index`, shifting later entries right.
    ///
    /// The selected entry stays selected; adding to an empty set selects the
    /// new entry.
    pub fn add_at(&self, entry: T, index: usize) -> Result<usize> {
        self.begin_mutation("add_at");

        {
            let state = self.inner.state.borrow();
            if let Some(existing) = state.entries.iter().position(|e| e == &entry) {
                return Err(SetError::DuplicateEntry { index: existing });
            }
            if index > state.entries.len() {
                return Err(SetError::IndexOutOfRange {
                    index,
                    len: state.entries.len(),
                });
            }
        }

        self.transact(|| self.insert(entry, index));
        Ok(index)
    }

    /// Remove an entry if present. Returns whether anything was removed.
    pub fn remove(&self, entry: &T) -> bool {
        self.assert_alive("remove");
        match self.index_of(entry) {
            Some(index) => self.remove_at(index).is_ok(),
            None => false,
        }
    }

    /// Remove and return the entry at `index`.
    ///
    /// If the selected entry is removed, the selection moves to the entry
    /// that slides into its slot, or to the new last entry.
    pub fn remove_at(&self, index: usize) -> Result<T> {
        self.begin_mutation("remove_at");

        let len = self.len();
        if index >= len {
            return Err(SetError::IndexOutOfRange { index, len });
        }

        Ok(self.transact(|| self.detach(index)))
    }

    /// Select the given entry.
    pub fn select(&self, entry: &T) -> Result<()> {
        let index = self.index_of(entry).ok_or(SetError::EntryNotFound)?;
        self.select_at(index)
    }

    /// Select the entry at `index`. Re-selecting the current index is a no-op.
    pub fn select_at(&self, index: usize) -> Result<()> {
        self.begin_mutation("select_at");

        if self.selected_index() == Some(index) {
            return Ok(());
        }
        let len = self.len();
        if index >= len {
            return Err(SetError::IndexOutOfRange { index, len });
        }

        self.transact(|| self.move_selection(index));
        Ok(())
    }

    /// Move the selection one step forward, wrapping at the end.
    pub fn select_next(&self) {
        self.begin_mutation("select_next");

        let (selected, len) = {
            let state = self.inner.state.borrow();
            (state.selected, state.entries.len())
        };
        if let Some(current) = selected {
            self.transact(|| self.move_selection((current + 1) % len));
        }
    }

    /// Move the selection one step back, wrapping at the start.
    pub fn select_previous(&self) {
        self.begin_mutation("select_previous");

        let (selected, len) = {
            let state = self.inner.state.borrow();
            (state.selected, state.entries.len())
        };
        if let Some(current) = selected {
            self.transact(|| self.move_selection((current + len - 1) % len));
        }
    }

    /// Run `body` as one transaction.
    ///
    /// Nested calls are transparent. When the outermost call returns,
    /// `EntriesChanged` fires if any entry was added or removed (even if the
    /// changes cancel out), then `SelectedEntryChanged` fires if the selected
    /// entry differs from the one selected when the transaction began.
    ///
    /// If `body` panics, the depth is unwound and no bulk events fire.
    pub fn transact<R>(&self, body: impl FnOnce() -> R) -> R {
        self.assert_alive("transact");
        let previous = self.selected_entry();

        let result = {
            let _depth = DepthGuard::enter(&self.inner.transaction_depth);
            body()
        };

        if self.inner.transaction_depth.get() == 0 {
            self.finish_transaction(previous);
        }
        result
    }

    /// Destroy every entry, empty the set and close its event channel.
    ///
    /// Managed resources are released and destruction subscriptions dropped
    /// first, then every entry is destroyed and removed inside one
    /// transaction, so listeners see one `EntryRemoved` per entry followed by
    /// a single `EntriesChanged`/`SelectedEntryChanged` pair, and finally
    /// `Destroyed`. Calling it again does nothing.
    ///
    /// Called inside an outer transaction, the bulk events for the removals
    /// are lost because the channel closes before that transaction ends.
    pub fn destroy(&self) {
        if !self.is_alive() {
            debug!("destroy on already destroyed set ignored");
            return;
        }
        self.begin_mutation("destroy");

        for (_, subscription) in self.inner.destruction_subscriptions.take() {
            subscription.dispose();
        }
        for resources in self.inner.managed.take() {
            resources.release_all();
        }

        self.transact(|| loop {
            let first = self.inner.state.borrow().entries.first().cloned();
            let Some(entry) = first else { break };
            entry.destroy();
            if let Some(index) = self.index_of(&entry) {
                self.detach(index);
            }
        });

        self.inner.alive.set(false);
        debug!("set destroyed");
        self.emit(SetEvent::Destroyed);
        self.inner.emitter.close();
    }

    // --- Subscriptions ---

    /// Listen to every event the set emits.
    pub fn on_event(&self, callback: impl Fn(&SetEvent<T>) + 'static) -> Subscription {
        self.inner.emitter.subscribe(callback)
    }

    pub fn on_did_add_entry(&self, callback: impl Fn(&T, usize) + 'static) -> Subscription {
        self.on_event(move |event| {
            if let SetEvent::EntryAdded { entry, index } = event {
                callback(entry, *index);
            }
        })
    }

    pub fn on_did_remove_entry(&self, callback: impl Fn(&T, usize) + 'static) -> Subscription {
        self.on_event(move |event| {
            if let SetEvent::EntryRemoved { entry, index } = event {
                callback(entry, *index);
            }
        })
    }

    pub fn on_did_change_entries(&self, callback: impl Fn(&[T]) + 'static) -> Subscription {
        self.on_event(move |event| {
            if let SetEvent::EntriesChanged { entries } = event {
                callback(entries);
            }
        })
    }

    pub fn on_did_change_selected_entry(
        &self,
        callback: impl Fn(Option<&T>) + 'static,
    ) -> Subscription {
        self.on_event(move |event| {
            if let SetEvent::SelectedEntryChanged { entry } = event {
                callback(entry.as_ref());
            }
        })
    }

    /// Fires once, after the set has been emptied by `destroy`.
    pub fn on_did_destroy(&self, callback: impl Fn() + 'static) -> Subscription {
        self.on_event(move |event| {
            if let SetEvent::Destroyed = event {
                callback();
            }
        })
    }

    /// Call `callback` with the current entries now and after every change.
    pub fn observe_entries(&self, callback: impl Fn(&[T]) + 'static) -> Subscription {
        callback(&self.entries());
        self.on_did_change_entries(callback)
    }

    /// Call `callback` for every current entry now and for every entry added
    /// later.
    pub fn observe_each_entry(&self, callback: impl Fn(&T, usize) + 'static) -> Subscription {
        for (index, entry) in self.entries().iter().enumerate() {
            callback(entry, index);
        }
        self.on_did_add_entry(callback)
    }

    /// Call `callback` with the selected entry now and after every change.
    pub fn observe_selected_entry(&self, callback: impl Fn(Option<&T>) + 'static) -> Subscription {
        callback(self.selected_entry().as_ref());
        self.on_did_change_selected_entry(callback)
    }

    /// Run `setup` for every current and future entry.
    ///
    /// The cleanup `setup` returns runs exactly once, at the first of: the
    /// entry leaving the set, the set being destroyed, or the returned
    /// subscription being disposed or dropped.
    pub fn manage_each_entry<F, C>(&self, setup: F) -> Subscription
    where
        F: Fn(&T) -> C + 'static,
        C: FnOnce() + 'static,
    {
        self.assert_alive("manage_each_entry");
        let resources = Rc::new(ManagedResources::new());

        for entry in self.entries() {
            let cleanup = setup(&entry);
            resources.track(entry, Box::new(cleanup));
        }

        let added = {
            let resources = Rc::clone(&resources);
            self.on_did_add_entry(move |entry, _| {
                let cleanup = setup(entry);
                resources.track(entry.clone(), Box::new(cleanup));
            })
        };
        let removed = {
            let resources = Rc::clone(&resources);
            self.on_did_remove_entry(move |entry, _| resources.release(entry))
        };
        resources.hold(added);
        resources.hold(removed);

        self.inner.managed.borrow_mut().push(Rc::clone(&resources));

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .managed
                    .borrow_mut()
                    .retain(|r| !Rc::ptr_eq(r, &resources));
            }
            resources.release_all();
        })
    }

    // --- Internals ---

    fn assert_alive(&self, operation: &'static str) {
        assert!(
            self.is_alive(),
            "{} called on a destroyed SelectionOrderedSet",
            operation
        );
    }

    /// Liveness assertion plus the reentrancy diagnostic.
    fn begin_mutation(&self, operation: &'static str) {
        self.assert_alive(operation);
        if self.is_emitting() {
            self.inner
                .diagnostics
                .warn(&Diagnostic::ReentrantMutation { operation });
        }
    }

    fn insert(&self, entry: T, index: usize) {
        {
            let mut state = self.inner.state.borrow_mut();
            state.entries.insert(index, entry.clone());
            state.selected = match state.selected {
                None => Some(0),
                Some(selected) if index <= selected => Some(selected + 1),
                other => other,
            };
            trace!(index, len = state.entries.len(), "entry added");
        }

        self.watch_destruction(&entry);
        self.inner.entries_changed.set(true);
        self.emit(SetEvent::EntryAdded { entry, index });
    }

    fn detach(&self, index: usize) -> T {
        let entry = {
            let mut state = self.inner.state.borrow_mut();
            let entry = state.entries.remove(index);
            let len = state.entries.len();
            state.selected = match state.selected {
                _ if len == 0 => None,
                Some(selected) if index < selected => Some(selected - 1),
                Some(selected) => Some(selected.min(len - 1)),
                None => None,
            };
            trace!(index, len, "entry removed");
            entry
        };

        self.unwatch_destruction(&entry);
        self.inner.entries_changed.set(true);
        self.emit(SetEvent::EntryRemoved {
            entry: entry.clone(),
            index,
        });
        entry
    }

    fn move_selection(&self, index: usize) {
        self.inner.state.borrow_mut().selected = Some(index);
        trace!(index, "selection moved");
    }

    fn finish_transaction(&self, previous: Option<T>) {
        if self.inner.entries_changed.replace(false) {
            let entries = self.entries();
            debug!(len = entries.len(), "entries changed");
            self.emit(SetEvent::EntriesChanged { entries });
        }

        let current = self.selected_entry();
        if current != previous {
            debug!(index = ?self.selected_index(), "selected entry changed");
            self.emit(SetEvent::SelectedEntryChanged { entry: current });
        }
    }

    fn emit(&self, event: SetEvent<T>) {
        let _emitting = DepthGuard::enter(&self.inner.emit_depth);
        self.inner.emitter.emit(&event);
    }

    fn watch_destruction(&self, entry: &T) {
        let Some(signal) = entry.destruction_signal() else {
            return;
        };

        let weak = Rc::downgrade(&self.inner);
        let watched = entry.clone();
        let subscription = signal.on_did_destroy(move || {
            if let Some(inner) = weak.upgrade() {
                SelectionOrderedSet { inner }.remove(&watched);
            }
        });

        self.inner
            .destruction_subscriptions
            .borrow_mut()
            .push((entry.clone(), subscription));
    }

    fn unwatch_destruction(&self, entry: &T) {
        let watched = {
            let mut subscriptions = self.inner.destruction_subscriptions.borrow_mut();
            subscriptions
                .iter()
                .position(|(e, _)| e == entry)
                .map(|pos| subscriptions.remove(pos))
        };
        if let Some((_, subscription)) = watched {
            subscription.dispose();
        }
    }
}

impl<T: SetEntry> Default for SelectionOrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SetEntry> Clone for SelectionOrderedSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: SetEntry + fmt::Debug> fmt::Debug for SelectionOrderedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("SelectionOrderedSet")
            .field("entries", &state.entries)
            .field("selected", &state.selected)
            .field("alive", &self.inner.alive.get())
            .finish()
    }
}
