//! Core types for the selection set.

use crate::diagnostics::{DiagnosticSink, NoopDiagnostics};
use crate::subscriptions::DestructionSignal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// A value that can live in a `SelectionOrderedSet`.
///
/// Identity is `PartialEq`: two entries that compare equal are the same entry.
/// Handle types that want pointer identity should compare with `Rc::ptr_eq`.
///
/// Both capabilities are optional. The destruction signal is queried once,
/// when the entry is inserted.
pub trait SetEntry: Clone + PartialEq + 'static {
    /// Signal the entry fires when it is destroyed on its own.
    fn destruction_signal(&self) -> Option<DestructionSignal> {
        None
    }

    /// Tear the entry down. Called by `SelectionOrderedSet::destroy`.
    fn destroy(&self) {}
}

macro_rules! plain_entries {
    ($($ty:ty),* $(,)?) => {
        $(impl SetEntry for $ty {})*
    };
}

plain_entries!(
    &'static str,
    String,
    char,
    bool,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
);

/// Events emitted by a set.
///
/// `EntryAdded`/`EntryRemoved` fire at the moment of mutation and carry the
/// index at that moment. `EntriesChanged`/`SelectedEntryChanged` fire at most
/// once when the outermost transaction finishes and carry final state only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SetEvent<T> {
    EntryAdded { entry: T, index: usize },

    EntryRemoved { entry: T, index: usize },

    EntriesChanged { entries: Vec<T> },

    /// `None` once the set is empty.
    SelectedEntryChanged { entry: Option<T> },

    /// Terminal; the channel closes right after.
    Destroyed,
}

/// Set configuration.
#[derive(Clone)]
pub struct SetConfig {
    /// Where reentrant-mutation reports go.
    /// Default: discard.
    pub diagnostics: Rc<dyn DiagnosticSink>,
}

impl SetConfig {
    pub fn with_diagnostics(diagnostics: impl DiagnosticSink + 'static) -> Self {
        Self {
            diagnostics: Rc::new(diagnostics),
        }
    }
}

impl Default for SetConfig {
    fn default() -> Self {
        Self {
            diagnostics: Rc::new(NoopDiagnostics),
        }
    }
}

impl fmt::Debug for SetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetConfig").finish_non_exhaustive()
    }
}
