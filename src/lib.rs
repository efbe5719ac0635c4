//! # Selection Set
//!
//! An ordered, duplicate-free collection with a single tracked selection and
//! transactional change notification.
//!
//! ## Core Concepts
//!
//! - **Entries**: distinct values kept in insertion order
//! - **Selection**: exactly one selected entry whenever the set is non-empty
//! - **Transactions**: mutations batch their bulk events until the outermost
//!   transaction returns
//! - **Entry lifecycle**: entries that expose a destruction signal are
//!   removed automatically when it fires
//!
//! ## Example
//!
//! ```
//! use selection_set::{SelectionOrderedSet, SetEvent};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let set = SelectionOrderedSet::from_entries(vec!["a", "b", "c"], Some(1))?;
//!
//! let events = Rc::new(RefCell::new(Vec::new()));
//! let events_clone = Rc::clone(&events);
//! let _sub = set.on_event(move |event| {
//!     events_clone.borrow_mut().push(event.clone());
//! });
//!
//! // Removing the selected entry selects the one that slides into its slot.
//! set.remove(&"b");
//! assert_eq!(set.selected_entry(), Some("c"));
//!
//! assert_eq!(
//!     *events.borrow(),
//!     vec![
//!         SetEvent::EntryRemoved { entry: "b", index: 1 },
//!         SetEvent::EntriesChanged { entries: vec!["a", "c"] },
//!         SetEvent::SelectedEntryChanged { entry: Some("c") },
//!     ]
//! );
//! # Ok::<(), selection_set::SetError>(())
//! ```

pub mod diagnostics;
pub mod error;
pub mod set;
pub mod snapshot;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use diagnostics::{Diagnostic, DiagnosticSink, NoopDiagnostics, TracingDiagnostics};
pub use error::{Result, SetError};
pub use set::SelectionOrderedSet;
pub use snapshot::SetSnapshot;
pub use subscriptions::{DestructionSignal, Emitter, Subscription, SubscriptionId};
pub use types::{SetConfig, SetEntry, SetEvent};
