//! Event plumbing for the selection set.
//!
//! This module provides the in-process notification primitives the set is
//! built on:
//! - [`Emitter`]: a typed multi-subscriber channel
//! - [`Subscription`]: the disposal handle every listener gets; dropping it
//!   unsubscribes
//! - [`DestructionSignal`]: the one-shot signal an entry exposes so the set
//!   can drop it when it goes away
//!
//! Everything here is single-threaded (`Rc`/`RefCell`) and synchronous:
//! listeners run to completion, in subscription order, inside the call that
//! emitted the event.
//!
//! # Example
//!
//! ```
//! use selection_set::subscriptions::Emitter;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let emitter = Emitter::<u32>::new();
//! let total = Rc::new(Cell::new(0));
//! let total_clone = Rc::clone(&total);
//! let sub = emitter.subscribe(move |n| total_clone.set(total_clone.get() + n));
//!
//! emitter.emit(&2);
//! sub.dispose();
//! emitter.emit(&40);
//!
//! assert_eq!(total.get(), 2);
//! ```

mod emitter;
pub(crate) mod resources;
mod types;

pub use emitter::Emitter;
pub use types::{DestructionSignal, Subscription, SubscriptionId};
