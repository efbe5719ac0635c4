//! Property tests: selection invariants hold across arbitrary operation
//! sequences, and snapshots round-trip.

use proptest::prelude::*;
use selection_set::{SelectionOrderedSet, SetEvent, SetSnapshot};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug)]
enum Op {
    Add(u8),
    AddAt(u8, usize),
    Remove(u8),
    RemoveAt(usize),
    SelectAt(usize),
    Select(u8),
    Next,
    Previous,
    Batch(Vec<Op>),
}

fn leaf_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..16).prop_map(Op::Add),
        (0u8..16, 0usize..20).prop_map(|(e, i)| Op::AddAt(e, i)),
        (0u8..16).prop_map(Op::Remove),
        (0usize..20).prop_map(Op::RemoveAt),
        (0usize..20).prop_map(Op::SelectAt),
        (0u8..16).prop_map(Op::Select),
        Just(Op::Next),
        Just(Op::Previous),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => leaf_op(),
        1 => prop::collection::vec(leaf_op(), 1..6).prop_map(Op::Batch),
    ]
}

fn apply(set: &SelectionOrderedSet<u8>, op: &Op) {
    match op {
        Op::Add(e) => {
            let _ = set.add(*e);
        }
        Op::AddAt(e, i) => {
            let _ = set.add_at(*e, *i);
        }
        Op::Remove(e) => {
            set.remove(e);
        }
        Op::RemoveAt(i) => {
            let _ = set.remove_at(*i);
        }
        Op::SelectAt(i) => {
            let _ = set.select_at(*i);
        }
        Op::Select(e) => {
            let _ = set.select(e);
        }
        Op::Next => set.select_next(),
        Op::Previous => set.select_previous(),
        Op::Batch(ops) => set.transact(|| {
            for op in ops {
                apply(set, op);
            }
        }),
    }
}

fn assert_invariants(set: &SelectionOrderedSet<u8>) {
    let len = set.len();
    match set.selected_index() {
        None => assert_eq!(len, 0),
        Some(index) => assert!(index < len, "selected {} with len {}", index, len),
    }
    let entries = set.entries();
    for (i, e) in entries.iter().enumerate() {
        assert!(!entries[..i].contains(e), "duplicate entry {}", e);
    }
}

proptest! {
    #[test]
    fn prop_selection_invariants_hold(ops in prop::collection::vec(op(), 0..60)) {
        let set = SelectionOrderedSet::new();
        for op in &ops {
            apply(&set, op);
            assert_invariants(&set);
        }
    }

    #[test]
    fn prop_bulk_events_at_most_once_per_top_level_call(ops in prop::collection::vec(op(), 1..30)) {
        let set = SelectionOrderedSet::new();
        let log: Rc<RefCell<Vec<SetEvent<u8>>>> = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        let _sub = set.on_event(move |event| log_clone.borrow_mut().push(event.clone()));

        for op in &ops {
            log.borrow_mut().clear();
            let before = set.selected_entry();
            apply(&set, op);

            let events = log.borrow();
            let changed: Vec<_> = events
                .iter()
                .filter_map(|e| match e {
                    SetEvent::EntriesChanged { entries } => Some(entries.clone()),
                    _ => None,
                })
                .collect();
            let selected: Vec<_> = events
                .iter()
                .filter_map(|e| match e {
                    SetEvent::SelectedEntryChanged { entry } => Some(*entry),
                    _ => None,
                })
                .collect();

            prop_assert!(changed.len() <= 1);
            prop_assert!(selected.len() <= 1);
            if let Some(entries) = changed.first() {
                prop_assert_eq!(entries, &set.entries());
            }
            match selected.first() {
                Some(entry) => {
                    prop_assert_eq!(*entry, set.selected_entry());
                    prop_assert_ne!(*entry, before);
                }
                None => {
                    prop_assert_eq!(before, set.selected_entry());
                }
            }
        }
    }

    #[test]
    fn prop_snapshot_round_trip(
        entries in prop::collection::hash_set(any::<u32>(), 0..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let entries: Vec<u32> = entries.into_iter().collect();
        let selected = if entries.is_empty() { None } else { Some(pick.index(entries.len())) };
        let set = SelectionOrderedSet::from_entries(entries.clone(), selected).unwrap();

        let json = set.snapshot().to_json().unwrap();
        let from_json = SelectionOrderedSet::from_snapshot(SetSnapshot::<u32>::from_json(&json).unwrap()).unwrap();
        prop_assert_eq!(from_json.entries(), entries.clone());
        prop_assert_eq!(from_json.selected_index(), selected);

        let packed = set.snapshot().to_msgpack().unwrap();
        let from_packed = SelectionOrderedSet::from_snapshot(SetSnapshot::<u32>::from_msgpack(&packed).unwrap()).unwrap();
        prop_assert_eq!(from_packed.entries(), entries);
        prop_assert_eq!(from_packed.selected_index(), selected);
    }
}
