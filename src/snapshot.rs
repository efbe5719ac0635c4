//! Persisted form of a set: ordered entries plus the selected index.

use crate::error::{Result, SetError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Serializable state of a set.
///
/// `R` is whatever representation the caller persists entries as; for plain
/// entry types it is the entry type itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSnapshot<R> {
    pub entries: Vec<R>,
    pub selected_index: Option<usize>,
}

impl<R> SetSnapshot<R> {
    pub fn new(entries: Vec<R>, selected_index: Option<usize>) -> Self {
        Self {
            entries,
            selected_index,
        }
    }

    /// Convert every entry representation, keeping order and selection.
    pub fn try_map<U>(self, f: impl FnMut(R) -> Result<U>) -> Result<SetSnapshot<U>> {
        let entries = self
            .entries
            .into_iter()
            .map(f)
            .collect::<Result<Vec<U>>>()?;
        Ok(SetSnapshot {
            entries,
            selected_index: self.selected_index,
        })
    }
}

impl<R: PartialEq> SetSnapshot<R> {
    /// Check the set invariants: no duplicates, and a selection exactly when
    /// non-empty that points at an entry.
    pub fn validate(&self) -> Result<()> {
        validate_layout(&self.entries, self.selected_index)
    }
}

impl<R: Serialize> SetSnapshot<R> {
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// MessagePack encoding (field names kept, so it stays self-describing).
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }
}

impl<R: DeserializeOwned + PartialEq> SetSnapshot<R> {
    /// Decode and validate a JSON snapshot.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self = serde_json::from_slice(bytes)
            .map_err(|e| SetError::Deserialization(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Decode and validate a MessagePack snapshot.
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self = rmp_serde::from_slice(bytes)?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

/// Shared by construction and snapshot decoding.
pub(crate) fn validate_layout<R: PartialEq>(entries: &[R], selected: Option<usize>) -> Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        if let Some(first) = entries[..i].iter().position(|e| e == entry) {
            return Err(SetError::InvalidInitialState(format!(
                "entry at index {} duplicates index {}",
                i, first
            )));
        }
    }

    match selected {
        None if !entries.is_empty() => Err(SetError::InvalidInitialState(format!(
            "no selection for {} entries",
            entries.len()
        ))),
        Some(index) if index >= entries.len() => Err(SetError::InvalidInitialState(format!(
            "selected index {} out of range (len is {})",
            index,
            entries.len()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_valid_layouts() {
        assert!(SetSnapshot::<u32>::new(vec![], None).validate().is_ok());
        assert!(SetSnapshot::new(vec![1, 2, 3], Some(2)).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_selection() {
        let result = SetSnapshot::new(vec![1, 2], None).validate();
        assert!(matches!(result, Err(SetError::InvalidInitialState(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_selection() {
        let result = SetSnapshot::new(vec![1, 2], Some(2)).validate();
        assert!(matches!(result, Err(SetError::InvalidInitialState(_))));

        let result = SetSnapshot::<u32>::new(vec![], Some(0)).validate();
        assert!(matches!(result, Err(SetError::InvalidInitialState(_))));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let result = SetSnapshot::new(vec![1, 2, 1], Some(0)).validate();
        match result {
            Err(SetError::InvalidInitialState(msg)) => assert!(msg.contains("index 2")),
            other => panic!("Expected InvalidInitialState, got {:?}", other),
        }
    }

    #[test]
    fn test_json_shape() {
        let snapshot = SetSnapshot::new(vec!["a".to_string(), "b".to_string()], Some(1));
        let json: serde_json::Value =
            serde_json::from_slice(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(json["entries"], serde_json::json!(["a", "b"]));
        assert_eq!(json["selected_index"], 1);
    }

    #[test]
    fn test_from_json_validates() {
        let result = SetSnapshot::<String>::from_json(br#"{"entries":["a"],"selected_index":null}"#);
        assert!(matches!(result, Err(SetError::InvalidInitialState(_))));

        let result = SetSnapshot::<String>::from_json(b"not json");
        assert!(matches!(result, Err(SetError::Deserialization(_))));
    }

    #[test]
    fn test_msgpack_round_trip() {
        let snapshot = SetSnapshot::new(vec![10u32, 20, 30], Some(0));
        let bytes = snapshot.to_msgpack().unwrap();
        assert_eq!(SetSnapshot::<u32>::from_msgpack(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_try_map() {
        let snapshot = SetSnapshot::new(vec!["1", "2"], Some(1));
        let mapped = snapshot
            .try_map(|s| {
                s.parse::<u32>()
                    .map_err(|e| SetError::Deserialization(e.to_string()))
            })
            .unwrap();
        assert_eq!(mapped, SetSnapshot::new(vec![1, 2], Some(1)));

        let failed = SetSnapshot::new(vec!["x"], Some(0)).try_map(|s| {
            s.parse::<u32>()
                .map_err(|e| SetError::Deserialization(e.to_string()))
        });
        assert!(matches!(failed, Err(SetError::Deserialization(_))));
    }
}
