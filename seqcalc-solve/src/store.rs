//! Append-only table of resolved sequence terms

use seqcalc_core::CalcError;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("term a({0}) is already stored")]
    DuplicateIndex(u64),
}

impl From<StoreError> for CalcError {
    fn from(err: StoreError) -> Self {
        CalcError::internal(err.to_string())
    }
}

/// Index → value for every term known so far. Values are never overwritten.
#[derive(Debug, Clone, Default)]
pub struct TermStore {
    terms: BTreeMap<u64, f64>,
}

impl TermStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: u64) -> Option<f64> {
        self.terms.get(&index).copied()
    }

    pub fn contains(&self, index: u64) -> bool {
        self.terms.contains_key(&index)
    }

    pub fn insert(&mut self, index: u64, value: f64) -> Result<(), StoreError> {
        if self.terms.contains_key(&index) {
            return Err(StoreError::DuplicateIndex(index));
        }
        self.terms.insert(index, value);
        Ok(())
    }

    pub fn max_index(&self) -> Option<u64> {
        self.terms.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.terms.iter().map(|(i, v)| (*i, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store() {
        let store = TermStore::new();
        assert!(store.is_empty());
        assert_eq!(store.max_index(), None);
        assert_eq!(store.get(0), None);
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = TermStore::new();
        store.insert(3, 1.5).unwrap();
        store.insert(1, -2.0).unwrap();
        assert_eq!(store.get(3), Some(1.5));
        assert!(store.contains(1));
        assert_eq!(store.max_index(), Some(3));
        assert_eq!(store.len(), 2);
        let ordered: Vec<u64> = store.iter().map(|(i, _)| i).collect();
        assert_eq!(ordered, vec![1, 3]);
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let mut store = TermStore::new();
        store.insert(0, 1.0).unwrap();
        assert_eq!(store.insert(0, 2.0), Err(StoreError::DuplicateIndex(0)));
        assert_eq!(store.get(0), Some(1.0));
    }

    #[test]
    fn test_duplicate_maps_to_internal_error() {
        let err: CalcError = StoreError::DuplicateIndex(4).into();
        assert_eq!(err.code, seqcalc_core::codes::INTERNAL);
        assert!(err.message.contains("a(4)"));
    }
}
