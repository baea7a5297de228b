// src/store.rs

//! In-memory record store.
//!
//! Accumulates the records of one run keyed by identifier. Inserting an
//! identifier that is already present overwrites the earlier record.

use std::collections::btree_map::{self, BTreeMap};

use crate::models::{Record, RecordMap};

/// Deduplicated records of one run, ordered by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: BTreeMap<String, Record>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite one record. Returns the record it replaced.
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        self.records.insert(record.identifier.clone(), record)
    }

    /// Merge a partial result. Returns how many identifiers were new.
    pub fn merge(&mut self, partial: RecordMap) -> usize {
        let before = self.records.len();
        self.records.extend(partial);
        self.records.len() - before
    }

    pub fn get(&self, identifier: &str) -> Option<&Record> {
        self.records.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.records.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> btree_map::Values<'_, String, Record> {
        self.records.values()
    }

    pub fn identifiers(&self) -> btree_map::Keys<'_, String, Record> {
        self.records.keys()
    }

    pub fn into_map(self) -> RecordMap {
        self.records
    }
}

impl From<RecordMap> for RecordStore {
    fn from(records: RecordMap) -> Self {
        Self { records }
    }
}
