use anyhow::{bail, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::record::ResultRecord;

/// Scenario results keyed by scenario name, in execution order.
///
/// Serializes as a single object whose keys are the scenario names, so the
/// persisted file can be walked field by field without knowing these types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultStore {
    records: IndexMap<String, ResultRecord>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: IndexMap::with_capacity(capacity),
        }
    }

    /// Append one scenario's record. Names are unique within a run; a repeat
    /// is rejected and the existing record is left untouched.
    pub fn insert(&mut self, name: impl Into<String>, record: ResultRecord) -> Result<()> {
        let name = name.into();
        if self.records.contains_key(&name) {
            bail!("scenario '{name}' already has a result in this run");
        }
        self.records.insert(name, record);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ResultRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(name, record)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResultRecord)> {
        self.records.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}
