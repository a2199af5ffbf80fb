//! Per-index records merged from the metadata queries.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Open/close state reported by the cluster state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexState {
    Open,
    Close,
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexState::Open => f.write_str("open"),
            IndexState::Close => f.write_str("close"),
        }
    }
}

/// Shard allocation routing rule groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationType {
    Include,
    Exclude,
    Require,
}

impl AllocationType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "include" => Some(AllocationType::Include),
            "exclude" => Some(AllocationType::Exclude),
            "require" => Some(AllocationType::Require),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationType::Include => "include",
            AllocationType::Exclude => "exclude",
            AllocationType::Require => "require",
        }
    }
}

/// Routing allocation attributes of an index, grouped by rule type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRules {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub include: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exclude: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub require: BTreeMap<String, String>,
}

impl AllocationRules {
    pub fn rules(&self, allocation_type: AllocationType) -> &BTreeMap<String, String> {
        match allocation_type {
            AllocationType::Include => &self.include,
            AllocationType::Exclude => &self.exclude,
            AllocationType::Require => &self.require,
        }
    }

    pub fn get(&self, allocation_type: AllocationType, key: &str) -> Option<&str> {
        self.rules(allocation_type).get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty() && self.require.is_empty()
    }
}

/// Everything known about one index at registry build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub name: String,
    pub size_in_bytes: u64,
    pub state: IndexState,
    pub allocation: AllocationRules,
    /// Normalized epoch seconds.
    pub creation_date: Option<i64>,
}

impl IndexRecord {
    pub fn is_open(&self) -> bool {
        self.state == IndexState::Open
    }
}

/// Immutable map of index name to [`IndexRecord`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    records: BTreeMap<String, IndexRecord>,
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&IndexRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// All index names in ascending order.
    pub fn names(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &IndexRecord> {
        self.records.values()
    }
}

impl FromIterator<IndexRecord> for Registry {
    fn from_iter<T: IntoIterator<Item = IndexRecord>>(iter: T) -> Self {
        Self {
            records: iter
                .into_iter()
                .map(|record| (record.name.clone(), record))
                .collect(),
        }
    }
}
