//! File-backed [`QueryClient`] serving a point-in-time cluster snapshot.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    ClientError, FieldStats, IndexFieldStats, IndexSettings, IndexStats, Query, QueryClient,
    ShardSegments,
};
use crate::registry::IndexState;

/// A captured view of every response the curation core asks for.
///
/// ```json
/// {
///   "settings": { "logs-2016.03.03": { "creation_date": "1456963200172" } },
///   "state": { "logs-2016.03.03": "open" },
///   "stats": { "logs-2016.03.03": { "size_in_bytes": 4096 } },
///   "segments": { "logs-2016.03.03": { "0": 12, "1": 9 } },
///   "field_stats": {
///     "logs-2016.03.03": { "@timestamp": { "min_value": 1456963201, "max_value": 1457049599 } }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub settings: BTreeMap<String, IndexSettings>,
    #[serde(default)]
    pub state: BTreeMap<String, IndexState>,
    #[serde(default)]
    pub stats: BTreeMap<String, IndexStats>,
    #[serde(default)]
    pub segments: BTreeMap<String, ShardSegments>,
    #[serde(default)]
    pub field_stats: BTreeMap<String, IndexFieldStats>,
}

/// Serves a [`ClusterSnapshot`] through the [`QueryClient`] interface.
///
/// Queries can be made to fail on purpose, and every call is counted so
/// callers can verify how often the cluster would have been hit.
#[derive(Debug, Default)]
pub struct SnapshotClient {
    snapshot: ClusterSnapshot,
    failing: HashSet<Query>,
    calls: [AtomicUsize; Query::ALL.len()],
}

impl SnapshotClient {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        Self {
            snapshot,
            ..Default::default()
        }
    }

    /// Load a snapshot from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let snapshot: ClusterSnapshot = serde_json::from_slice(&bytes)?;
        Ok(Self::new(snapshot))
    }

    /// Make every call of `query` fail with a request error.
    pub fn with_failure(mut self, query: Query) -> Self {
        self.failing.insert(query);
        self
    }

    /// Number of times `query` has been issued.
    pub fn calls(&self, query: Query) -> usize {
        self.calls[query.slot()].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> &ClusterSnapshot {
        &self.snapshot
    }

    fn issue(&self, query: Query) -> Result<(), ClientError> {
        self.calls[query.slot()].fetch_add(1, Ordering::Relaxed);
        if self.failing.contains(&query) {
            return Err(ClientError::Request(format!("{query} query rejected")));
        }
        Ok(())
    }
}

#[async_trait]
impl QueryClient for SnapshotClient {
    async fn get_settings(&self) -> Result<BTreeMap<String, IndexSettings>, ClientError> {
        self.issue(Query::Settings)?;
        Ok(self.snapshot.settings.clone())
    }

    async fn get_cluster_state(&self) -> Result<BTreeMap<String, IndexState>, ClientError> {
        self.issue(Query::ClusterState)?;
        Ok(self.snapshot.state.clone())
    }

    async fn get_stats(&self) -> Result<BTreeMap<String, IndexStats>, ClientError> {
        self.issue(Query::Stats)?;
        Ok(self.snapshot.stats.clone())
    }

    async fn get_segments(
        &self,
        indices: &[String],
    ) -> Result<BTreeMap<String, ShardSegments>, ClientError> {
        self.issue(Query::Segments)?;
        Ok(indices
            .iter()
            .filter_map(|index| {
                self.snapshot
                    .segments
                    .get(index)
                    .map(|shards| (index.clone(), shards.clone()))
            })
            .collect())
    }

    async fn get_field_stats(
        &self,
        indices: &[String],
        field: &str,
    ) -> Result<BTreeMap<String, IndexFieldStats>, ClientError> {
        self.issue(Query::FieldStats)?;
        Ok(indices
            .iter()
            .filter_map(|index| {
                let fields = self.snapshot.field_stats.get(index)?;
                let selected: BTreeMap<String, FieldStats> = fields
                    .get(field)
                    .map(|stats| (field.to_string(), *stats))
                    .into_iter()
                    .collect();
                Some((index.clone(), selected))
            })
            .collect())
    }
}
