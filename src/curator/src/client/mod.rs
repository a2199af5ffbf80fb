//! Read-only query boundary towards the cluster.
//!
//! The curation core never talks to the network itself. Everything it knows
//! about the cluster arrives through a [`QueryClient`], which returns a
//! point-in-time view of settings, cluster state, store stats, segment counts
//! and per-field statistics.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::{AllocationRules, IndexState};

pub mod snapshot;

pub use snapshot::{ClusterSnapshot, SnapshotClient};

/// Segment counts of one index, keyed by shard number.
pub type ShardSegments = BTreeMap<String, u64>;

/// Field statistics of one index, keyed by field name.
pub type IndexFieldStats = BTreeMap<String, FieldStats>;

/// Per-index settings relevant to curation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Creation timestamp as reported by the cluster (seconds or milliseconds).
    #[serde(default, with = "epoch::optional", skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<i64>,

    /// Shard allocation routing rules.
    #[serde(default)]
    pub allocation: AllocationRules,
}

/// Per-index store statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub size_in_bytes: u64,
}

/// Aggregated min/max of a timestamp field across all shards of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStats {
    #[serde(with = "epoch::required")]
    pub min_value: i64,
    #[serde(with = "epoch::required")]
    pub max_value: i64,
}

/// The queries a [`QueryClient`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Settings,
    ClusterState,
    Stats,
    Segments,
    FieldStats,
}

impl Query {
    pub const ALL: [Query; 5] = [
        Query::Settings,
        Query::ClusterState,
        Query::Stats,
        Query::Segments,
        Query::FieldStats,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Query::Settings => "settings",
            Query::ClusterState => "cluster state",
            Query::Stats => "stats",
            Query::Segments => "segments",
            Query::FieldStats => "field stats",
        }
    }

    fn slot(&self) -> usize {
        match self {
            Query::Settings => 0,
            Query::ClusterState => 1,
            Query::Stats => 2,
            Query::Segments => 3,
            Query::FieldStats => 4,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors surfaced by a [`QueryClient`] implementation.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request itself failed (transport, timeout, rejected).
    #[error("Request failed: {0}")]
    Request(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read-only access to cluster metadata.
///
/// Each call returns a point-in-time snapshot. Timeouts and retries belong to
/// the implementation; the core treats every error as final.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Settings of every index, keyed by index name.
    async fn get_settings(&self) -> Result<BTreeMap<String, IndexSettings>, ClientError>;

    /// Open/close state of every index.
    async fn get_cluster_state(&self) -> Result<BTreeMap<String, IndexState>, ClientError>;

    /// Store statistics of every index.
    async fn get_stats(&self) -> Result<BTreeMap<String, IndexStats>, ClientError>;

    /// Segment counts per shard for the given indices.
    async fn get_segments(
        &self,
        indices: &[String],
    ) -> Result<BTreeMap<String, ShardSegments>, ClientError>;

    /// Min/max statistics of `field` for the given indices.
    ///
    /// An index that lacks the field is reported with an empty field map.
    async fn get_field_stats(
        &self,
        indices: &[String],
        field: &str,
    ) -> Result<BTreeMap<String, IndexFieldStats>, ClientError>;
}

/// Epoch values arrive either as JSON numbers or as numeric strings.
mod epoch {
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        Text(String),
    }

    impl Repr {
        fn into_epoch<E: serde::de::Error>(self) -> Result<i64, E> {
            match self {
                Repr::Number(value) => Ok(value),
                Repr::Text(text) => text
                    .trim()
                    .parse()
                    .map_err(|e| E::custom(format!("invalid epoch '{text}': {e}"))),
            }
        }
    }

    pub mod optional {
        use super::Repr;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<i64>, D::Error> {
            Option::<Repr>::deserialize(deserializer)?
                .map(Repr::into_epoch::<D::Error>)
                .transpose()
        }

        pub fn serialize<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(epoch) => serializer.serialize_i64(*epoch),
                None => serializer.serialize_none(),
            }
        }
    }

    pub mod required {
        use super::Repr;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
            Repr::deserialize(deserializer)?.into_epoch()
        }

        pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_i64(*value)
        }
    }
}
