//! Fluent builder for in-memory cluster snapshots.

use std::collections::{BTreeMap, HashSet};

use crate::client::{
    ClusterSnapshot, FieldStats, IndexFieldStats, IndexSettings, IndexStats, Query,
    ShardSegments, SnapshotClient,
};
use crate::registry::{AllocationType, IndexState};

/// Describes a single index of a [`SnapshotBuilder`].
///
/// Defaults: open, size 0, no creation date, no segments and absent from
/// field stats.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    settings: IndexSettings,
    state: Option<IndexState>,
    stats: Option<IndexStats>,
    segments: Option<ShardSegments>,
    fields: Option<IndexFieldStats>,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self {
            settings: IndexSettings::default(),
            state: Some(IndexState::Open),
            stats: Some(IndexStats::default()),
            segments: None,
            fields: None,
        }
    }
}

impl IndexBuilder {
    /// Raw creation date as the cluster would report it (seconds or millis).
    pub fn created(mut self, epoch: i64) -> Self {
        self.settings.creation_date = Some(epoch);
        self
    }

    pub fn size(mut self, size_in_bytes: u64) -> Self {
        self.stats = Some(IndexStats { size_in_bytes });
        self
    }

    pub fn closed(mut self) -> Self {
        self.state = Some(IndexState::Close);
        self
    }

    pub fn allocation(mut self, allocation_type: AllocationType, key: &str, value: &str) -> Self {
        let rules = match allocation_type {
            AllocationType::Include => &mut self.settings.allocation.include,
            AllocationType::Exclude => &mut self.settings.allocation.exclude,
            AllocationType::Require => &mut self.settings.allocation.require,
        };
        rules.insert(key.to_string(), value.to_string());
        self
    }

    /// Segment counts, one entry per shard.
    pub fn segments(mut self, per_shard: &[u64]) -> Self {
        self.segments = Some(
            per_shard
                .iter()
                .enumerate()
                .map(|(shard, count)| (shard.to_string(), *count))
                .collect(),
        );
        self
    }

    pub fn field(mut self, name: &str, min_value: i64, max_value: i64) -> Self {
        self.fields.get_or_insert_with(BTreeMap::new).insert(
            name.to_string(),
            FieldStats {
                min_value,
                max_value,
            },
        );
        self
    }

    /// Report the index in field stats responses without any field.
    pub fn no_fields(mut self) -> Self {
        self.fields = Some(BTreeMap::new());
        self
    }

    pub fn without_state(mut self) -> Self {
        self.state = None;
        self
    }

    pub fn without_stats(mut self) -> Self {
        self.stats = None;
        self
    }
}

/// Builder for [`SnapshotClient`]s used in tests.
///
/// # Example
///
/// ```rust,ignore
/// let client = SnapshotBuilder::new()
///     .index("logs-2016.03.03", |index| index.segments(&[71, 2]))
///     .fail(Query::FieldStats)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    snapshot: ClusterSnapshot,
    failing: HashSet<Query>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an index described by `configure`.
    pub fn index(mut self, name: &str, configure: impl FnOnce(IndexBuilder) -> IndexBuilder) -> Self {
        let index = configure(IndexBuilder::default());
        let name = name.to_string();

        self.snapshot.settings.insert(name.clone(), index.settings);
        match index.state {
            Some(state) => self.snapshot.state.insert(name.clone(), state),
            None => self.snapshot.state.remove(&name),
        };
        match index.stats {
            Some(stats) => self.snapshot.stats.insert(name.clone(), stats),
            None => self.snapshot.stats.remove(&name),
        };
        match index.segments {
            Some(segments) => self.snapshot.segments.insert(name.clone(), segments),
            None => self.snapshot.segments.remove(&name),
        };
        match index.fields {
            Some(fields) => self.snapshot.field_stats.insert(name, fields),
            None => self.snapshot.field_stats.remove(&name),
        };
        self
    }

    /// Make every call of `query` fail.
    pub fn fail(mut self, query: Query) -> Self {
        self.failing.insert(query);
        self
    }

    pub fn snapshot(&self) -> ClusterSnapshot {
        self.snapshot.clone()
    }

    pub fn build(self) -> SnapshotClient {
        self.failing
            .into_iter()
            .fold(SnapshotClient::new(self.snapshot), SnapshotClient::with_failure)
    }
}
