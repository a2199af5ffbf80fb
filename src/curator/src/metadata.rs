//! Builds the [`Registry`] from the read-only metadata queries.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::age::fix_epoch;
use crate::client::{ClientError, IndexFieldStats, Query, QueryClient};
use crate::error::{CuratorError, Result};
use crate::registry::{IndexRecord, IndexState, Registry};

fn fetch_failed(query: Query) -> impl FnOnce(ClientError) -> CuratorError {
    move |source| CuratorError::FetchFailed {
        query: query.name(),
        source,
    }
}

/// Issues metadata queries through a [`QueryClient`] and merges the answers.
#[derive(Clone)]
pub struct MetadataResolver {
    client: Arc<dyn QueryClient>,
}

impl MetadataResolver {
    pub fn new(client: Arc<dyn QueryClient>) -> Self {
        Self { client }
    }

    /// Fetch settings, cluster state and stats and merge them per index.
    ///
    /// Registry keys are the indices reported by settings. Any failed query
    /// fails the whole build.
    pub async fn build_registry(&self) -> Result<Registry> {
        let (settings, states, stats) = tokio::try_join!(
            async {
                self.client
                    .get_settings()
                    .await
                    .map_err(fetch_failed(Query::Settings))
            },
            async {
                self.client
                    .get_cluster_state()
                    .await
                    .map_err(fetch_failed(Query::ClusterState))
            },
            async {
                self.client
                    .get_stats()
                    .await
                    .map_err(fetch_failed(Query::Stats))
            },
        )?;

        let registry: Registry = settings
            .into_iter()
            .map(|(name, settings)| {
                let state = match states.get(&name) {
                    Some(state) => *state,
                    None => {
                        warn!(index = %name, "Index missing from cluster state, assuming open");
                        IndexState::Open
                    }
                };
                let size_in_bytes = stats
                    .get(&name)
                    .map(|stats| stats.size_in_bytes)
                    .unwrap_or(0);

                IndexRecord {
                    creation_date: settings.creation_date.map(fix_epoch),
                    allocation: settings.allocation,
                    name,
                    size_in_bytes,
                    state,
                }
            })
            .collect();

        debug!(indices = registry.len(), "Built index registry");
        Ok(registry)
    }

    /// Highest per-shard segment count of each requested index.
    pub async fn segment_counts(&self, indices: &[String]) -> Result<BTreeMap<String, u64>> {
        if indices.is_empty() {
            return Ok(BTreeMap::new());
        }

        let segments = self
            .client
            .get_segments(indices)
            .await
            .map_err(fetch_failed(Query::Segments))?;

        Ok(segments
            .into_iter()
            .map(|(index, shards)| {
                let max = shards.values().copied().max().unwrap_or(0);
                (index, max)
            })
            .collect())
    }

    /// Raw min/max statistics of `field` for the requested indices.
    pub async fn field_stats(
        &self,
        indices: &[String],
        field: &str,
    ) -> Result<BTreeMap<String, IndexFieldStats>> {
        if indices.is_empty() {
            return Ok(BTreeMap::new());
        }

        self.client
            .get_field_stats(indices, field)
            .await
            .map_err(fetch_failed(Query::FieldStats))
    }
}
