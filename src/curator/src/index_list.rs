//! The working set of indices and the state filters share.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::age::{AgeKey, AgeResolver, AgeSource};
use crate::client::QueryClient;
use crate::error::{CuratorError, Result};
use crate::filter::FilterSpec;
use crate::metadata::MetadataResolver;
use crate::registry::Registry;

/// Indices in scope for an action, backed by the registry they came from.
///
/// The working set starts as every registry key in ascending order and only
/// ever shrinks through filters. Ages and segment counts are fetched on
/// first use and kept for the lifetime of the list.
pub struct IndexList {
    metadata: MetadataResolver,
    registry: Registry,
    ages: AgeResolver,
    segments: Option<BTreeMap<String, u64>>,
    indices: Vec<String>,
}

impl IndexList {
    /// Build the registry through `client` and start from every index.
    pub async fn new(client: Arc<dyn QueryClient>) -> Result<Self> {
        let metadata = MetadataResolver::new(client);
        let registry = metadata.build_registry().await?;
        let ages = AgeResolver::new(&registry);
        let indices = registry.names();

        Ok(Self {
            metadata,
            registry,
            ages,
            segments: None,
            indices,
        })
    }

    pub fn indices(&self) -> &[String] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<String> {
        self.indices
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn ages(&self) -> &AgeResolver {
        &self.ages
    }

    /// Replace the working set. Every name must be a registry key.
    pub fn set_indices(&mut self, indices: Vec<String>) -> Result<()> {
        if let Some(unknown) = indices.iter().find(|name| !self.registry.contains(name)) {
            return Err(CuratorError::invalid(format!(
                "index '{unknown}' is not in the registry"
            )));
        }
        self.indices = indices;
        Ok(())
    }

    /// Restore the full, sorted working set.
    pub fn reset(&mut self) {
        self.indices = self.registry.names();
    }

    pub fn empty_list_check(&self) -> Result<()> {
        if self.indices.is_empty() {
            return Err(CuratorError::NoIndices);
        }
        Ok(())
    }

    /// Narrow the working set with a single filter.
    pub async fn apply(&mut self, filter: &FilterSpec) -> Result<()> {
        filter.apply(self).await
    }

    pub(crate) async fn resolve_ages(&mut self, source: &AgeSource) -> Result<()> {
        self.ages
            .resolve(&self.metadata, &self.registry, &self.indices, source)
            .await
    }

    pub(crate) fn age(&self, index: &str, key: &AgeKey) -> Option<i64> {
        self.ages.get(index, key)
    }

    /// Per-index maximum segment count of every open index.
    pub(crate) async fn segment_counts(&mut self) -> Result<&BTreeMap<String, u64>> {
        if self.segments.is_none() {
            let open: Vec<String> = self
                .registry
                .records()
                .filter(|record| record.is_open())
                .map(|record| record.name.clone())
                .collect();
            debug!(indices = open.len(), "Fetching segment counts");
            self.segments = Some(self.metadata.segment_counts(&open).await?);
        }
        Ok(self.segments.get_or_insert_with(BTreeMap::new))
    }

    /// Keep an index iff its condition differs from `exclude`.
    ///
    /// `None` means the condition could not be determined; such indices are
    /// dropped.
    pub(crate) fn excludify(
        &mut self,
        filter: &str,
        exclude: bool,
        mut condition: impl FnMut(&IndexList, &str) -> Option<bool>,
    ) {
        let before = self.indices.len();
        let indices = std::mem::take(&mut self.indices);
        let kept: Vec<String> = indices
            .into_iter()
            .filter(|index| match condition(self, index.as_str()) {
                Some(matched) if matched != exclude => true,
                Some(matched) => {
                    debug!(index = %index, filter, matched, exclude, "Removed from working set");
                    false
                }
                None => {
                    debug!(index = %index, filter, "Removed from working set, condition undetermined");
                    false
                }
            })
            .collect();
        self.indices = kept;

        debug!(filter, before, after = self.indices.len(), "Applied filter");
    }
}

impl std::fmt::Debug for IndexList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexList")
            .field("registry", &self.registry.len())
            .field("indices", &self.indices)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Query;
    use crate::testing::{four_indices, two_indices};

    #[tokio::test]
    async fn test_starts_with_every_index_sorted() {
        let list = IndexList::new(Arc::new(four_indices().build())).await.unwrap();
        assert_eq!(
            list.indices(),
            ["a-2016.03.03", "b-2016.03.04", "c-2016.03.05", "d-2016.03.06"]
        );
    }

    #[tokio::test]
    async fn test_set_indices_rejects_unknown_names() {
        let mut list = IndexList::new(Arc::new(two_indices().build())).await.unwrap();

        let err = list
            .set_indices(vec!["index-2016.03.03".into(), "nope".into()])
            .unwrap_err();
        assert!(matches!(err, CuratorError::InvalidValue(_)));
        assert_eq!(list.indices().len(), 2);

        list.set_indices(vec!["index-2016.03.04".into()]).unwrap();
        assert_eq!(list.indices(), ["index-2016.03.04"]);

        list.reset();
        assert_eq!(list.indices(), ["index-2016.03.03", "index-2016.03.04"]);
    }

    #[tokio::test]
    async fn test_empty_list_check() {
        let mut list = IndexList::new(Arc::new(two_indices().build())).await.unwrap();
        assert!(list.empty_list_check().is_ok());

        list.set_indices(vec![]).unwrap();
        assert!(matches!(list.empty_list_check(), Err(CuratorError::NoIndices)));
    }

    #[tokio::test]
    async fn test_excludify_drops_undetermined_indices() {
        let mut list = IndexList::new(Arc::new(four_indices().build())).await.unwrap();

        list.excludify("test", false, |_, index| match index {
            "a-2016.03.03" => Some(true),
            "b-2016.03.04" => Some(false),
            _ => None,
        });
        assert_eq!(list.indices(), ["a-2016.03.03"]);
    }

    #[tokio::test]
    async fn test_segment_counts_fetched_once_for_open_indices() {
        let client = Arc::new(
            four_indices()
                .index("c-2016.03.05", |index| index.closed().segments(&[9]))
                .index("d-2016.03.06", |index| index.segments(&[4, 7]))
                .build(),
        );
        let mut list = IndexList::new(client.clone()).await.unwrap();

        let counts = list.segment_counts().await.unwrap().clone();
        list.segment_counts().await.unwrap();

        assert_eq!(client.calls(Query::Segments), 1);
        assert_eq!(counts.get("d-2016.03.06"), Some(&7));
        assert_eq!(counts.get("c-2016.03.05"), None);
    }
}
