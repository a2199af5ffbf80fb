//! Force-merge status filter.

use super::params::Params;
use crate::error::{CuratorError, Result};
use crate::index_list::IndexList;

/// Matches indices whose busiest shard has at most `max_num_segments`
/// segments, i.e. indices that are already merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForceMergedFilter {
    pub max_num_segments: u64,
    pub exclude: bool,
}

impl ForceMergedFilter {
    pub fn new(max_num_segments: u64) -> Self {
        Self {
            max_num_segments,
            exclude: true,
        }
    }

    pub(crate) fn from_params(params: &Params) -> Result<Self> {
        params.allow(&["max_num_segments", "exclude"])?;

        let max_num_segments = params
            .integer("max_num_segments")?
            .filter(|max| *max != 0)
            .ok_or_else(|| CuratorError::missing("max_num_segments"))?;
        let max_num_segments = u64::try_from(max_num_segments).map_err(|_| {
            CuratorError::invalid(format!(
                "max_num_segments must be positive, got {max_num_segments}"
            ))
        })?;

        Ok(Self {
            max_num_segments,
            exclude: params.bool_or("exclude", true)?,
        })
    }

    pub fn description(&self) -> String {
        format!(
            "forcemerged(max_num_segments={}, exclude={})",
            self.max_num_segments, self.exclude
        )
    }

    pub(crate) async fn apply(&self, list: &mut IndexList) -> Result<()> {
        let counts = list.segment_counts().await?.clone();
        let max = self.max_num_segments;
        list.excludify("forcemerged", self.exclude, |_, index| {
            counts.get(index).map(|segments| *segments <= max)
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};

    use super::*;
    use crate::client::Query;
    use crate::testing::{SnapshotBuilder, four_indices, two_indices};

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => Params::new("forcemerged", map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_max_num_segments_is_required() {
        for descriptor in [json!({}), json!({"max_num_segments": 0})] {
            let err = ForceMergedFilter::from_params(&params(descriptor)).unwrap_err();
            assert!(matches!(err, CuratorError::MissingArgument(_)));
        }
        let negative = ForceMergedFilter::from_params(&params(json!({"max_num_segments": -2})));
        assert!(matches!(negative, Err(CuratorError::InvalidValue(_))));
    }

    #[tokio::test]
    async fn test_unmerged_index_is_included() {
        let client = SnapshotBuilder::new()
            .index("my_index", |index| index.segments(&[71, 70, 69, 68, 67]))
            .build();
        let mut list = IndexList::new(Arc::new(client)).await.unwrap();

        ForceMergedFilter::new(2).apply(&mut list).await.unwrap();
        assert_eq!(list.indices(), ["my_index"]);
    }

    #[tokio::test]
    async fn test_merged_index_is_excluded() {
        let client = SnapshotBuilder::new()
            .index("my_index", |index| index.segments(&[1, 1, 1, 1, 1]))
            .build();
        let mut list = IndexList::new(Arc::new(client)).await.unwrap();

        ForceMergedFilter::new(2).apply(&mut list).await.unwrap();
        assert!(list.indices().is_empty());
    }

    #[tokio::test]
    async fn test_closed_indices_are_dropped() {
        let client = Arc::new(
            four_indices()
                .index("a-2016.03.03", |index| index.segments(&[10]))
                .index("b-2016.03.04", |index| index.segments(&[1]))
                .index("c-2016.03.05", |index| index.closed().segments(&[10]))
                .index("d-2016.03.06", |index| index.segments(&[3, 2]))
                .build(),
        );
        let mut list = IndexList::new(client.clone()).await.unwrap();

        let filter = ForceMergedFilter::new(2);
        filter.apply(&mut list).await.unwrap();
        assert_eq!(list.indices(), ["a-2016.03.03", "d-2016.03.06"]);

        list.reset();
        let merged = ForceMergedFilter {
            exclude: false,
            ..filter
        };
        merged.apply(&mut list).await.unwrap();
        assert_eq!(list.indices(), ["b-2016.03.04"]);
        assert_eq!(client.calls(Query::Segments), 1);
    }

    #[tokio::test]
    async fn test_segments_failure_propagates() {
        let mut list = IndexList::new(Arc::new(two_indices().fail(Query::Segments).build()))
            .await
            .unwrap();

        let err = ForceMergedFilter::new(2).apply(&mut list).await.unwrap_err();
        assert!(matches!(err, CuratorError::FetchFailed { .. }));
    }
}
