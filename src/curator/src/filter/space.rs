//! Disk space quota sweep.

use std::collections::HashMap;

use super::age::age_source;
use super::params::Params;
use crate::age::AgeSource;
use crate::error::{CuratorError, Result};
use crate::index_list::IndexList;

const BYTES_PER_GIB: f64 = 1_073_741_824.0;

/// Marks every index beyond a cumulative size quota.
///
/// Indices are walked newest first (by name, or by age when `use_age` is
/// set); once the running total exceeds `disk_space` GiB, that index and
/// all following ones are over quota.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceFilter {
    pub disk_space: f64,
    pub reverse: bool,
    pub use_age: bool,
    pub source: AgeSource,
    pub exclude: bool,
}

impl SpaceFilter {
    pub(crate) fn from_params(params: &Params) -> Result<Self> {
        params.allow(&[
            "disk_space",
            "reverse",
            "use_age",
            "source",
            "timestring",
            "field",
            "stats_result",
            "exclude",
        ])?;

        let disk_space = params
            .number("disk_space")?
            .filter(|space| *space != 0.0)
            .ok_or_else(|| CuratorError::missing("disk_space"))?;
        if !disk_space.is_finite() || disk_space < 0.0 {
            return Err(CuratorError::invalid(format!(
                "disk_space must be a positive number, got {disk_space}"
            )));
        }

        let use_age = params.bool_or("use_age", false)?;
        let source = if use_age {
            age_source(params, "creation_date", CuratorError::Configuration)?
        } else {
            AgeSource::CreationDate
        };

        Ok(Self {
            disk_space,
            reverse: params.bool_or("reverse", true)?,
            use_age,
            source,
            exclude: params.bool_or("exclude", false)?,
        })
    }

    pub fn limit_bytes(&self) -> f64 {
        self.disk_space * BYTES_PER_GIB
    }

    pub fn description(&self) -> String {
        let order = if self.use_age {
            self.source.key().to_string()
        } else {
            "name".to_string()
        };
        format!(
            "space({} GiB by {order}, reverse={}, exclude={})",
            self.disk_space, self.reverse, self.exclude
        )
    }

    pub(crate) async fn apply(&self, list: &mut IndexList) -> Result<()> {
        let mut ordered: Vec<String> = if self.use_age {
            list.resolve_ages(&self.source).await?;
            let key = self.source.key();
            let mut aged: Vec<(i64, String)> = list
                .indices()
                .iter()
                .filter_map(|index| list.age(index, &key).map(|age| (age, index.clone())))
                .collect();
            aged.sort();
            aged.into_iter().map(|(_, index)| index).collect()
        } else {
            let mut names = list.indices().to_vec();
            names.sort();
            names
        };

        if self.reverse {
            ordered.reverse();
        }

        let limit = self.limit_bytes();
        let mut total: u64 = 0;
        let mut over_quota = HashMap::new();
        for index in ordered {
            let size = list
                .registry()
                .get(&index)
                .map_or(0, |record| record.size_in_bytes);
            total = total.saturating_add(size);
            over_quota.insert(index, total as f64 > limit);
        }

        list.excludify("space", self.exclude, |_, index| {
            over_quota.get(index).copied()
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};

    use super::*;
    use crate::testing::{GIB, MIB, SnapshotBuilder, four_indices, two_indices};

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => Params::new("space", map),
            _ => unreachable!(),
        }
    }

    async fn run(builder: SnapshotBuilder, descriptor: Value) -> Result<Vec<String>> {
        let mut list = IndexList::new(Arc::new(builder.build())).await?;
        SpaceFilter::from_params(&params(descriptor))?
            .apply(&mut list)
            .await?;
        Ok(list.into_indices())
    }

    #[test]
    fn test_disk_space_is_required() {
        for descriptor in [json!({}), json!({"disk_space": 0}), json!({"disk_space": null})] {
            let err = SpaceFilter::from_params(&params(descriptor)).unwrap_err();
            assert!(matches!(err, CuratorError::MissingArgument(_)));
        }
        let negative = SpaceFilter::from_params(&params(json!({"disk_space": -1})));
        assert!(matches!(negative, Err(CuratorError::InvalidValue(_))));
    }

    #[test]
    fn test_age_mode_validation() {
        let cases = [
            (json!({"disk_space": 2.1, "use_age": true, "source": "invalid"}), "invalid"),
            (json!({"disk_space": 2.1, "use_age": true, "source": "name"}), "missing"),
            (json!({"disk_space": 2.1, "use_age": true, "source": "min_value"}), "invalid"),
            (json!({"disk_space": 2.1, "use_age": true, "source": "field_stats"}), "missing"),
            (
                json!({"disk_space": 2.1, "use_age": true, "source": "field_stats",
                       "field": "timestamp", "stats_result": "invalid"}),
                "configuration",
            ),
        ];

        for (descriptor, expected) in cases {
            let err = SpaceFilter::from_params(&params(descriptor.clone())).unwrap_err();
            let actual = match err {
                CuratorError::MissingArgument(_) => "missing",
                CuratorError::InvalidValue(_) => "invalid",
                CuratorError::Configuration(_) => "configuration",
                other => panic!("unexpected error {other:?}"),
            };
            assert_eq!(actual, expected, "{descriptor}");
        }
    }

    #[test]
    fn test_age_parameters_ignored_without_use_age() {
        let filter =
            SpaceFilter::from_params(&params(json!({"disk_space": 1, "source": "invalid"}))).unwrap();
        assert_eq!(filter.source, AgeSource::CreationDate);
        assert!(filter.reverse);
    }

    #[tokio::test]
    async fn test_sweep_by_name() {
        let newest_first = run(two_indices(), json!({"disk_space": 1.1})).await.unwrap();
        assert_eq!(newest_first, ["index-2016.03.03"]);

        let oldest_first = run(two_indices(), json!({"disk_space": 1.1, "reverse": false}))
            .await
            .unwrap();
        assert_eq!(oldest_first, ["index-2016.03.04"]);
    }

    #[tokio::test]
    async fn test_sweep_by_age() {
        let descriptors = [
            json!({"disk_space": 2.1, "use_age": true}),
            json!({"disk_space": 2.1, "use_age": true, "source": "name", "timestring": "%Y.%m.%d"}),
            json!({"disk_space": 2.1, "use_age": true, "source": "field_stats", "field": "timestamp"}),
        ];

        for descriptor in descriptors {
            let indices = run(four_indices(), descriptor.clone()).await.unwrap();
            assert_eq!(indices, ["a-2016.03.03"], "{descriptor}");
        }
    }

    #[tokio::test]
    async fn test_quota_boundary() {
        let single = || SnapshotBuilder::new().index("a-2016.03.03", |index| index.size(GIB));

        let exact = run(single(), json!({"disk_space": 1.0})).await.unwrap();
        assert!(exact.is_empty());

        let one_byte_less = (GIB - 1) as f64 / GIB as f64;
        let over = run(single(), json!({"disk_space": one_byte_less})).await.unwrap();
        assert_eq!(over, ["a-2016.03.03"]);
    }

    #[tokio::test]
    async fn test_quota_boundary_on_the_first_index_walked() {
        // Newest first: b is walked before a.
        let pair = || {
            SnapshotBuilder::new()
                .index("a-2016.03.03", |index| index.size(GIB))
                .index("b-2016.03.04", |index| index.size(512 * MIB))
        };

        let exact = run(pair(), json!({"disk_space": 0.5})).await.unwrap();
        assert_eq!(exact, ["a-2016.03.03"]);

        let one_byte_less = (512 * MIB - 1) as f64 / GIB as f64;
        let over = run(pair(), json!({"disk_space": one_byte_less})).await.unwrap();
        assert_eq!(over, ["a-2016.03.03", "b-2016.03.04"]);
    }

    #[tokio::test]
    async fn test_indices_without_age_are_dropped_in_age_mode() {
        let builder = four_indices().index("z-undated", |index| index.size(GIB));
        let indices = run(
            builder,
            json!({"disk_space": 100, "use_age": true, "source": "name", "timestring": "%Y.%m.%d",
                   "exclude": true}),
        )
        .await
        .unwrap();
        assert_eq!(indices.len(), 4);
        assert!(!indices.contains(&"z-undated".to_string()));
    }

    #[tokio::test]
    async fn test_exclude_keeps_indices_within_quota() {
        let indices = run(four_indices(), json!({"disk_space": 2.1, "exclude": true}))
            .await
            .unwrap();
        assert_eq!(indices, ["b-2016.03.04", "c-2016.03.05", "d-2016.03.06"]);
    }
}
