//! Age threshold filter.

use chrono::Utc;

use super::params::Params;
use crate::age::{AgeSource, StatsResult};
use crate::error::{CuratorError, Result};
use crate::index_list::IndexList;

/// Which side of the cutoff is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Older,
    Younger,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "older" => Some(Direction::Older),
            "younger" => Some(Direction::Younger),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Older => "older",
            Direction::Younger => "younger",
        }
    }
}

/// Calendar units, as fixed second counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl TimeUnit {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "seconds" => Some(TimeUnit::Seconds),
            "minutes" => Some(TimeUnit::Minutes),
            "hours" => Some(TimeUnit::Hours),
            "days" => Some(TimeUnit::Days),
            "weeks" => Some(TimeUnit::Weeks),
            "months" => Some(TimeUnit::Months),
            "years" => Some(TimeUnit::Years),
            _ => None,
        }
    }

    pub fn seconds(&self) -> i64 {
        match self {
            TimeUnit::Seconds => 1,
            TimeUnit::Minutes => 60,
            TimeUnit::Hours => 3_600,
            TimeUnit::Days => 86_400,
            TimeUnit::Weeks => 604_800,
            TimeUnit::Months => 2_592_000,
            TimeUnit::Years => 31_536_000,
        }
    }
}

/// Parse `source`, `timestring`, `field` and `stats_result`.
///
/// `invalid_stats_result` builds the error for an unknown `stats_result`,
/// which differs between the age and space filters.
pub(crate) fn age_source(
    params: &Params,
    default_source: &str,
    invalid_stats_result: fn(String) -> CuratorError,
) -> Result<AgeSource> {
    let source = params.string("source")?.unwrap_or(default_source);
    match source {
        "name" => {
            let timestring = params
                .string("timestring")?
                .ok_or_else(|| CuratorError::missing("timestring is required when source is name"))?;
            Ok(AgeSource::Name(timestring.to_string()))
        }
        "creation_date" => Ok(AgeSource::CreationDate),
        "field_stats" => {
            let field = params
                .string("field")?
                .ok_or_else(|| CuratorError::missing("field is required when source is field_stats"))?;
            let stats_result = match params.string("stats_result")? {
                None => StatsResult::default(),
                Some(value) => StatsResult::parse(value).ok_or_else(|| {
                    invalid_stats_result(format!(
                        "stats_result must be min_value or max_value, got '{value}'"
                    ))
                })?,
            };
            Ok(AgeSource::FieldStats {
                field: field.to_string(),
                stats_result,
            })
        }
        other => Err(CuratorError::invalid(format!(
            "source must be one of name, creation_date, field_stats, got '{other}'"
        ))),
    }
}

/// Keeps indices older or younger than a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeFilter {
    pub source: AgeSource,
    pub direction: Direction,
    pub offset_seconds: i64,
    /// Point of reference; now when unset.
    pub epoch: Option<i64>,
    pub exclude: bool,
}

impl AgeFilter {
    pub(crate) fn from_params(params: &Params) -> Result<Self> {
        params.allow(&[
            "source",
            "direction",
            "unit",
            "unit_count",
            "epoch",
            "timestring",
            "field",
            "stats_result",
            "exclude",
        ])?;

        let unit = params
            .string("unit")?
            .ok_or_else(|| CuratorError::missing("unit"))?;
        let unit = TimeUnit::parse(unit)
            .ok_or_else(|| CuratorError::invalid(format!("unknown unit '{unit}'")))?;
        let unit_count = params
            .integer("unit_count")?
            .ok_or_else(|| CuratorError::missing("unit_count"))?;
        let direction = params
            .string("direction")?
            .ok_or_else(|| CuratorError::missing("direction"))?;
        let direction = Direction::parse(direction).ok_or_else(|| {
            CuratorError::invalid(format!("direction must be older or younger, got '{direction}'"))
        })?;
        let source = age_source(params, "name", CuratorError::InvalidValue)?;
        let offset_seconds = unit_count
            .checked_mul(unit.seconds())
            .ok_or_else(|| CuratorError::invalid(format!("unit_count {unit_count} is too large")))?;

        Ok(Self {
            source,
            direction,
            offset_seconds,
            epoch: params.integer("epoch")?,
            exclude: params.bool_or("exclude", false)?,
        })
    }

    pub fn cutoff(&self) -> i64 {
        let epoch = self.epoch.unwrap_or_else(|| Utc::now().timestamp());
        match self.direction {
            Direction::Older => epoch.saturating_sub(self.offset_seconds),
            Direction::Younger => epoch.saturating_add(self.offset_seconds),
        }
    }

    pub fn description(&self) -> String {
        format!(
            "age({} {} {}s from {}, exclude={})",
            self.source.key(),
            self.direction.as_str(),
            self.offset_seconds,
            self.epoch.map_or_else(|| "now".to_string(), |epoch| epoch.to_string()),
            self.exclude
        )
    }

    pub(crate) async fn apply(&self, list: &mut IndexList) -> Result<()> {
        list.resolve_ages(&self.source).await?;

        let key = self.source.key();
        let cutoff = self.cutoff();
        let direction = self.direction;
        list.excludify("age", self.exclude, |list, index| {
            let age = list.age(index, &key)?;
            Some(match direction {
                Direction::Older => age <= cutoff,
                Direction::Younger => age >= cutoff,
            })
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
    use crate::testing::{SnapshotBuilder, two_indices};

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => Params::new("age", map),
            _ => unreachable!(),
        }
    }

    async fn run(builder: SnapshotBuilder, descriptor: Value) -> Result<Vec<String>> {
        let mut list = IndexList::new(Arc::new(builder.build())).await?;
        AgeFilter::from_params(&params(descriptor))?
            .apply(&mut list)
            .await?;
        Ok(list.into_indices())
    }

    #[test]
    fn test_validation_order() {
        let cases = [
            (json!({"unit_count": 1, "direction": "older"}), "missing"),
            (json!({"unit": "fortnights", "unit_count": 1, "direction": "older"}), "invalid"),
            (json!({"unit": "days", "direction": "older"}), "missing"),
            (json!({"unit": "days", "unit_count": 1}), "missing"),
            (json!({"unit": "days", "unit_count": 1, "direction": "invalid"}), "invalid"),
            (
                json!({"unit": "days", "unit_count": 1, "direction": "older", "source": "invalid"}),
                "invalid",
            ),
            (json!({"unit": "days", "unit_count": 1, "direction": "older", "source": "name"}), "missing"),
            (json!({"unit": "days", "unit_count": 1, "direction": "older"}), "missing"),
            (
                json!({"unit": "days", "unit_count": 1, "direction": "older", "source": "field_stats"}),
                "missing",
            ),
            (
                json!({"unit": "days", "unit_count": 1, "direction": "older",
                       "source": "field_stats", "field": "timestamp", "stats_result": "invalid"}),
                "invalid",
            ),
        ];

        for (descriptor, expected) in cases {
            let err = AgeFilter::from_params(&params(descriptor.clone())).unwrap_err();
            let actual = match err {
                CuratorError::MissingArgument(_) => "missing",
                CuratorError::InvalidValue(_) => "invalid",
                other => panic!("unexpected error {other:?} for {descriptor}"),
            };
            assert_eq!(actual, expected, "{descriptor}");
        }
    }

    #[test]
    fn test_cutoff() {
        let filter = AgeFilter::from_params(&params(json!({
            "source": "creation_date", "direction": "older",
            "unit": "days", "unit_count": 1, "epoch": 1457049600
        })))
        .unwrap();
        assert_eq!(filter.cutoff(), 1456963200);

        let filter = AgeFilter {
            direction: Direction::Younger,
            ..filter
        };
        assert_eq!(filter.cutoff(), 1457136000);
    }

    #[tokio::test]
    async fn test_name_age() {
        let younger = run(
            two_indices(),
            json!({"source": "name", "direction": "younger", "timestring": "%Y.%m.%d",
                   "unit": "seconds", "unit_count": 0, "epoch": 1457049600}),
        )
        .await
        .unwrap();
        assert_eq!(younger, ["index-2016.03.04"]);

        let older = run(
            two_indices(),
            json!({"source": "name", "direction": "older", "timestring": "%Y.%m.%d",
                   "unit": "seconds", "unit_count": 0, "epoch": 1456963200}),
        )
        .await
        .unwrap();
        assert_eq!(older, ["index-2016.03.03"]);
    }

    #[tokio::test]
    async fn test_creation_date_age() {
        let older_than_now = run(
            two_indices(),
            json!({"source": "creation_date", "direction": "older", "unit": "days", "unit_count": 1}),
        )
        .await
        .unwrap();
        assert_eq!(older_than_now, ["index-2016.03.03", "index-2016.03.04"]);

        let younger_than_now = run(
            two_indices(),
            json!({"source": "creation_date", "direction": "younger", "unit": "days", "unit_count": 1}),
        )
        .await
        .unwrap();
        assert!(younger_than_now.is_empty());

        let younger = run(
            two_indices(),
            json!({"source": "creation_date", "direction": "younger", "unit": "seconds",
                   "unit_count": 0, "epoch": 1457049600}),
        )
        .await
        .unwrap();
        assert_eq!(younger, ["index-2016.03.04"]);
    }

    #[tokio::test]
    async fn test_field_stats_age() {
        let cases = [
            ("min_value", "younger", 1457049600, vec!["index-2016.03.04"]),
            ("min_value", "older", 1456963206, vec!["index-2016.03.03"]),
            ("max_value", "younger", 1457135999, vec!["index-2016.03.04"]),
            ("max_value", "older", 1457049599, vec!["index-2016.03.03"]),
        ];

        for (stats_result, direction, epoch, expected) in cases {
            let indices = run(
                two_indices(),
                json!({"source": "field_stats", "field": "timestamp", "stats_result": stats_result,
                       "direction": direction, "unit": "seconds", "unit_count": 0, "epoch": epoch}),
            )
            .await
            .unwrap();
            assert_eq!(indices, expected, "{stats_result} {direction} {epoch}");
        }
    }

    #[tokio::test]
    async fn test_missing_age_is_excluded_in_both_directions() {
        let builder = two_indices().index("no-date-here", |index| index);

        for direction in ["older", "younger"] {
            let indices = run(
                builder.clone(),
                json!({"source": "name", "direction": direction, "timestring": "%Y.%m.%d",
                       "unit": "seconds", "unit_count": 0, "epoch": 1457000000}),
            )
            .await
            .unwrap();
            assert!(!indices.contains(&"no-date-here".to_string()), "{direction}");
            assert_eq!(indices.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_exclude_inverts_decision() {
        let indices = run(
            two_indices(),
            json!({"source": "creation_date", "direction": "older", "unit": "seconds",
                   "unit_count": 0, "epoch": 1456963200, "exclude": true}),
        )
        .await
        .unwrap();
        assert_eq!(indices, ["index-2016.03.04"]);
    }

    #[tokio::test]
    async fn test_applying_twice_is_idempotent() {
        let mut list = IndexList::new(Arc::new(two_indices().build())).await.unwrap();
        let filter = AgeFilter::from_params(&params(json!({
            "source": "field_stats", "field": "timestamp", "direction": "older",
            "unit": "seconds", "unit_count": 0, "epoch": 1456963206
        })))
        .unwrap();

        filter.apply(&mut list).await.unwrap();
        let once = list.indices().to_vec();
        filter.apply(&mut list).await.unwrap();

        assert_eq!(list.indices(), once.as_slice());
    }

    #[tokio::test]
    async fn test_field_stats_query_failure() {
        let result = run(
            two_indices().fail(Query::FieldStats),
            json!({"source": "field_stats", "field": "timestamp", "direction": "older",
                   "unit": "days", "unit_count": 1}),
        )
        .await;
        assert!(matches!(result, Err(CuratorError::FetchFailed { .. })));
    }
}
