//! Filters that narrow an [`IndexList`].
//!
//! Every filter pairs a condition with an `exclude` flag. An index survives
//! when its condition differs from `exclude`; an index whose condition cannot
//! be determined is removed.
//!
//! | filtertype    | condition                                   | `exclude` default |
//! |---------------|---------------------------------------------|-------------------|
//! | `pattern`     | name matches prefix/suffix/regex/timestring | false |
//! | `age`         | age on the requested side of the cutoff     | false |
//! | `space`       | index beyond the cumulative size quota      | false |
//! | `forcemerged` | at most `max_num_segments` per shard        | true  |
//! | `allocated`   | allocation attribute has the given value    | true  |
//! | `kibana`      | internal dashboard index                    | true  |
//! | `opened`      | index is open                               | false |
//! | `closed`      | index is closed                             | false |
//! | `none`        | no-op                                       |       |

use serde_json::Value;

use crate::error::{CuratorError, Result};
use crate::index_list::IndexList;
use crate::registry::IndexState;

mod age;
mod allocation;
mod params;
mod pattern;
mod segments;
mod space;
mod state;

pub use age::{AgeFilter, Direction, TimeUnit};
pub use allocation::AllocatedFilter;
pub use params::Params;
pub use pattern::{KibanaFilter, PatternFilter, PatternKind};
pub use segments::ForceMergedFilter;
pub use space::SpaceFilter;
pub use state::StateFilter;

/// A parsed filter stage.
#[derive(Debug, Clone)]
pub enum FilterSpec {
    Pattern(PatternFilter),
    Age(AgeFilter),
    Space(SpaceFilter),
    ForceMerged(ForceMergedFilter),
    Allocated(AllocatedFilter),
    Kibana(KibanaFilter),
    Opened(StateFilter),
    Closed(StateFilter),
    None,
}

impl FilterSpec {
    /// Parse one `{filtertype: ..., ...}` descriptor.
    pub fn from_descriptor(descriptor: &Value) -> Result<Self> {
        let Value::Object(map) = descriptor else {
            return Err(CuratorError::configuration(format!(
                "filter descriptor must be a mapping, got {descriptor}"
            )));
        };

        let mut values = map.clone();
        let filtertype = match values.remove("filtertype") {
            None | Some(Value::Null) => {
                return Err(CuratorError::configuration(
                    "filter descriptor is missing filtertype",
                ));
            }
            Some(Value::String(filtertype)) => filtertype.to_lowercase(),
            Some(other) => {
                return Err(CuratorError::invalid(format!(
                    "filtertype must be a string, got {other}"
                )));
            }
        };

        let params = |kind: &'static str| Params::new(kind, values.clone());
        Ok(match filtertype.as_str() {
            "pattern" => FilterSpec::Pattern(PatternFilter::from_params(&params("pattern"))?),
            "age" => FilterSpec::Age(AgeFilter::from_params(&params("age"))?),
            "space" => FilterSpec::Space(SpaceFilter::from_params(&params("space"))?),
            "forcemerged" | "forcemerge" => {
                FilterSpec::ForceMerged(ForceMergedFilter::from_params(&params("forcemerged"))?)
            }
            "allocated" => FilterSpec::Allocated(AllocatedFilter::from_params(&params("allocated"))?),
            "kibana" => FilterSpec::Kibana(KibanaFilter::from_params(&params("kibana"))?),
            "opened" => {
                FilterSpec::Opened(StateFilter::from_params(IndexState::Open, &params("opened"))?)
            }
            "closed" => {
                FilterSpec::Closed(StateFilter::from_params(IndexState::Close, &params("closed"))?)
            }
            "none" => {
                params("none").allow(&[])?;
                FilterSpec::None
            }
            other => {
                return Err(CuratorError::configuration(format!(
                    "unknown filtertype '{other}'"
                )));
            }
        })
    }

    pub fn filtertype(&self) -> &'static str {
        match self {
            FilterSpec::Pattern(_) => "pattern",
            FilterSpec::Age(_) => "age",
            FilterSpec::Space(_) => "space",
            FilterSpec::ForceMerged(_) => "forcemerged",
            FilterSpec::Allocated(_) => "allocated",
            FilterSpec::Kibana(_) => "kibana",
            FilterSpec::Opened(_) => "opened",
            FilterSpec::Closed(_) => "closed",
            FilterSpec::None => "none",
        }
    }

    pub fn description(&self) -> String {
        match self {
            FilterSpec::Pattern(filter) => filter.description(),
            FilterSpec::Age(filter) => filter.description(),
            FilterSpec::Space(filter) => filter.description(),
            FilterSpec::ForceMerged(filter) => filter.description(),
            FilterSpec::Allocated(filter) => filter.description(),
            FilterSpec::Kibana(filter) => filter.description(),
            FilterSpec::Opened(filter) | FilterSpec::Closed(filter) => filter.description(),
            FilterSpec::None => "none".to_string(),
        }
    }

    pub(crate) async fn apply(&self, list: &mut IndexList) -> Result<()> {
        match self {
            FilterSpec::Pattern(filter) => filter.apply(list),
            FilterSpec::Age(filter) => filter.apply(list).await?,
            FilterSpec::Space(filter) => filter.apply(list).await?,
            FilterSpec::ForceMerged(filter) => filter.apply(list).await?,
            FilterSpec::Allocated(filter) => filter.apply(list),
            FilterSpec::Kibana(filter) => filter.apply(list),
            FilterSpec::Opened(filter) | FilterSpec::Closed(filter) => filter.apply(list),
            FilterSpec::None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_descriptor_must_be_a_mapping() {
        for descriptor in [json!("age"), json!(["pattern"]), json!(null)] {
            let err = FilterSpec::from_descriptor(&descriptor).unwrap_err();
            assert!(matches!(err, CuratorError::Configuration(_)), "{descriptor}");
        }
    }

    #[test]
    fn test_filtertype_errors() {
        let missing = FilterSpec::from_descriptor(&json!({"no_filtertype": "fail"}));
        assert!(matches!(missing, Err(CuratorError::Configuration(_))));

        let float = FilterSpec::from_descriptor(&json!({"filtertype": 12345.6789}));
        assert!(matches!(float, Err(CuratorError::InvalidValue(_))));

        let unknown = FilterSpec::from_descriptor(&json!({"filtertype": "sizzle"}));
        assert!(matches!(unknown, Err(CuratorError::Configuration(_))));
    }

    #[test]
    fn test_filtertype_is_case_insensitive() {
        let spec = FilterSpec::from_descriptor(&json!({"filtertype": "KIBANA"})).unwrap();
        assert_eq!(spec.filtertype(), "kibana");

        let spec =
            FilterSpec::from_descriptor(&json!({"filtertype": "forcemerge", "max_num_segments": 1}))
                .unwrap();
        assert_eq!(spec.filtertype(), "forcemerged");
    }

    #[test]
    fn test_parameters_reach_the_filter() {
        let spec = FilterSpec::from_descriptor(&json!({
            "filtertype": "pattern", "kind": "prefix", "value": "logs-", "exclude": true
        }))
        .unwrap();
        assert_eq!(spec.description(), "pattern(prefix='logs-', exclude=true)");

        let none = FilterSpec::from_descriptor(&json!({"filtertype": "none"}));
        assert!(matches!(none, Ok(FilterSpec::None)));

        let none = FilterSpec::from_descriptor(&json!({"filtertype": "none", "anything": 1}));
        assert!(matches!(none, Err(CuratorError::Configuration(_))));

        let opened = FilterSpec::from_descriptor(&json!({"filtertype": "opened", "kind": "x"}));
        assert!(matches!(opened, Err(CuratorError::Configuration(_))));
    }
}
