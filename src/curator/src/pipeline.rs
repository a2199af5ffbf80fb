//! Ordered filter chains.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::filter::FilterSpec;
use crate::index_list::IndexList;

/// The filter chain of one action.
///
/// ```yaml
/// filters:
///   - filtertype: pattern
///     kind: prefix
///     value: logstash-
///   - filtertype: age
///     source: name
///     direction: older
///     timestring: '%Y.%m.%d'
///     unit: days
///     unit_count: 30
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Value>>,
}

impl PipelineConfig {
    pub fn new(filters: Vec<Value>) -> Self {
        Self {
            filters: Some(filters),
        }
    }

    pub fn descriptors(&self) -> &[Value] {
        self.filters.as_deref().unwrap_or_default()
    }

    /// Parse every descriptor, failing on the first invalid one.
    pub fn parse(&self) -> Result<Vec<FilterSpec>> {
        self.descriptors()
            .iter()
            .map(FilterSpec::from_descriptor)
            .collect()
    }
}

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub filtertype: &'static str,
    pub description: String,
    pub before: usize,
    pub after: usize,
}

/// Outcome of a whole chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    pub fn removed(&self) -> usize {
        self.stages.iter().map(|stage| stage.before - stage.after).sum()
    }
}

impl IndexList {
    /// Apply every filter of `config` in order; stage N sees the survivors
    /// of stage N-1. An empty chain leaves the working set untouched.
    pub async fn iterate_filters(&mut self, config: &PipelineConfig) -> Result<PipelineReport> {
        let filters = config.parse()?;
        let mut report = PipelineReport::default();

        for (stage, filter) in filters.iter().enumerate() {
            let before = self.indices().len();
            self.apply(filter).await?;
            let after = self.indices().len();

            info!(
                stage,
                filter = %filter.description(),
                before,
                after,
                "Applied filter stage"
            );
            report.stages.push(StageReport {
                filtertype: filter.filtertype(),
                description: filter.description(),
                before,
                after,
            });
        }

        Ok(report)
    }
}
