//! Per-index age along the name, creation-date and field-stats axes.
//!
//! Ages are epoch seconds. They are computed on demand and memoized for the
//! lifetime of an [`AgeResolver`]: a lookup that produced nothing is
//! remembered as well and never retried.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use tracing::debug;

use crate::error::{CuratorError, Result};
use crate::metadata::MetadataResolver;
use crate::registry::Registry;

mod timestring;

pub use timestring::{Timestring, date_regex, parse_stamp};

/// Normalize an epoch to seconds.
///
/// Values of up to ten digits are already seconds, eleven to thirteen digits
/// are milliseconds, and anything longer is truncated to ten digits.
pub fn fix_epoch(epoch: i64) -> i64 {
    let digits = epoch.unsigned_abs().checked_ilog10().map_or(1, |log| log + 1);
    match digits {
        0..=10 => epoch,
        11..=13 => epoch / 1000,
        _ => epoch / 10_i64.pow(digits - 10),
    }
}

/// Which of the two field-stats aggregates to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatsResult {
    #[default]
    MinValue,
    MaxValue,
}

impl StatsResult {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "min_value" => Some(StatsResult::MinValue),
            "max_value" => Some(StatsResult::MaxValue),
            _ => None,
        }
    }
}

/// Where an age comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgeSource {
    Name(String),
    CreationDate,
    FieldStats { field: String, stats_result: StatsResult },
}

impl AgeSource {
    pub fn key(&self) -> AgeKey {
        match self {
            AgeSource::Name(timestring) => AgeKey::Name(timestring.clone()),
            AgeSource::CreationDate => AgeKey::CreationDate,
            AgeSource::FieldStats {
                field,
                stats_result: StatsResult::MinValue,
            } => AgeKey::MinValue(field.clone()),
            AgeSource::FieldStats {
                field,
                stats_result: StatsResult::MaxValue,
            } => AgeKey::MaxValue(field.clone()),
        }
    }
}

/// Cache key of one age dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeKey {
    Name(String),
    CreationDate,
    MinValue(String),
    MaxValue(String),
}

impl fmt::Display for AgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeKey::Name(timestring) => write!(f, "name({timestring})"),
            AgeKey::CreationDate => f.write_str("creation_date"),
            AgeKey::MinValue(field) => write!(f, "min_value({field})"),
            AgeKey::MaxValue(field) => write!(f, "max_value({field})"),
        }
    }
}

/// Memoizing age cache.
#[derive(Debug, Default)]
pub struct AgeResolver {
    ages: BTreeMap<AgeKey, BTreeMap<String, i64>>,
    attempted: HashSet<(AgeKey, String)>,
}

impl AgeResolver {
    /// Seed creation dates from the registry.
    pub fn new(registry: &Registry) -> Self {
        let mut resolver = Self::default();
        for record in registry.records() {
            resolver.attempted.insert((AgeKey::CreationDate, record.name.clone()));
            if let Some(created) = record.creation_date {
                resolver.store(AgeKey::CreationDate, &record.name, created);
            }
        }
        resolver
    }

    /// Cached age of `index` for `key`.
    pub fn get(&self, index: &str, key: &AgeKey) -> Option<i64> {
        self.ages.get(key)?.get(index).copied()
    }

    #[cfg(test)]
    fn attempts(&self, key: &AgeKey) -> usize {
        self.attempted.iter().filter(|(k, _)| k == key).count()
    }

    /// Make sure every index of `indices` has been looked up along `source`.
    pub async fn resolve(
        &mut self,
        metadata: &MetadataResolver,
        registry: &Registry,
        indices: &[String],
        source: &AgeSource,
    ) -> Result<()> {
        match source {
            AgeSource::Name(timestring) => self.resolve_names(indices, timestring),
            AgeSource::CreationDate => Ok(()),
            AgeSource::FieldStats { field, .. } => {
                self.resolve_field_stats(metadata, registry, indices, field)
                    .await
            }
        }
    }

    fn resolve_names(&mut self, indices: &[String], timestring: &str) -> Result<()> {
        let key = AgeKey::Name(timestring.to_string());
        let pending = self.pending(&key, indices.iter());
        if pending.is_empty() {
            return Ok(());
        }

        let parser = Timestring::new(timestring)?;
        for index in pending {
            match parser.epoch_of(&index) {
                Some(epoch) => self.store(key.clone(), &index, epoch),
                None => debug!(index = %index, timestring, "No date token in index name"),
            }
            self.attempted.insert((key.clone(), index));
        }
        Ok(())
    }

    async fn resolve_field_stats(
        &mut self,
        metadata: &MetadataResolver,
        registry: &Registry,
        indices: &[String],
        field: &str,
    ) -> Result<()> {
        let min_key = AgeKey::MinValue(field.to_string());
        let max_key = AgeKey::MaxValue(field.to_string());

        let open = indices
            .iter()
            .filter(|index| registry.get(index).is_some_and(|record| record.is_open()));
        let pending = self.pending(&min_key, open);
        if pending.is_empty() {
            return Ok(());
        }

        debug!(field, indices = pending.len(), "Fetching field stats");
        let response = metadata.field_stats(&pending, field).await?;

        // Check the whole response before caching anything, so a missing
        // field is reported again on the next run.
        let mut resolved = Vec::with_capacity(response.len());
        for (index, fields) in &response {
            if !registry.contains(index) {
                continue;
            }
            let stats = fields
                .get(field)
                .ok_or_else(|| CuratorError::FieldNotFound {
                    index: index.clone(),
                    field: field.to_string(),
                })?;
            resolved.push((index, stats));
        }

        for index in &pending {
            self.attempted.insert((min_key.clone(), index.clone()));
            self.attempted.insert((max_key.clone(), index.clone()));
        }
        for (index, stats) in resolved {
            self.store(min_key.clone(), index, fix_epoch(stats.min_value));
            self.store(max_key.clone(), index, fix_epoch(stats.max_value));
        }
        Ok(())
    }

    fn pending<'a>(&self, key: &AgeKey, indices: impl Iterator<Item = &'a String>) -> Vec<String> {
        indices
            .filter(|index| !self.attempted.contains(&(key.clone(), (*index).clone())))
            .cloned()
            .collect()
    }

    fn store(&mut self, key: AgeKey, index: &str, epoch: i64) {
        self.ages
            .entry(key)
            .or_default()
            .insert(index.to_string(), epoch);
    }
}
