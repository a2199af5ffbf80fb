//! Shard allocation attribute filter.

use super::params::Params;
use crate::error::{CuratorError, Result};
use crate::index_list::IndexList;
use crate::registry::AllocationType;

/// Matches indices whose allocation rules of `allocation_type` map `key` to
/// exactly `value`. An index without the attribute never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedFilter {
    pub key: String,
    pub value: String,
    pub allocation_type: AllocationType,
    pub exclude: bool,
}

impl AllocatedFilter {
    pub(crate) fn from_params(params: &Params) -> Result<Self> {
        params.allow(&["key", "value", "allocation_type", "exclude"])?;

        let key = params
            .string("key")?
            .ok_or_else(|| CuratorError::missing("key"))?;
        let value = params
            .string("value")?
            .ok_or_else(|| CuratorError::missing("value"))?;
        let allocation_type = match params.string("allocation_type")? {
            None => AllocationType::Require,
            Some(raw) => AllocationType::parse(raw).ok_or_else(|| {
                CuratorError::invalid(format!(
                    "allocation_type must be one of include, exclude, require, got '{raw}'"
                ))
            })?,
        };

        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
            allocation_type,
            exclude: params.bool_or("exclude", true)?,
        })
    }

    pub fn description(&self) -> String {
        format!(
            "allocated({}.{}={}, exclude={})",
            self.allocation_type.as_str(),
            self.key,
            self.value,
            self.exclude
        )
    }

    pub(crate) fn apply(&self, list: &mut IndexList) {
        list.excludify("allocated", self.exclude, |list, index| {
            let record = list.registry().get(index)?;
            Some(record.allocation.get(self.allocation_type, &self.key) == Some(self.value.as_str()))
        });
    }
}
