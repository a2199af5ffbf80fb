//! Open/close state filters.

use super::params::Params;
use crate::error::Result;
use crate::index_list::IndexList;
use crate::registry::IndexState;

/// Matches indices in the given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateFilter {
    pub state: IndexState,
    pub exclude: bool,
}

impl StateFilter {
    pub fn opened() -> Self {
        Self {
            state: IndexState::Open,
            exclude: false,
        }
    }

    pub fn closed() -> Self {
        Self {
            state: IndexState::Close,
            exclude: false,
        }
    }

    pub(crate) fn from_params(state: IndexState, params: &Params) -> Result<Self> {
        params.allow(&["exclude"])?;
        Ok(Self {
            state,
            exclude: params.bool_or("exclude", false)?,
        })
    }

    pub fn description(&self) -> String {
        let name = match self.state {
            IndexState::Open => "opened",
            IndexState::Close => "closed",
        };
        format!("{name}(exclude={})", self.exclude)
    }

    pub(crate) fn apply(&self, list: &mut IndexList) {
        let state = self.state;
        list.excludify("state", self.exclude, |list, index| {
            list.registry().get(index).map(|record| record.state == state)
        });
    }
}
