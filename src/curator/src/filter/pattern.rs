//! Name based filters.

use regex::Regex;
use serde_json::Value;

use super::params::Params;
use crate::age::date_regex;
use crate::error::{CuratorError, Result};
use crate::index_list::IndexList;

/// How a pattern `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Prefix,
    Suffix,
    Regex,
    Timestring,
}

impl PatternKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "prefix" => Some(PatternKind::Prefix),
            "suffix" => Some(PatternKind::Suffix),
            "regex" => Some(PatternKind::Regex),
            "timestring" => Some(PatternKind::Timestring),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Prefix => "prefix",
            PatternKind::Suffix => "suffix",
            PatternKind::Regex => "regex",
            PatternKind::Timestring => "timestring",
        }
    }
}

/// Matches index names against a prefix, suffix, raw regex or date token.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    kind: PatternKind,
    value: String,
    regex: Regex,
    exclude: bool,
}

impl PatternFilter {
    pub fn new(kind: PatternKind, value: &str, exclude: bool) -> Result<Self> {
        let pattern = match kind {
            PatternKind::Prefix => format!("^{}", regex::escape(value)),
            PatternKind::Suffix => format!("{}$", regex::escape(value)),
            PatternKind::Regex => value.to_string(),
            PatternKind::Timestring => date_regex(value),
        };
        let regex = Regex::new(&pattern).map_err(|e| {
            CuratorError::invalid(format!("invalid {} pattern '{value}': {e}", kind.as_str()))
        })?;

        Ok(Self {
            kind,
            value: value.to_string(),
            regex,
            exclude,
        })
    }

    pub(crate) fn from_params(params: &Params) -> Result<Self> {
        params.allow(&["kind", "value", "exclude"])?;

        let kind = params
            .string("kind")?
            .and_then(PatternKind::parse)
            .ok_or_else(|| {
                CuratorError::invalid("pattern kind must be one of prefix, suffix, regex, timestring")
            })?;

        let value = match params.get("value") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Number(number)) => number.to_string(),
            Some(Value::Bool(flag)) => flag.to_string(),
            Some(other) => {
                return Err(CuratorError::invalid(format!(
                    "pattern value must be a string, number or boolean, got {other}"
                )));
            }
            None => return Err(CuratorError::invalid("pattern value is not set")),
        };

        Self::new(kind, &value, params.bool_or("exclude", false)?)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn description(&self) -> String {
        format!(
            "pattern({}='{}', exclude={})",
            self.kind.as_str(),
            self.value,
            self.exclude
        )
    }

    pub(crate) fn apply(&self, list: &mut IndexList) {
        list.excludify("pattern", self.exclude, |_, index| Some(self.matches(index)));
    }
}

const KIBANA_NAMES: [&str; 4] = [".kibana", ".marvel-kibana", "kibana-int", ".marvel-es-data"];
const KIBANA_PREFIXES: [&str; 2] = [".kibana_", ".kibana-"];

/// Matches the internal indices dashboards keep their state in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KibanaFilter {
    exclude: bool,
}

impl Default for KibanaFilter {
    fn default() -> Self {
        Self { exclude: true }
    }
}

impl KibanaFilter {
    pub fn new(exclude: bool) -> Self {
        Self { exclude }
    }

    pub(crate) fn from_params(params: &Params) -> Result<Self> {
        params.allow(&["exclude"])?;
        Ok(Self::new(params.bool_or("exclude", true)?))
    }

    pub fn is_kibana(name: &str) -> bool {
        KIBANA_NAMES.contains(&name) || KIBANA_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
    }

    pub fn description(&self) -> String {
        format!("kibana(exclude={})", self.exclude)
    }

    pub(crate) fn apply(&self, list: &mut IndexList) {
        list.excludify("kibana", self.exclude, |_, index| Some(Self::is_kibana(index)));
    }
}
