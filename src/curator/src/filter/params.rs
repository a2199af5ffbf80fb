//! Typed access to the keyword parameters of a filter descriptor.

use serde_json::{Map, Value};

use crate::error::{CuratorError, Result};

/// The parameters of one descriptor, `filtertype` already removed.
///
/// A key that is present but `null` counts as absent.
#[derive(Debug, Clone)]
pub struct Params {
    filtertype: &'static str,
    values: Map<String, Value>,
}

impl Params {
    pub fn new(filtertype: &'static str, values: Map<String, Value>) -> Self {
        Self { filtertype, values }
    }

    /// Reject keys the filter does not define.
    pub fn allow(&self, keys: &[&str]) -> Result<()> {
        match self.values.keys().find(|key| !keys.contains(&key.as_str())) {
            Some(key) => Err(CuratorError::configuration(format!(
                "{} filter does not accept '{key}'",
                self.filtertype
            ))),
            None => Ok(()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|value| !value.is_null())
    }

    pub fn string(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(other) => Err(self.wrong_type(key, "a string", other)),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Bool(value)) => Ok(*value),
            Some(other) => Err(self.wrong_type(key, "a boolean", other)),
        }
    }

    pub fn integer(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(number)) => number
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.wrong_type(key, "an integer", &Value::Number(number.clone()))),
            Some(other) => Err(self.wrong_type(key, "an integer", other)),
        }
    }

    pub fn number(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(number)) => Ok(number.as_f64()),
            Some(other) => Err(self.wrong_type(key, "a number", other)),
        }
    }

    fn wrong_type(&self, key: &str, expected: &str, found: &Value) -> CuratorError {
        CuratorError::invalid(format!(
            "{} filter expects {key} to be {expected}, got {found}",
            self.filtertype
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => Params::new("test", map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_null_counts_as_absent() {
        let params = params(json!({"value": null, "exclude": true}));
        assert!(params.get("value").is_none());
        assert_eq!(params.string("value").unwrap(), None);
        assert!(params.bool_or("exclude", false).unwrap());
    }

    #[test]
    fn test_wrong_types_are_invalid_values() {
        let params = params(json!({"exclude": "yes", "unit_count": 1.5, "kind": 3}));
        assert!(matches!(params.bool_or("exclude", false), Err(CuratorError::InvalidValue(_))));
        assert!(matches!(params.integer("unit_count"), Err(CuratorError::InvalidValue(_))));
        assert!(matches!(params.string("kind"), Err(CuratorError::InvalidValue(_))));
        assert_eq!(params.number("unit_count").unwrap(), Some(1.5));
    }

    #[test]
    fn test_unknown_keys_are_configuration_errors() {
        let params = params(json!({"kind": "prefix", "valu": "logs"}));
        assert!(params.allow(&["kind", "value"]).is_err());
        assert!(params.allow(&["kind", "valu"]).is_ok());
    }
}
