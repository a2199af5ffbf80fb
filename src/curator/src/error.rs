//! Error types for metadata resolution and filtering.

use thiserror::Error;

use crate::client::ClientError;

/// Errors raised while building the registry or applying filters.
#[derive(Error, Debug)]
pub enum CuratorError {
    /// A metadata query against the cluster failed.
    #[error("Failed to fetch {query}: {source}")]
    FetchFailed {
        query: &'static str,
        #[source]
        source: ClientError,
    },

    /// The working set is empty where at least one index is expected.
    #[error("No indices in the working set")]
    NoIndices,

    /// A required filter parameter was omitted.
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    /// A parameter has the wrong type or an invalid enumerated value.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The pipeline configuration is structurally invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A field-stats lookup referenced a field absent from an index.
    #[error("Field \"{field}\" not found in index \"{index}\"")]
    FieldNotFound { index: String, field: String },
}

impl CuratorError {
    pub(crate) fn missing(argument: impl Into<String>) -> Self {
        CuratorError::MissingArgument(argument.into())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CuratorError::InvalidValue(message.into())
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        CuratorError::Configuration(message.into())
    }
}

pub type Result<T, E = CuratorError> = std::result::Result<T, E>;
