//! Error types for the catalog search pipeline.

use catalog_search_repository::SearchError;
use catalog_search_shared::RecordError;
use thiserror::Error;

/// Errors raised by the content source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The request never produced a response.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The content API answered with a non-success status.
    #[error("Content API returned status {status}: {body}")]
    StatusError { status: u16, body: String },

    /// The response body could not be decoded into records.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// The source was configured with an unusable URL or client setting.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SourceError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::DecodeError(err.to_string())
        } else {
            Self::TransportError(err.to_string())
        }
    }
}

impl From<RecordError> for SourceError {
    fn from(err: RecordError) -> Self {
        Self::DecodeError(err.to_string())
    }
}

/// Errors that propagate out of the pipeline to its callers.
///
/// Per-record failures inside a batch never surface here; they are reported
/// in the batch summaries instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The content source could not be read.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// The search store could not be read or written.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] SearchError),

    /// The requested index type is not `all` or a known entity kind.
    #[error("Invalid index type: {0}")]
    InvalidIndexType(String),
}

impl PipelineError {
    /// Create an invalid index type error.
    pub fn invalid_index_type(kind: impl Into<String>) -> Self {
        Self::InvalidIndexType(kind.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: PipelineError = SourceError::transport("connection reset").into();
        assert!(matches!(err, PipelineError::SourceUnavailable(_)));
        assert_eq!(
            err.to_string(),
            "Source unavailable: Transport error: connection reset"
        );

        let err: PipelineError = SearchError::query("boom").into();
        assert!(matches!(err, PipelineError::StoreUnavailable(_)));

        let err: SourceError = RecordError::MissingId.into();
        assert_eq!(err, SourceError::DecodeError("Record has no id".to_string()));
    }
}
