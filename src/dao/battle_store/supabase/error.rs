//! Error types shared by the Supabase storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`SupabaseError`] failures.
pub type SupabaseResult<T> = Result<T, SupabaseError>;

/// Failures that can occur while talking to the Supabase REST API.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build Supabase client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or timed out.
    #[error("failed to send Supabase request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The API answered with a non-success status code.
    #[error("unexpected Supabase response status {status} for `{path}`: {body}")]
    RequestStatus {
        path: String,
        status: StatusCode,
        body: String,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode Supabase response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A row did not match the expected model.
    #[error("failed to deserialize Supabase row for `{path}`")]
    DeserializeRow {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// A row carried a value the core does not understand.
    #[error("invalid value in Supabase row for `{path}`: {detail}")]
    InvalidRow { path: String, detail: String },
}

impl From<SupabaseError> for StorageError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::DeserializeRow { .. } | SupabaseError::InvalidRow { .. } => {
                StorageError::malformed(err.to_string())
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
