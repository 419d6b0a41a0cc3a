//! Errors raised while authoring interactions.

use crate::driver::EngineFailure;
use crate::matchers::MatcherError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PactError {
    /// The engine rejected a driver call. Fatal to the current interaction.
    #[error("Unable to perform the given action. The interop call returned failure: {0}")]
    Engine(String),

    /// The builder was used out of order or with conflicting data.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Failed to serialize body: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unable to use file {path} for upload: {source}")]
    FileUpload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Matcher(#[from] MatcherError),
}

impl From<EngineFailure> for PactError {
    fn from(failure: EngineFailure) -> Self {
        PactError::Engine(failure.into_message())
    }
}
