//! Errors raised while registering or dispatching provider states.

#[derive(Debug, thiserror::Error)]
pub enum ProviderStateError {
    /// The state request body is not a valid state invocation.
    #[error("Unable to deserialize provider state request: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Unable to read provider state request body: {0}")]
    Body(String),

    #[error("Provider state request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Two handlers were registered under one name.
    #[error("Provider state '{0}' is registered more than once")]
    Duplicate(String),

    #[error("Provider state name must not be empty")]
    EmptyName,
}
