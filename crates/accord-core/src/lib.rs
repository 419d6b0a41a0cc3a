//! Accord: consumer-driven contract testing for HTTP APIs.
//!
//! A consumer describes the interactions it expects from a provider with a
//! fluent builder. Each field may be a literal or a Pact-compatible matching
//! rule. The builder forwards every addition to an [`InteractionDriver`],
//! the narrow boundary to the engine that records, serves and verifies
//! interactions.
//!
//! ```
//! use accord_core::{Matcher, MemoryEngine, Pact, PactSpecification};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = MemoryEngine::new("Event API Consumer", "Event API", PactSpecification::V3);
//! let mut pact = Pact::new(engine.clone());
//!
//! pact.upon_receiving("a request for an event")?
//!     .given("an event with id 42 exists")?
//!     .with_request("GET", "/events/42")?
//!     .with_header("Accept", "application/json")?
//!     .with_query("expand", Matcher::regex("true", "^(true|false)$")?)?
//!     .will_respond()
//!     .with_status(200)?
//!     .with_json_body(&serde_json::json!({ "id": Matcher::integer(42) }))?
//!     .build()?;
//!
//! assert_eq!(engine.interaction_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod logging;
pub mod matchers;
pub mod pact;
pub mod upload;

pub use builder::{
    Configured, JsonOptions, KeyCase, RequestBuilder, ResponseBuilder, Unconfigured,
};
pub use config::{PactConfig, PactSpecification};
pub use driver::{EngineFailure, InteractionDriver, PactEngine};
pub use engine::{Contract, MemoryEngine};
pub use error::PactError;
pub use matchers::{Matcher, MatcherError, Term};
pub use pact::Pact;
pub use upload::{FileUploadClient, MultipartUpload, UploadError};
