//! Provider-state dispatch for contract verification.
//!
//! Before replaying each interaction, a verifier POSTs
//! `{"name": "...", "params": {...}}` to the provider's state route. This
//! crate answers those calls by running the matching registered handler,
//! either as a tower middleware inside an existing hyper/tower stack or via
//! the standalone [`ProviderStateServer`].
//!
//! ```
//! use accord_provider_state::{ProviderStateLayer, ProviderStateRegistry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ProviderStateRegistry::builder()
//!     .state("there are no events", || {})
//!     .state_with_params("an event with id exists", |params| {
//!         let _id = params.get("id");
//!     })
//!     .build()?;
//!
//! let layer = ProviderStateLayer::new(registry).with_route("/provider-states");
//! assert_eq!(layer.route(), "/provider-states");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod interaction;
pub mod middleware;
pub mod registry;
pub mod response;
pub mod server;

pub use accord_core::logging;
pub use config::ProviderStateConfig;
pub use error::ProviderStateError;
pub use interaction::{ProviderStateInteraction, StateParams};
pub use middleware::{ProviderStateLayer, ProviderStateService};
pub use registry::{ProviderState, ProviderStateRegistry, ProviderStateRegistryBuilder};
pub use response::{BoxError, StateBody};
pub use server::{NotFound, ProviderStateServer};
