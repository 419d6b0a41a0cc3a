//! In-memory reference engine.
//!
//! [`MemoryEngine`] implements the driver boundary without the native Pact
//! engine. It records every interaction into a [`Contract`] and renders the
//! contract document, which makes the builders usable in unit tests and as
//! a dry run before a real engine is plugged in. It performs no matching and
//! never writes files.
//!
//! # Module Structure
//!
//! - `types` - Interaction data model (requests, responses, provider states)
//! - `memory` - Engine and per-interaction driver handle

mod memory;
mod types;

pub use memory::{MemoryEngine, MemoryInteraction};
pub use types::{
    Body, Contract, Interaction, ProviderState, RepeatedValues, RequestDefinition,
    ResponseDefinition,
};
