//! Contract session entry point.

use crate::builder::RequestBuilder;
use crate::config::PactConfig;
use crate::driver::PactEngine;
use crate::error::PactError;
use tracing::info;

/// One consumer/provider contract session.
///
/// Each [`upon_receiving`](Pact::upon_receiving) call starts an independent
/// interaction with its own driver handle and builder. Builders are meant to
/// be driven sequentially; interactions authored concurrently need separate
/// sessions or an engine whose handles serialize access.
pub struct Pact<E> {
    engine: E,
    config: PactConfig,
}

impl<E: PactEngine> Pact<E> {
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, PactConfig::default())
    }

    /// Session with explicit settings. Installs the tracing subscriber
    /// from `config.log_level` unless one is already in place.
    pub fn with_config(engine: E, config: PactConfig) -> Self {
        config.init_logging();
        Self { engine, config }
    }

    /// Start a new interaction described by `description`.
    pub fn upon_receiving(
        &mut self,
        description: &str,
    ) -> Result<RequestBuilder<E::Interaction>, PactError> {
        info!(description, "Authoring interaction");
        let driver = self.engine.new_interaction(description)?;
        Ok(RequestBuilder::new(driver, self.config.json.clone()))
    }

    pub fn config(&self) -> &PactConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }
}
