//! Provider state handlers keyed by state name.

use crate::error::ProviderStateError;
use crate::interaction::StateParams;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Provider-local setup run before an interaction is replayed, e.g. seeding
/// a database or resetting an in-memory fixture.
#[async_trait]
pub trait ProviderState: Send + Sync {
    async fn execute(&self, params: &StateParams) -> anyhow::Result<()>;
}

struct SyncState<F>(F);

#[async_trait]
impl<F> ProviderState for SyncState<F>
where
    F: Fn(&StateParams) + Send + Sync,
{
    async fn execute(&self, params: &StateParams) -> anyhow::Result<()> {
        (self.0)(params);
        Ok(())
    }
}

struct AsyncState<F>(F);

#[async_trait]
impl<F, Fut> ProviderState for AsyncState<F>
where
    F: Fn(StateParams) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn execute(&self, params: &StateParams) -> anyhow::Result<()> {
        (self.0)(params.clone()).await
    }
}

/// Immutable name to handler mapping, built once at startup.
#[derive(Clone, Default)]
pub struct ProviderStateRegistry {
    states: HashMap<String, Arc<dyn ProviderState>>,
}

impl ProviderStateRegistry {
    pub fn builder() -> ProviderStateRegistryBuilder {
        ProviderStateRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ProviderState>> {
        self.states.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ProviderStateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderStateRegistry")
            .field("states", &self.names())
            .finish()
    }
}

#[derive(Default)]
pub struct ProviderStateRegistryBuilder {
    entries: Vec<(String, Arc<dyn ProviderState>)>,
}

impl ProviderStateRegistryBuilder {
    /// Register a state that ignores parameters.
    pub fn state<F>(self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.handler(name, SyncState(move |_: &StateParams| action()))
    }

    pub fn state_with_params<F>(self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&StateParams) + Send + Sync + 'static,
    {
        self.handler(name, SyncState(action))
    }

    /// Register a state whose setup is asynchronous or fallible.
    pub fn async_state<F, Fut>(self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(StateParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handler(name, AsyncState(action))
    }

    pub fn handler(mut self, name: impl Into<String>, handler: impl ProviderState + 'static) -> Self {
        self.entries.push((name.into(), Arc::new(handler)));
        self
    }

    pub fn build(self) -> Result<ProviderStateRegistry, ProviderStateError> {
        let mut states = HashMap::with_capacity(self.entries.len());
        for (name, handler) in self.entries {
            if name.is_empty() {
                return Err(ProviderStateError::EmptyName);
            }
            if states.contains_key(&name) {
                return Err(ProviderStateError::Duplicate(name));
            }
            states.insert(name, handler);
        }
        Ok(ProviderStateRegistry { states })
    }
}
