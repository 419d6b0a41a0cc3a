use super::types::{Body, Contract, Interaction, ProviderState};
use crate::config::{PactConfig, PactSpecification};
use crate::driver::{DriverResult, EngineFailure, InteractionDriver, PactEngine};
use crate::matchers::Term;
use parking_lot::Mutex;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const HTTP_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "TRACE", "CONNECT",
];

/// Contract session recording interactions in memory.
///
/// Clones share the same contract, so a test can keep one handle for
/// inspection while the [`Pact`](crate::Pact) session owns another.
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    contract: Arc<Mutex<Contract>>,
}

impl MemoryEngine {
    pub fn new(
        consumer: impl Into<String>,
        provider: impl Into<String>,
        specification: PactSpecification,
    ) -> Self {
        Self {
            contract: Arc::new(Mutex::new(Contract::new(consumer, provider, specification))),
        }
    }

    pub fn from_config(
        consumer: impl Into<String>,
        provider: impl Into<String>,
        config: &PactConfig,
    ) -> Self {
        Self::new(consumer, provider, config.specification)
    }

    /// Snapshot of the contract, including unfinished interactions.
    pub fn contract(&self) -> Contract {
        self.contract.lock().clone()
    }

    /// Number of finalized interactions.
    pub fn interaction_count(&self) -> usize {
        self.contract.lock().finished().count()
    }

    pub fn to_json(&self) -> Value {
        self.contract.lock().to_json()
    }
}

impl PactEngine for MemoryEngine {
    type Interaction = MemoryInteraction;

    fn new_interaction(&mut self, description: &str) -> Result<MemoryInteraction, EngineFailure> {
        if description.trim().is_empty() {
            return Err(EngineFailure::new("interaction description must not be empty"));
        }

        let mut contract = self.contract.lock();
        contract.interactions.push(Interaction::new(description));
        let index = contract.interactions.len() - 1;
        debug!(index, description, "New interaction");

        Ok(MemoryInteraction {
            contract: Arc::clone(&self.contract),
            index,
        })
    }
}

/// Driver handle for one interaction of a [`MemoryEngine`].
#[derive(Debug)]
pub struct MemoryInteraction {
    contract: Arc<Mutex<Contract>>,
    index: usize,
}

impl MemoryInteraction {
    /// Apply `f` to the interaction unless it has already been finalized.
    fn update<F>(&mut self, f: F) -> DriverResult
    where
        F: FnOnce(&mut Interaction) -> Result<(), String>,
    {
        let mut contract = self.contract.lock();
        let interaction = contract
            .interactions
            .get_mut(self.index)
            .ok_or_else(|| EngineFailure::new(format!("unknown interaction {}", self.index)))?;

        if interaction.finished {
            return Err(EngineFailure::new(format!(
                "interaction '{}' has already been finalized",
                interaction.description
            )));
        }

        f(interaction).map_err(EngineFailure::new)
    }
}

impl InteractionDriver for MemoryInteraction {
    fn given(&mut self, state: &str) -> DriverResult {
        self.update(|interaction| {
            interaction.provider_states.push(ProviderState {
                name: state.to_string(),
                ..Default::default()
            });
            Ok(())
        })
    }

    fn given_with_param(&mut self, state: &str, key: &str, value: &str) -> DriverResult {
        self.update(|interaction| {
            let states = &mut interaction.provider_states;
            if states.last().map(|s| s.name.as_str()) != Some(state) {
                states.push(ProviderState {
                    name: state.to_string(),
                    ..Default::default()
                });
            }
            if let Some(last) = states.last_mut() {
                last.params.insert(key.to_string(), value.to_string());
            }
            Ok(())
        })
    }

    fn with_request(&mut self, method: &str, path: &str) -> DriverResult {
        self.update(|interaction| {
            let method = method.to_ascii_uppercase();
            if !HTTP_METHODS.contains(&method.as_str()) {
                return Err(format!("'{method}' is not a standard HTTP method"));
            }
            if path.is_empty() {
                return Err("request path must not be empty".to_string());
            }
            interaction.request.method = Some(method);
            interaction.request.path = Some(Term::parse(path));
            Ok(())
        })
    }

    fn with_query_parameter(&mut self, name: &str, value: &str, index: usize) -> DriverResult {
        self.update(|interaction| {
            interaction
                .request
                .query
                .set(name, index, Term::parse(value))
        })
    }

    fn with_request_header(&mut self, name: &str, value: &str, index: usize) -> DriverResult {
        self.update(|interaction| {
            interaction
                .request
                .headers
                .set(name, index, Term::parse(value))
        })
    }

    fn with_request_body(&mut self, content_type: &str, body: &str) -> DriverResult {
        self.update(|interaction| {
            interaction.request.body = Some(Body::content(content_type, body)?);
            Ok(())
        })
    }

    fn with_file_upload(
        &mut self,
        content_type: &str,
        path: &Path,
        part_name: &str,
    ) -> DriverResult {
        self.update(|interaction| {
            if !path.is_file() {
                return Err(format!("file {} does not exist", path.display()));
            }
            interaction.request.body = Some(Body::FileUpload {
                content_type: content_type.to_string(),
                path: path.to_path_buf(),
                part_name: part_name.to_string(),
            });
            Ok(())
        })
    }

    fn with_response_status(&mut self, status: u16) -> DriverResult {
        self.update(|interaction| {
            if !(100..=599).contains(&status) {
                return Err(format!("status {status} is not a valid HTTP status"));
            }
            interaction.response.status = Some(status);
            Ok(())
        })
    }

    fn with_response_header(&mut self, name: &str, value: &str, index: usize) -> DriverResult {
        self.update(|interaction| {
            interaction
                .response
                .headers
                .set(name, index, Term::parse(value))
        })
    }

    fn with_response_body(&mut self, content_type: &str, body: &str) -> DriverResult {
        self.update(|interaction| {
            interaction.response.body = Some(Body::content(content_type, body)?);
            Ok(())
        })
    }

    fn finish(&mut self) -> DriverResult {
        self.update(|interaction| {
            if !interaction.request.is_complete() {
                return Err(format!(
                    "interaction '{}' has no request method and path",
                    interaction.description
                ));
            }
            interaction.finished = true;
            debug!(description = %interaction.description, "Interaction finalized");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::Matcher;
    use serde_json::json;

    fn engine() -> MemoryEngine {
        MemoryEngine::new("consumer", "provider", PactSpecification::V3)
    }

    #[test]
    fn test_records_full_interaction() {
        let mut engine = engine();
        let mut driver = engine.new_interaction("a request for events").unwrap();

        driver.given("events exist").unwrap();
        driver.given_with_param("an event", "id", "42").unwrap();
        driver.given_with_param("an event", "type", "Created").unwrap();
        driver.with_request("get", "/events").unwrap();
        driver.with_query_parameter("type", "Created", 0).unwrap();
        driver.with_request_header("Accept", "application/json", 0).unwrap();
        driver.with_response_status(200).unwrap();
        driver
            .with_response_header("Content-Type", "application/json", 0)
            .unwrap();
        driver
            .with_response_body("application/json", r#"[{"id":42}]"#)
            .unwrap();
        driver.finish().unwrap();

        assert_eq!(
            engine.to_json(),
            json!({
                "consumer": {"name": "consumer"},
                "provider": {"name": "provider"},
                "interactions": [{
                    "description": "a request for events",
                    "providerStates": [
                        {"name": "events exist"},
                        {"name": "an event", "params": {"id": "42", "type": "Created"}}
                    ],
                    "request": {
                        "method": "GET",
                        "path": "/events",
                        "query": {"type": ["Created"]},
                        "headers": {"Accept": "application/json"}
                    },
                    "response": {
                        "status": 200,
                        "headers": {"Content-Type": "application/json"},
                        "body": [{"id": 42}]
                    }
                }],
                "metadata": {"pactSpecification": {"version": "3.0.0"}}
            })
        );
    }

    #[test]
    fn test_rule_values_are_stored_as_rules() {
        let mut engine = engine();
        let mut driver = engine.new_interaction("matchers").unwrap();
        let rule = Matcher::regex("/events/1", r"^/events/\d+$").unwrap();

        driver
            .with_request("GET", &rule.to_document().unwrap())
            .unwrap();

        let contract = engine.contract();
        assert_eq!(contract.interactions[0].request.path, Some(Term::Rule(rule)));
    }

    #[test]
    fn test_second_request_overwrites() {
        let mut engine = engine();
        let mut driver = engine.new_interaction("overwrite").unwrap();
        driver.with_request("GET", "/a").unwrap();
        driver.with_request("DELETE", "/b").unwrap();

        let request = &engine.contract().interactions[0].request;
        assert_eq!(request.method.as_deref(), Some("DELETE"));
        assert_eq!(request.path, Some(Term::from("/b")));
    }

    #[test]
    fn test_rejects_unknown_method_and_status() {
        let mut engine = engine();
        let mut driver = engine.new_interaction("bad").unwrap();

        let err = driver.with_request("FETCH", "/").unwrap_err();
        assert_eq!(err.message(), "'FETCH' is not a standard HTTP method");

        let err = driver.with_response_status(42).unwrap_err();
        assert_eq!(err.message(), "status 42 is not a valid HTTP status");
    }

    #[test]
    fn test_rejects_calls_after_finish() {
        let mut engine = engine();
        let mut driver = engine.new_interaction("done").unwrap();
        driver.with_request("GET", "/").unwrap();
        driver.finish().unwrap();

        let err = driver.with_response_status(200).unwrap_err();
        assert_eq!(err.message(), "interaction 'done' has already been finalized");
    }

    #[test]
    fn test_finish_requires_request() {
        let mut engine = engine();
        let mut driver = engine.new_interaction("incomplete").unwrap();
        assert!(driver.finish().is_err());
        assert_eq!(engine.interaction_count(), 0);
    }

    #[test]
    fn test_file_upload_requires_existing_file() {
        let mut engine = engine();
        let mut driver = engine.new_interaction("upload").unwrap();
        let err = driver
            .with_file_upload("image/jpeg", Path::new("/nonexistent/file.jpeg"), "file")
            .unwrap_err();
        assert_eq!(err.message(), "file /nonexistent/file.jpeg does not exist");
    }

    #[test]
    fn test_empty_description_rejected() {
        assert!(engine().new_interaction("  ").is_err());
    }

    #[test]
    fn test_v4_marks_interaction_type() {
        let mut engine = MemoryEngine::new("c", "p", PactSpecification::V4);
        let mut driver = engine.new_interaction("v4").unwrap();
        driver.with_request("GET", "/").unwrap();
        driver.finish().unwrap();

        let doc = engine.to_json();
        assert_eq!(doc["interactions"][0]["type"], json!("Synchronous/HTTP"));
        assert_eq!(doc["metadata"]["pactSpecification"]["version"], json!("4.0"));
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut engine = engine();
        for description in ["first", "second", "third"] {
            let mut driver = engine.new_interaction(description).unwrap();
            driver.with_request("GET", "/").unwrap();
            driver.finish().unwrap();
        }

        let descriptions: Vec<String> = engine
            .contract()
            .finished()
            .map(|i| i.description.clone())
            .collect();
        assert_eq!(descriptions, vec!["first", "second", "third"]);
    }
}
