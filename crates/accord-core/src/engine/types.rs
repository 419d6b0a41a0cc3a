//! Type definitions for recorded interactions.

use crate::config::PactSpecification;
use crate::matchers::Term;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Repeated Keys
// ============================================================================

/// Values keyed by name with a per-name occurrence index.
///
/// Names keep their first-insertion order. Writing an existing
/// `(name, index)` overwrites; an index may only extend the list by one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepeatedValues {
    entries: Vec<(String, Vec<Term>)>,
}

impl RepeatedValues {
    pub fn set(&mut self, name: &str, index: usize, value: Term) -> Result<(), String> {
        let position = self.entries.iter().position(|(key, _)| key == name);
        let values = match position {
            Some(position) => &mut self.entries[position].1,
            None if index == 0 => {
                self.entries.push((name.to_string(), vec![value]));
                return Ok(());
            }
            None => {
                return Err(format!(
                    "index {index} for '{name}' skips slot 0 (no previous value)"
                ))
            }
        };

        match index.cmp(&values.len()) {
            std::cmp::Ordering::Less => values[index] = value,
            std::cmp::Ordering::Equal => values.push(value),
            std::cmp::Ordering::Greater => {
                return Err(format!(
                    "index {index} for '{name}' skips slot {}",
                    values.len()
                ))
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[Term]> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Term])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Query style: every name maps to an array.
    fn to_json_arrays(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(name, values)| (name.to_string(), json!(values)))
            .collect();
        Value::Object(map)
    }

    /// Header style: a single value is rendered bare.
    fn to_json_collapsed(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(name, values)| {
                let rendered = match values {
                    [single] => json!(single),
                    many => json!(many),
                };
                (name.to_string(), rendered)
            })
            .collect();
        Value::Object(map)
    }
}

// ============================================================================
// Request / Response
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Content {
        content_type: String,
        content: String,
    },
    FileUpload {
        content_type: String,
        path: PathBuf,
        part_name: String,
    },
}

impl Body {
    fn is_json(content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        essence == "application/json" || essence.ends_with("+json")
    }

    /// Validate text against its declared content type.
    pub(crate) fn content(content_type: &str, content: &str) -> Result<Body, String> {
        if Body::is_json(content_type) {
            serde_json::from_str::<Value>(content)
                .map_err(|e| format!("body declared as {content_type} is not valid JSON: {e}"))?;
        }
        Ok(Body::Content {
            content_type: content_type.to_string(),
            content: content.to_string(),
        })
    }

    fn render_into(&self, target: &mut Map<String, Value>) {
        match self {
            Body::Content {
                content_type,
                content,
            } => {
                let rendered = if Body::is_json(content_type) {
                    serde_json::from_str(content).unwrap_or_else(|_| json!(content))
                } else {
                    json!(content)
                };
                target.insert("body".to_string(), rendered);
            }
            Body::FileUpload {
                content_type,
                path,
                part_name,
            } => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                target.insert(
                    "multipart".to_string(),
                    json!({
                        "partName": part_name,
                        "fileName": file_name,
                        "contentType": content_type,
                    }),
                );
            }
        }
    }
}

/// Request side of an interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDefinition {
    pub method: Option<String>,
    pub path: Option<Term>,
    pub query: RepeatedValues,
    pub headers: RepeatedValues,
    pub body: Option<Body>,
}

impl RequestDefinition {
    /// Method and path are both known.
    pub fn is_complete(&self) -> bool {
        self.method.is_some() && self.path.is_some()
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("method".to_string(), json!(self.method));
        map.insert("path".to_string(), json!(self.path));
        if !self.query.is_empty() {
            map.insert("query".to_string(), self.query.to_json_arrays());
        }
        if !self.headers.is_empty() {
            map.insert("headers".to_string(), self.headers.to_json_collapsed());
        }
        if let Some(body) = &self.body {
            body.render_into(&mut map);
        }
        Value::Object(map)
    }
}

/// Response side of an interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseDefinition {
    pub status: Option<u16>,
    pub headers: RepeatedValues,
    pub body: Option<Body>,
}

impl ResponseDefinition {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("status".to_string(), json!(self.status.unwrap_or(200)));
        if !self.headers.is_empty() {
            map.insert("headers".to_string(), self.headers.to_json_collapsed());
        }
        if let Some(body) = &self.body {
            body.render_into(&mut map);
        }
        Value::Object(map)
    }
}

// ============================================================================
// Interaction / Contract
// ============================================================================

/// Named precondition with its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderState {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

impl ProviderState {
    fn to_json(&self) -> Value {
        if self.params.is_empty() {
            json!({ "name": self.name })
        } else {
            json!({ "name": self.name, "params": self.params })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub description: String,
    pub provider_states: Vec<ProviderState>,
    pub request: RequestDefinition,
    pub response: ResponseDefinition,
    pub finished: bool,
}

impl Interaction {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            provider_states: Vec::new(),
            request: RequestDefinition::default(),
            response: ResponseDefinition::default(),
            finished: false,
        }
    }

    fn to_json(&self, specification: PactSpecification) -> Value {
        let mut map = Map::new();
        if specification == PactSpecification::V4 {
            map.insert("type".to_string(), json!("Synchronous/HTTP"));
        }
        map.insert("description".to_string(), json!(self.description));
        if !self.provider_states.is_empty() {
            let states: Vec<Value> = self.provider_states.iter().map(ProviderState::to_json).collect();
            map.insert("providerStates".to_string(), Value::Array(states));
        }
        map.insert("request".to_string(), self.request.to_json());
        map.insert("response".to_string(), self.response.to_json());
        Value::Object(map)
    }
}

/// Interactions agreed between one consumer and one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub consumer: String,
    pub provider: String,
    pub specification: PactSpecification,
    pub interactions: Vec<Interaction>,
}

impl Contract {
    pub fn new(
        consumer: impl Into<String>,
        provider: impl Into<String>,
        specification: PactSpecification,
    ) -> Self {
        Self {
            consumer: consumer.into(),
            provider: provider.into(),
            specification,
            interactions: Vec::new(),
        }
    }

    /// Finalized interactions in registration order.
    pub fn finished(&self) -> impl Iterator<Item = &Interaction> {
        self.interactions.iter().filter(|i| i.finished)
    }

    /// Render the contract document. Only finalized interactions are emitted.
    pub fn to_json(&self) -> Value {
        let interactions: Vec<Value> = self
            .finished()
            .map(|i| i.to_json(self.specification))
            .collect();
        json!({
            "consumer": { "name": self.consumer },
            "provider": { "name": self.provider },
            "interactions": interactions,
            "metadata": {
                "pactSpecification": { "version": self.specification.version() }
            }
        })
    }
}
