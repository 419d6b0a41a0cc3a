use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Parameters attached to a provider state invocation.
pub type StateParams = HashMap<String, String>;

/// Body the verifier POSTs to the state route before replaying an
/// interaction: `{"name": "...", "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderStateInteraction {
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_params"
    )]
    pub params: Option<StateParams>,
}

impl ProviderStateInteraction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Parameters, or an empty map when none were sent.
    pub fn into_params(self) -> StateParams {
        self.params.unwrap_or_default()
    }
}

/// Verifiers send params as arbitrary JSON scalars; handlers see them as text.
fn deserialize_params<'de, D>(deserializer: D) -> Result<Option<StateParams>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<HashMap<String, Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                Value::Bool(flag) => flag.to_string(),
                Value::Number(number) => number.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(de::Error::custom(format!(
                        "provider state param '{key}' must be a string, number, boolean or null"
                    )))
                }
            };
            Ok((key, text))
        })
        .collect::<Result<StateParams, _>>()
        .map(Some)
}
