//! Serializer options for JSON bodies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_JSON_CONTENT_TYPE: &str = "application/json";

const MATCHER_TYPE_KEY: &str = "pact:matcher:type";

/// Object key policy applied after serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCase {
    /// Keys as produced by the value's `Serialize` impl.
    #[default]
    Preserve,
    /// `FooBar` -> `fooBar`, `URLValue` -> `urlValue`.
    CamelCase,
    /// `FooBar` -> `foo_bar`.
    SnakeCase,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct JsonOptions {
    #[serde(default)]
    pub key_case: KeyCase,
    /// Drop object entries whose value is `null`.
    #[serde(default)]
    pub skip_nulls: bool,
    #[serde(default)]
    pub pretty: bool,
}

impl JsonOptions {
    pub fn camel_case() -> Self {
        Self {
            key_case: KeyCase::CamelCase,
            ..Default::default()
        }
    }

    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, serde_json::Error> {
        if self.key_case == KeyCase::Preserve && !self.skip_nulls {
            return self.render(value);
        }
        let value = self.transform(serde_json::to_value(value)?);
        self.render(&value)
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }

    fn transform(&self, value: Value) -> Value {
        match value {
            Value::Object(map) => {
                // A rule fragment keeps its example even when it is null.
                let keep_nulls = !self.skip_nulls || map.contains_key(MATCHER_TYPE_KEY);
                let map: Map<String, Value> = map
                    .into_iter()
                    .filter(|(_, v)| keep_nulls || !v.is_null())
                    .map(|(k, v)| (self.rename(k), self.transform(v)))
                    .collect();
                Value::Object(map)
            }
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.transform(v)).collect())
            }
            other => other,
        }
    }

    fn rename(&self, key: String) -> String {
        // Matcher fragment keys are part of the wire format.
        if key.starts_with("pact:") {
            return key;
        }
        match self.key_case {
            KeyCase::Preserve => key,
            KeyCase::CamelCase => to_camel_case(&key),
            KeyCase::SnakeCase => to_snake_case(&key),
        }
    }
}

fn to_camel_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len());

    for (i, c) in chars.iter().enumerate() {
        if !c.is_uppercase() {
            out.extend(chars[i..].iter());
            break;
        }
        // Stop before the uppercase letter that starts the next word.
        let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
        if i > 0 && next_is_lower {
            out.extend(chars[i..].iter());
            break;
        }
        out.extend(c.to_lowercase());
    }
    out
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;

    for c in key.chars() {
        if c.is_uppercase() {
            if prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::Matcher;
    use serde_json::json;

    #[test]
    fn test_default_preserves_keys() {
        let options = JsonOptions::default();
        assert_eq!(options.serialize(&json!({"Foo": 42})).unwrap(), r#"{"Foo":42}"#);
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(to_camel_case("Foo"), "foo");
        assert_eq!(to_camel_case("FooBar"), "fooBar");
        assert_eq!(to_camel_case("URLValue"), "urlValue");
        assert_eq!(to_camel_case("ID"), "id");
        assert_eq!(to_camel_case("alreadyCamel"), "alreadyCamel");
        assert_eq!(to_camel_case(""), "");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("FooBar"), "foo_bar");
        assert_eq!(to_snake_case("fooBar2Baz"), "foo_bar2_baz");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_nested_keys_and_nulls() {
        let options = JsonOptions {
            key_case: KeyCase::CamelCase,
            skip_nulls: true,
            pretty: false,
        };
        let body = json!({"EventId": 1, "Detail": {"EventType": "Created", "Note": null}, "Items": [{"ItemName": "x"}]});
        let rendered: Value = serde_json::from_str(&options.serialize(&body).unwrap()).unwrap();
        assert_eq!(
            rendered,
            json!({"eventId": 1, "detail": {"eventType": "Created"}, "items": [{"itemName": "x"}]})
        );
    }

    #[test]
    fn test_skip_nulls_keeps_rule_examples() {
        let options = JsonOptions {
            skip_nulls: true,
            ..Default::default()
        };
        let body = json!({"Note": null, "Deleted": Matcher::type_of(Value::Null)});
        assert_eq!(
            options.serialize(&body).unwrap(),
            r#"{"Deleted":{"pact:matcher:type":"type","value":null}}"#
        );
    }

    #[test]
    fn test_matcher_keys_untouched() {
        let options = JsonOptions {
            key_case: KeyCase::SnakeCase,
            ..Default::default()
        };
        let body = json!({"EventId": Matcher::integer(1)});
        assert_eq!(
            options.serialize(&body).unwrap(),
            r#"{"event_id":{"pact:matcher:type":"integer","value":1}}"#
        );
    }

    #[test]
    fn test_pretty() {
        let options = JsonOptions {
            pretty: true,
            ..Default::default()
        };
        assert_eq!(options.serialize(&json!({"a": 1})).unwrap(), "{\n  \"a\": 1\n}");
    }
}
