//! Matching rule variants and their document fragment.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generator type attached to values resolved from provider state parameters.
const PROVIDER_STATE_GENERATOR: &str = "ProviderState";

/// Upper bound on the items generated for a minimum-length example.
const MAX_EXAMPLE_ITEMS: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Regex matcher requires a non-empty pattern")]
    EmptyPattern,

    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Example '{example}' does not match regex '{pattern}'")]
    ExampleMismatch { example: String, pattern: String },

    #[error("Invalid array bounds: min {min} is greater than max {max}")]
    InvalidBounds { min: usize, max: usize },

    #[error("Max array length must be at least 1")]
    ZeroMax,

    #[error("Example {0} is not a finite number")]
    NotANumber(Value),

    #[error("Provider state expression must not be empty")]
    EmptyExpression,

    #[error("Array-contains matcher requires at least one variant")]
    NoVariants,

    #[error("Invalid matcher document: {0}")]
    Document(String),
}

/// Discriminator emitted as `pact:matcher:type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatcherKind {
    Regex,
    Type,
    Equality,
    Include,
    Integer,
    Decimal,
    Number,
    Boolean,
    Null,
    ArrayContains,
}

impl MatcherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherKind::Regex => "regex",
            MatcherKind::Type => "type",
            MatcherKind::Equality => "equality",
            MatcherKind::Include => "include",
            MatcherKind::Integer => "integer",
            MatcherKind::Decimal => "decimal",
            MatcherKind::Number => "number",
            MatcherKind::Boolean => "boolean",
            MatcherKind::Null => "null",
            MatcherKind::ArrayContains => "array-contains",
        }
    }
}

/// A rule-governed value.
///
/// Every rule carries exactly one example, returned by [`Matcher::example`],
/// which stands in for the real value wherever no engine interprets the rule.
/// Constructors validate eagerly: a bad rule fails at the call site, not
/// during verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatcherDocument", into = "MatcherDocument")]
pub enum Matcher {
    Regex { example: String, pattern: String },
    Type { example: Value },
    MinType { example: Value, min: usize },
    MaxType { example: Value, max: usize },
    MinMaxType { example: Value, min: usize, max: usize },
    Equality { value: Value },
    Include { value: String },
    Integer { example: i64 },
    Decimal { example: f64 },
    Number { example: Value },
    Boolean { example: bool },
    Null,
    ArrayContains { variants: Vec<Value> },
    FromProviderState { expression: String, example: Value },
}

impl Matcher {
    /// Match a string against `pattern`. The example must itself match.
    pub fn regex(
        example: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Result<Self, MatcherError> {
        let example = example.into();
        let pattern = pattern.into();

        if pattern.is_empty() {
            return Err(MatcherError::EmptyPattern);
        }
        let compiled = Regex::new(&pattern).map_err(|source| MatcherError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        if !compiled.is_match(&example) {
            return Err(MatcherError::ExampleMismatch { example, pattern });
        }

        Ok(Matcher::Regex { example, pattern })
    }

    /// Match any value of the same type as `example`.
    pub fn type_of(example: impl Into<Value>) -> Self {
        Matcher::Type {
            example: example.into(),
        }
    }

    /// An array of at least `min` elements, each shaped like `example`.
    pub fn min_type(example: impl Into<Value>, min: usize) -> Self {
        Matcher::MinType {
            example: example.into(),
            min,
        }
    }

    /// An array of at most `max` elements, each shaped like `example`.
    pub fn max_type(example: impl Into<Value>, max: usize) -> Result<Self, MatcherError> {
        if max == 0 {
            return Err(MatcherError::ZeroMax);
        }
        Ok(Matcher::MaxType {
            example: example.into(),
            max,
        })
    }

    /// An array of `min..=max` elements, each shaped like `example`.
    pub fn min_max_type(
        example: impl Into<Value>,
        min: usize,
        max: usize,
    ) -> Result<Self, MatcherError> {
        if max == 0 {
            return Err(MatcherError::ZeroMax);
        }
        if min > max {
            return Err(MatcherError::InvalidBounds { min, max });
        }
        Ok(Matcher::MinMaxType {
            example: example.into(),
            min,
            max,
        })
    }

    pub fn equality(value: impl Into<Value>) -> Self {
        Matcher::Equality {
            value: value.into(),
        }
    }

    /// Match any string containing `value`.
    pub fn include(value: impl Into<String>) -> Self {
        Matcher::Include {
            value: value.into(),
        }
    }

    pub fn integer(example: i64) -> Self {
        Matcher::Integer { example }
    }

    pub fn decimal(example: f64) -> Result<Self, MatcherError> {
        if !example.is_finite() {
            return Err(MatcherError::NotANumber(Value::from(example)));
        }
        Ok(Matcher::Decimal { example })
    }

    pub fn number(example: impl Into<Value>) -> Result<Self, MatcherError> {
        let example = example.into();
        if !example.is_number() {
            return Err(MatcherError::NotANumber(example));
        }
        Ok(Matcher::Number { example })
    }

    pub fn boolean(example: bool) -> Self {
        Matcher::Boolean { example }
    }

    pub fn null() -> Self {
        Matcher::Null
    }

    /// An array containing at least one element matching each variant.
    pub fn array_contains(variants: Vec<Value>) -> Result<Self, MatcherError> {
        if variants.is_empty() {
            return Err(MatcherError::NoVariants);
        }
        Ok(Matcher::ArrayContains { variants })
    }

    /// A value the verifier substitutes from provider state parameters,
    /// e.g. `"/events/${id}"`.
    pub fn from_provider_state(
        expression: impl Into<String>,
        example: impl Into<Value>,
    ) -> Result<Self, MatcherError> {
        let expression = expression.into();
        if expression.trim().is_empty() {
            return Err(MatcherError::EmptyExpression);
        }
        Ok(Matcher::FromProviderState {
            expression,
            example: example.into(),
        })
    }

    pub fn kind(&self) -> MatcherKind {
        match self {
            Matcher::Regex { .. } => MatcherKind::Regex,
            Matcher::Type { .. }
            | Matcher::MinType { .. }
            | Matcher::MaxType { .. }
            | Matcher::MinMaxType { .. }
            | Matcher::FromProviderState { .. } => MatcherKind::Type,
            Matcher::Equality { .. } => MatcherKind::Equality,
            Matcher::Include { .. } => MatcherKind::Include,
            Matcher::Integer { .. } => MatcherKind::Integer,
            Matcher::Decimal { .. } => MatcherKind::Decimal,
            Matcher::Number { .. } => MatcherKind::Number,
            Matcher::Boolean { .. } => MatcherKind::Boolean,
            Matcher::Null => MatcherKind::Null,
            Matcher::ArrayContains { .. } => MatcherKind::ArrayContains,
        }
    }

    /// The literal stand-in for this rule.
    pub fn example(&self) -> Value {
        match self {
            Matcher::Regex { example, .. } => Value::String(example.clone()),
            Matcher::Type { example } | Matcher::FromProviderState { example, .. } => {
                example.clone()
            }
            Matcher::MinType { example, min } | Matcher::MinMaxType { example, min, .. } => {
                Value::Array(vec![example.clone(); (*min).clamp(1, MAX_EXAMPLE_ITEMS)])
            }
            Matcher::MaxType { example, .. } => Value::Array(vec![example.clone()]),
            Matcher::Equality { value } => value.clone(),
            Matcher::Include { value } => Value::String(value.clone()),
            Matcher::Integer { example } => Value::from(*example),
            Matcher::Decimal { example } => Value::from(*example),
            Matcher::Number { example } => example.clone(),
            Matcher::Boolean { example } => Value::Bool(*example),
            Matcher::Null => Value::Null,
            Matcher::ArrayContains { variants } => Value::Array(variants.clone()),
        }
    }

    /// Compact JSON fragment, as forwarded to the driver.
    pub fn to_document(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a fragment previously produced by [`Matcher::to_document`].
    pub fn from_document(document: &str) -> Result<Self, MatcherError> {
        serde_json::from_str(document).map_err(|e| MatcherError::Document(e.to_string()))
    }

    /// Cheap check used to tell rule fragments from literal JSON text.
    pub fn looks_like_document(raw: &str) -> bool {
        let trimmed = raw.trim_start();
        trimmed.starts_with('{') && trimmed.contains("\"pact:matcher:type\"")
    }
}

/// Wire form of a rule. Field order is the emitted key order.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MatcherDocument {
    #[serde(rename = "pact:matcher:type")]
    kind: MatcherKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variants: Option<Vec<Value>>,
    #[serde(
        rename = "pact:generator:type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    generator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
}

impl MatcherDocument {
    fn new(kind: MatcherKind, value: Option<Value>) -> Self {
        MatcherDocument {
            kind,
            value,
            regex: None,
            min: None,
            max: None,
            variants: None,
            generator: None,
            expression: None,
        }
    }
}

impl From<Matcher> for MatcherDocument {
    fn from(matcher: Matcher) -> Self {
        let kind = matcher.kind();
        match matcher {
            Matcher::Regex { example, pattern } => MatcherDocument {
                regex: Some(pattern),
                ..MatcherDocument::new(kind, Some(Value::String(example)))
            },
            Matcher::Type { example } => MatcherDocument::new(kind, Some(example)),
            Matcher::MinType { example, min } => MatcherDocument {
                min: Some(min),
                ..MatcherDocument::new(kind, Some(Value::Array(vec![example])))
            },
            Matcher::MaxType { example, max } => MatcherDocument {
                max: Some(max),
                ..MatcherDocument::new(kind, Some(Value::Array(vec![example])))
            },
            Matcher::MinMaxType { example, min, max } => MatcherDocument {
                min: Some(min),
                max: Some(max),
                ..MatcherDocument::new(kind, Some(Value::Array(vec![example])))
            },
            Matcher::Equality { value } => MatcherDocument::new(kind, Some(value)),
            Matcher::Include { value } => MatcherDocument::new(kind, Some(Value::String(value))),
            Matcher::Integer { example } => MatcherDocument::new(kind, Some(Value::from(example))),
            Matcher::Decimal { example } => MatcherDocument::new(kind, Some(Value::from(example))),
            Matcher::Number { example } => MatcherDocument::new(kind, Some(example)),
            Matcher::Boolean { example } => MatcherDocument::new(kind, Some(Value::Bool(example))),
            Matcher::Null => MatcherDocument::new(kind, None),
            Matcher::ArrayContains { variants } => MatcherDocument {
                variants: Some(variants),
                ..MatcherDocument::new(kind, None)
            },
            Matcher::FromProviderState {
                expression,
                example,
            } => MatcherDocument {
                generator: Some(PROVIDER_STATE_GENERATOR.to_string()),
                expression: Some(expression),
                ..MatcherDocument::new(kind, Some(example))
            },
        }
    }
}

impl TryFrom<MatcherDocument> for Matcher {
    type Error = MatcherError;

    fn try_from(doc: MatcherDocument) -> Result<Self, Self::Error> {
        let kind = doc.kind;
        let missing = |field: &str| {
            MatcherError::Document(format!(
                "'{}' matcher is missing '{}'",
                kind.as_str(),
                field
            ))
        };

        match kind {
            MatcherKind::Regex => {
                let pattern = doc.regex.ok_or_else(|| missing("regex"))?;
                let example = match doc.value {
                    Some(Value::String(s)) => s,
                    _ => return Err(missing("string value")),
                };
                Matcher::regex(example, pattern)
            }
            MatcherKind::Type => {
                let value = doc.value.unwrap_or(Value::Null);
                if doc.generator.as_deref() == Some(PROVIDER_STATE_GENERATOR) {
                    let expression = doc.expression.ok_or_else(|| missing("expression"))?;
                    return Matcher::from_provider_state(expression, value);
                }
                if doc.min.is_none() && doc.max.is_none() {
                    return Ok(Matcher::type_of(value));
                }
                let example = match value {
                    Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
                    _ => return Err(missing("non-empty array value")),
                };
                match (doc.min, doc.max) {
                    (Some(min), Some(max)) => Matcher::min_max_type(example, min, max),
                    (None, Some(max)) => Matcher::max_type(example, max),
                    (min, None) => Ok(Matcher::min_type(example, min.unwrap_or(0))),
                }
            }
            MatcherKind::Equality => Ok(Matcher::equality(doc.value.unwrap_or(Value::Null))),
            MatcherKind::Include => match doc.value {
                Some(Value::String(s)) => Ok(Matcher::include(s)),
                _ => Err(missing("string value")),
            },
            MatcherKind::Integer => doc
                .value
                .as_ref()
                .and_then(Value::as_i64)
                .map(Matcher::integer)
                .ok_or_else(|| missing("integer value")),
            MatcherKind::Decimal => {
                let example = doc
                    .value
                    .as_ref()
                    .and_then(Value::as_f64)
                    .ok_or_else(|| missing("decimal value"))?;
                Matcher::decimal(example)
            }
            MatcherKind::Number => Matcher::number(doc.value.ok_or_else(|| missing("value"))?),
            MatcherKind::Boolean => doc
                .value
                .as_ref()
                .and_then(Value::as_bool)
                .map(Matcher::boolean)
                .ok_or_else(|| missing("boolean value")),
            MatcherKind::Null => Ok(Matcher::null()),
            MatcherKind::ArrayContains => {
                Matcher::array_contains(doc.variants.ok_or_else(|| missing("variants"))?)
            }
        }
    }
}
