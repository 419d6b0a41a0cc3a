use super::rule::Matcher;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A literal value or a matching rule.
///
/// Builders accept `impl Into<Term>` wherever either is valid, so passing
/// `"application/json"` and `Matcher::regex(..)?` reads the same at the
/// call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Term {
    Literal(String),
    Rule(Matcher),
}

impl Term {
    /// Value forwarded to the driver: the literal verbatim, or the rule's
    /// compact document fragment.
    pub fn to_driver_value(&self) -> Result<String, serde_json::Error> {
        match self {
            Term::Literal(value) => Ok(value.clone()),
            Term::Rule(matcher) => matcher.to_document(),
        }
    }

    /// Inverse of [`Term::to_driver_value`]. Anything that is not a valid
    /// rule fragment is kept as a literal.
    pub fn parse(raw: &str) -> Term {
        if Matcher::looks_like_document(raw) {
            if let Ok(matcher) = Matcher::from_document(raw) {
                return Term::Rule(matcher);
            }
        }
        Term::Literal(raw.to_string())
    }

    pub fn example(&self) -> Value {
        match self {
            Term::Literal(value) => Value::String(value.clone()),
            Term::Rule(matcher) => matcher.example(),
        }
    }

    pub fn is_rule(&self) -> bool {
        matches!(self, Term::Rule(_))
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term::Literal(value.to_string())
    }
}

impl From<String> for Term {
    fn from(value: String) -> Self {
        Term::Literal(value)
    }
}

impl From<&String> for Term {
    fn from(value: &String) -> Self {
        Term::Literal(value.clone())
    }
}

impl From<Matcher> for Term {
    fn from(matcher: Matcher) -> Self {
        Term::Rule(matcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literal_forwarded_verbatim() {
        let term = Term::from("value");
        assert_eq!(term.to_driver_value().unwrap(), "value");
        assert!(!term.is_rule());
    }

    #[test]
    fn test_rule_forwarded_as_document() {
        let term = Term::from(Matcher::regex("queryParameter", "^queryParameter$").unwrap());
        assert_eq!(
            term.to_driver_value().unwrap(),
            r#"{"pact:matcher:type":"regex","value":"queryParameter","regex":"^queryParameter$"}"#
        );
    }

    #[test]
    fn test_parse_recovers_rule() {
        let rule = Matcher::type_of("abc");
        let raw = Term::from(rule.clone()).to_driver_value().unwrap();
        assert_eq!(Term::parse(&raw), Term::Rule(rule));
    }

    #[test]
    fn test_parse_keeps_plain_json_as_literal() {
        assert_eq!(
            Term::parse(r#"{"a":1}"#),
            Term::Literal(r#"{"a":1}"#.to_string())
        );
    }

    #[test]
    fn test_serializes_untagged() {
        let terms = vec![Term::from("x"), Term::from(Matcher::integer(3))];
        assert_eq!(
            serde_json::to_value(&terms).unwrap(),
            json!(["x", {"pact:matcher:type": "integer", "value": 3}])
        );
    }

    #[test]
    fn test_example() {
        assert_eq!(Term::from("x").example(), json!("x"));
        assert_eq!(Term::from(Matcher::boolean(false)).example(), json!(false));
    }
}
