//! Pact-compatible matching rules.
//!
//! A field in an interaction is either a literal or a rule describing the
//! variation the provider may return (type-only, regex, array bounds, ...).
//! Rules serialize to the integration fragment understood by the Pact
//! engine:
//!
//! ```json
//! {"pact:matcher:type": "regex", "value": "2024-01-01", "regex": "^\\d{4}-\\d{2}-\\d{2}$"}
//! ```
//!
//! # Module Structure
//!
//! - `rule` - [`Matcher`] variants, validation and the document fragment
//! - `term` - [`Term`], the literal-or-rule value accepted by the builders

mod rule;
mod term;

pub use rule::{Matcher, MatcherError, MatcherKind};
pub use term::Term;
