//! Fluent interaction builders.
//!
//! Authoring an interaction is a two-phase state machine: the request is
//! described first, then the expected response. The phases are separate
//! types so out-of-order use does not compile:
//!
//! - [`RequestBuilder<D, Unconfigured>`] - provider states, headers, query, body
//! - [`RequestBuilder<D, Configured>`] - method and path known; `will_respond`
//!   becomes available
//! - [`ResponseBuilder<D>`] - status, headers, body; `build` finalizes
//!
//! Every call is forwarded to the [`InteractionDriver`](crate::InteractionDriver)
//! as it happens.

mod json;
mod request;
mod response;


pub use json::{JsonOptions, KeyCase, DEFAULT_JSON_CONTENT_TYPE};
pub use request::RequestBuilder;
pub use response::ResponseBuilder;

use std::collections::HashMap;

/// Request phase before `with_request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

/// Request phase after `with_request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Configured;

/// Next occurrence index per name, for repeated headers and query keys.
#[derive(Debug, Clone, Default)]
pub(crate) struct RepeatedKeys {
    next: HashMap<String, usize>,
}

impl RepeatedKeys {
    /// Return the index for this occurrence of `name` and advance.
    pub(crate) fn next_index(&mut self, name: &str) -> usize {
        let slot = self.next.entry(name.to_string()).or_insert(0);
        let index = *slot;
        *slot += 1;
        index
    }
}

#[cfg(test)]
mod repeated_keys_tests {
    use super::RepeatedKeys;

    #[test]
    fn test_independent_counters() {
        let mut keys = RepeatedKeys::default();
        assert_eq!(keys.next_index("name"), 0);
        assert_eq!(keys.next_index("name"), 1);
        assert_eq!(keys.next_index("other"), 0);
        assert_eq!(keys.next_index("name"), 2);
    }
}
