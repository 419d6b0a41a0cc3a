//! Boundary to the matching engine.
//!
//! The builders never inspect engine state. They issue the calls below and
//! check the result; a failure carries the engine's diagnostic text and is
//! fatal to the interaction being authored.

use std::fmt;
use std::path::Path;

/// Failure reported by the engine for a single driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFailure {
    message: String,
}

impl EngineFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EngineFailure {}

pub type DriverResult = Result<(), EngineFailure>;

/// Operations on the one interaction currently under construction.
///
/// Repeated-key operations are keyed by `(name, index)`: calling twice with
/// the same key overwrites, it never appends. Implementations are not
/// required to be thread-safe; calls against one session must be serialized.
pub trait InteractionDriver {
    fn given(&mut self, state: &str) -> DriverResult;

    fn given_with_param(&mut self, state: &str, key: &str, value: &str) -> DriverResult;

    fn with_request(&mut self, method: &str, path: &str) -> DriverResult;

    fn with_query_parameter(&mut self, name: &str, value: &str, index: usize) -> DriverResult;

    fn with_request_header(&mut self, name: &str, value: &str, index: usize) -> DriverResult;

    fn with_request_body(&mut self, content_type: &str, body: &str) -> DriverResult;

    /// `path` is absolute. The engine reads the file when it encodes the
    /// multipart body.
    fn with_file_upload(&mut self, content_type: &str, path: &Path, part_name: &str)
        -> DriverResult;

    fn with_response_status(&mut self, status: u16) -> DriverResult;

    fn with_response_header(&mut self, name: &str, value: &str, index: usize) -> DriverResult;

    fn with_response_body(&mut self, content_type: &str, body: &str) -> DriverResult;

    /// Hand the completed interaction to the engine.
    fn finish(&mut self) -> DriverResult {
        Ok(())
    }
}

/// A contract session able to start new interactions.
pub trait PactEngine {
    type Interaction: InteractionDriver;

    fn new_interaction(&mut self, description: &str) -> Result<Self::Interaction, EngineFailure>;
}

impl<D: InteractionDriver + ?Sized> InteractionDriver for &mut D {
    fn given(&mut self, state: &str) -> DriverResult {
        (**self).given(state)
    }

    fn given_with_param(&mut self, state: &str, key: &str, value: &str) -> DriverResult {
        (**self).given_with_param(state, key, value)
    }

    fn with_request(&mut self, method: &str, path: &str) -> DriverResult {
        (**self).with_request(method, path)
    }

    fn with_query_parameter(&mut self, name: &str, value: &str, index: usize) -> DriverResult {
        (**self).with_query_parameter(name, value, index)
    }

    fn with_request_header(&mut self, name: &str, value: &str, index: usize) -> DriverResult {
        (**self).with_request_header(name, value, index)
    }

    fn with_request_body(&mut self, content_type: &str, body: &str) -> DriverResult {
        (**self).with_request_body(content_type, body)
    }

    fn with_file_upload(
        &mut self,
        content_type: &str,
        path: &Path,
        part_name: &str,
    ) -> DriverResult {
        (**self).with_file_upload(content_type, path, part_name)
    }

    fn with_response_status(&mut self, status: u16) -> DriverResult {
        (**self).with_response_status(status)
    }

    fn with_response_header(&mut self, name: &str, value: &str, index: usize) -> DriverResult {
        (**self).with_response_header(name, value, index)
    }

    fn with_response_body(&mut self, content_type: &str, body: &str) -> DriverResult {
        (**self).with_response_body(content_type, body)
    }

    fn finish(&mut self) -> DriverResult {
        (**self).finish()
    }
}

impl<D: InteractionDriver + ?Sized> InteractionDriver for Box<D> {
    fn given(&mut self, state: &str) -> DriverResult {
        (**self).given(state)
    }

    fn given_with_param(&mut self, state: &str, key: &str, value: &str) -> DriverResult {
        (**self).given_with_param(state, key, value)
    }

    fn with_request(&mut self, method: &str, path: &str) -> DriverResult {
        (**self).with_request(method, path)
    }

    fn with_query_parameter(&mut self, name: &str, value: &str, index: usize) -> DriverResult {
        (**self).with_query_parameter(name, value, index)
    }

    fn with_request_header(&mut self, name: &str, value: &str, index: usize) -> DriverResult {
        (**self).with_request_header(name, value, index)
    }

    fn with_request_body(&mut self, content_type: &str, body: &str) -> DriverResult {
        (**self).with_request_body(content_type, body)
    }

    fn with_file_upload(
        &mut self,
        content_type: &str,
        path: &Path,
        part_name: &str,
    ) -> DriverResult {
        (**self).with_file_upload(content_type, path, part_name)
    }

    fn with_response_status(&mut self, status: u16) -> DriverResult {
        (**self).with_response_status(status)
    }

    fn with_response_header(&mut self, name: &str, value: &str, index: usize) -> DriverResult {
        (**self).with_response_header(name, value, index)
    }

    fn with_response_body(&mut self, content_type: &str, body: &str) -> DriverResult {
        (**self).with_response_body(content_type, body)
    }

    fn finish(&mut self) -> DriverResult {
        (**self).finish()
    }
}
