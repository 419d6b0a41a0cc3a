use super::json::{JsonOptions, DEFAULT_JSON_CONTENT_TYPE};
use super::RepeatedKeys;
use crate::driver::InteractionDriver;
use crate::error::PactError;
use crate::matchers::Term;
use hyper::StatusCode;
use serde::Serialize;
use tracing::debug;

/// Expected response of one interaction. Obtained from
/// [`RequestBuilder::will_respond`](super::RequestBuilder::will_respond).
pub struct ResponseBuilder<D> {
    driver: D,
    json: JsonOptions,
    headers: RepeatedKeys,
}

impl<D: InteractionDriver> ResponseBuilder<D> {
    pub(crate) fn new(driver: D, json: JsonOptions) -> Self {
        Self {
            driver,
            json,
            headers: RepeatedKeys::default(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Result<Self, PactError> {
        debug!(status, "Setting response status");
        self.driver.with_response_status(status)?;
        Ok(self)
    }

    pub fn with_status_code(self, status: StatusCode) -> Result<Self, PactError> {
        self.with_status(status.as_u16())
    }

    /// Add a header. Repeating a name adds another occurrence.
    pub fn with_header(mut self, name: &str, value: impl Into<Term>) -> Result<Self, PactError> {
        let value = value.into().to_driver_value()?;
        let index = self.headers.next_index(name);
        debug!(name, index, "Adding response header");
        self.driver.with_response_header(name, &value, index)?;
        Ok(self)
    }

    pub fn with_json_body<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, PactError> {
        let options = self.json.clone();
        self.with_json_body_options_as(body, &options, DEFAULT_JSON_CONTENT_TYPE)
    }

    pub fn with_json_body_options<T: Serialize + ?Sized>(
        self,
        body: &T,
        options: &JsonOptions,
    ) -> Result<Self, PactError> {
        self.with_json_body_options_as(body, options, DEFAULT_JSON_CONTENT_TYPE)
    }

    pub fn with_json_body_as<T: Serialize + ?Sized>(
        self,
        body: &T,
        content_type: &str,
    ) -> Result<Self, PactError> {
        let options = self.json.clone();
        self.with_json_body_options_as(body, &options, content_type)
    }

    pub fn with_json_body_options_as<T: Serialize + ?Sized>(
        self,
        body: &T,
        options: &JsonOptions,
        content_type: &str,
    ) -> Result<Self, PactError> {
        let serialized = options.serialize(body)?;
        self.with_body(&serialized, content_type)
    }

    pub fn with_body(mut self, body: &str, content_type: &str) -> Result<Self, PactError> {
        debug!(content_type, bytes = body.len(), "Setting response body");
        self.driver.with_response_body(content_type, body)?;
        Ok(self)
    }

    /// Hand the completed interaction to the engine. Consumes the builder.
    pub fn build(mut self) -> Result<(), PactError> {
        self.driver.finish()?;
        Ok(())
    }
}
