use super::json::{JsonOptions, DEFAULT_JSON_CONTENT_TYPE};
use super::response::ResponseBuilder;
use super::{Configured, RepeatedKeys, Unconfigured};
use crate::driver::InteractionDriver;
use crate::error::PactError;
use crate::matchers::Term;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::Path;
use tracing::debug;

/// Which kind of body a request has been given so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Content,
    FileUpload,
}

impl BodyKind {
    fn describe(&self) -> &'static str {
        match self {
            BodyKind::Content => "a body",
            BodyKind::FileUpload => "a file upload",
        }
    }
}

/// Request side of one interaction.
///
/// `S` tracks whether method and path have been set. Headers, query
/// parameters and the body may be added in either phase; provider states
/// only before the request line is set.
pub struct RequestBuilder<D, S = Unconfigured> {
    driver: D,
    json: JsonOptions,
    query: RepeatedKeys,
    headers: RepeatedKeys,
    body: Option<BodyKind>,
    state: PhantomData<S>,
}

impl<D: InteractionDriver> RequestBuilder<D, Unconfigured> {
    /// `json` is the default for every `with_json_body` call without
    /// explicit options.
    pub fn new(driver: D, json: JsonOptions) -> Self {
        Self {
            driver,
            json,
            query: RepeatedKeys::default(),
            headers: RepeatedKeys::default(),
            body: None,
            state: PhantomData,
        }
    }

    /// Add a provider state the provider must establish first.
    pub fn given(mut self, state: &str) -> Result<Self, PactError> {
        debug!(state, "Adding provider state");
        self.driver.given(state)?;
        Ok(self)
    }

    /// Add a provider state with parameters. One driver call is made per
    /// parameter; an empty parameter set behaves like [`given`](Self::given).
    pub fn given_with_params<I, K, V>(mut self, state: &str, params: I) -> Result<Self, PactError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut forwarded = 0usize;
        for (key, value) in params {
            self.driver
                .given_with_param(state, key.as_ref(), value.as_ref())?;
            forwarded += 1;
        }
        if forwarded == 0 {
            return self.given(state);
        }
        debug!(state, params = forwarded, "Added provider state with params");
        Ok(self)
    }
}

impl<D: InteractionDriver, S> RequestBuilder<D, S> {
    /// Set the request line. Calling again replaces method and path.
    pub fn with_request(
        mut self,
        method: impl AsRef<str>,
        path: impl Into<Term>,
    ) -> Result<RequestBuilder<D, Configured>, PactError> {
        let method = method.as_ref();
        let path = path.into().to_driver_value()?;
        debug!(method, path = %path, "Setting request");
        self.driver.with_request(method, &path)?;
        Ok(self.into_state())
    }

    /// Add a query parameter. Repeating a name adds another occurrence.
    pub fn with_query(mut self, name: &str, value: impl Into<Term>) -> Result<Self, PactError> {
        let value = value.into().to_driver_value()?;
        let index = self.query.next_index(name);
        debug!(name, index, "Adding query parameter");
        self.driver.with_query_parameter(name, &value, index)?;
        Ok(self)
    }

    /// Add a header. Repeating a name adds another occurrence.
    pub fn with_header(mut self, name: &str, value: impl Into<Term>) -> Result<Self, PactError> {
        let value = value.into().to_driver_value()?;
        let index = self.headers.next_index(name);
        debug!(name, index, "Adding request header");
        self.driver.with_request_header(name, &value, index)?;
        Ok(self)
    }

    /// JSON body using the builder's default options and `application/json`.
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

    /// Raw body, forwarded verbatim.
    pub fn with_body(mut self, body: &str, content_type: &str) -> Result<Self, PactError> {
        self.claim_body(BodyKind::Content)?;
        debug!(content_type, bytes = body.len(), "Setting request body");
        self.driver.with_request_body(content_type, body)?;
        Ok(self)
    }

    /// Upload `path` as a single multipart part named `part_name`.
    ///
    /// Only the file's metadata is checked here; its content is streamed
    /// by the engine when the request is sent.
    pub fn with_file_upload(
        mut self,
        content_type: &str,
        path: impl AsRef<Path>,
        part_name: &str,
    ) -> Result<Self, PactError> {
        let path = path.as_ref();
        let io_error = |source| PactError::FileUpload {
            path: path.to_path_buf(),
            source,
        };

        let absolute = std::path::absolute(path).map_err(io_error)?;
        let metadata = std::fs::metadata(&absolute).map_err(io_error)?;
        if !metadata.is_file() {
            return Err(io_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }

        self.claim_body(BodyKind::FileUpload)?;
        debug!(content_type, part_name, path = %absolute.display(), "Adding file upload");
        self.driver
            .with_file_upload(content_type, &absolute, part_name)?;
        Ok(self)
    }

    fn claim_body(&mut self, kind: BodyKind) -> Result<(), PactError> {
        match self.body {
            Some(existing) if existing != kind => Err(PactError::InvalidOperation(format!(
                "request already has {}; it cannot also have {}",
                existing.describe(),
                kind.describe()
            ))),
            _ => {
                self.body = Some(kind);
                Ok(())
            }
        }
    }

    fn into_state<T>(self) -> RequestBuilder<D, T> {
        RequestBuilder {
            driver: self.driver,
            json: self.json,
            query: self.query,
            headers: self.headers,
            body: self.body,
            state: PhantomData,
        }
    }
}

impl<D: InteractionDriver> RequestBuilder<D, Configured> {
    /// Move on to the expected response.
    ///
    /// Only available once the request line is set:
    ///
    /// ```compile_fail
    /// use accord_core::{MemoryEngine, Pact, PactSpecification};
    ///
    /// let mut pact = Pact::new(MemoryEngine::new("c", "p", PactSpecification::V3));
    /// let _response = pact.upon_receiving("no request yet").unwrap().will_respond();
    /// ```
    pub fn will_respond(self) -> ResponseBuilder<D> {
        ResponseBuilder::new(self.driver, self.json)
    }
}
