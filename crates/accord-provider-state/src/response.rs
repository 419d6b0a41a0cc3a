use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body type of every response leaving the middleware.
pub type StateBody = UnsyncBoxBody<Bytes, BoxError>;

pub(crate) const WRONG_METHOD: &str = "The provider state invocation needs to be a POST method. \
     Check on your verifier side that the provider state URL is configured correctly.";

pub(crate) fn not_registered(name: &str) -> String {
    format!(
        "The provider state '{name}' cannot be invoked because it is not registered \
         in the provider test."
    )
}

pub(crate) fn handler_failed(name: &str, error: &anyhow::Error) -> String {
    format!("The provider state '{name}' failed: {error:#}")
}

/// Plain-text responses written by the middleware itself.
pub struct StateResponseBuilder {
    status: StatusCode,
    body: Option<String>,
}

impl StateResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        StateResponseBuilder { status, body: None }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> Response<StateBody> {
        let has_body = self.body.is_some();
        let payload = self.body.map(Bytes::from).unwrap_or_default();
        let mut response = Response::new(boxed(Full::new(payload)));
        *response.status_mut() = self.status;
        if has_body {
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
        }
        response
    }
}

/// Erase any body into [`StateBody`].
pub fn boxed<B>(body: B) -> StateBody
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    body.map_err(Into::into).boxed_unsync()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn text(response: Response<StateBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_ok() {
        let response = StateResponseBuilder::new(StatusCode::OK).build();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(text(response).await, "");
    }

    #[tokio::test]
    async fn test_body_is_plain_text() {
        let response = StateResponseBuilder::new(StatusCode::NOT_FOUND)
            .body(not_registered("an event exists"))
            .build();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("text/plain; charset=utf-8"))
        );
        assert!(text(response).await.contains("not registered"));
    }

    #[test]
    fn test_handler_failure_includes_cause_chain() {
        let error = anyhow::anyhow!("connection refused").context("seeding events");
        assert_eq!(
            handler_failed("events exist", &error),
            "The provider state 'events exist' failed: seeding events: connection refused"
        );
    }
}
