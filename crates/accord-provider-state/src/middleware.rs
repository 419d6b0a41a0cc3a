//! Provider state dispatch as a tower middleware.
//!
//! Requests under the state route are answered here; everything else goes
//! to the wrapped service untouched.

use crate::config::{ProviderStateConfig, DEFAULT_MAX_BODY_BYTES, DEFAULT_ROUTE};
use crate::error::ProviderStateError;
use crate::interaction::ProviderStateInteraction;
use crate::registry::ProviderStateRegistry;
use crate::response::{
    boxed, handler_failed, not_registered, BoxError, StateBody, StateResponseBuilder,
    WRONG_METHOD,
};
use futures::future::BoxFuture;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, error, info, warn};

/// Wraps a service with provider state dispatch.
#[derive(Clone, Debug)]
pub struct ProviderStateLayer {
    registry: Arc<ProviderStateRegistry>,
    route: Arc<str>,
    max_body_bytes: usize,
}

impl ProviderStateLayer {
    pub fn new(registry: ProviderStateRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            route: Arc::from(DEFAULT_ROUTE),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn from_config(config: &ProviderStateConfig, registry: ProviderStateRegistry) -> Self {
        Self::new(registry)
            .with_route(&config.route)
            .with_max_body_bytes(config.max_body_bytes)
    }

    /// Path prefix that identifies state invocations.
    pub fn with_route(mut self, route: &str) -> Self {
        self.route = Arc::from(route);
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn registry(&self) -> &ProviderStateRegistry {
        &self.registry
    }

    fn matches(&self, path: &str) -> bool {
        path.starts_with(&*self.route)
    }

    async fn dispatch<B>(&self, req: Request<B>) -> Result<Response<StateBody>, ProviderStateError>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        if req.method() != Method::POST {
            warn!(method = %req.method(), path = req.uri().path(), "Provider state call is not a POST");
            return Ok(StateResponseBuilder::new(StatusCode::BAD_REQUEST)
                .body(WRONG_METHOD)
                .build());
        }

        let limit = self.max_body_bytes;
        let body = Limited::new(req.into_body(), limit)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    ProviderStateError::BodyTooLarge { limit }
                } else {
                    ProviderStateError::Body(e.to_string())
                }
            })?
            .to_bytes();
        let interaction: ProviderStateInteraction = serde_json::from_slice(&body)?;

        let Some(handler) = self.registry.get(&interaction.name) else {
            warn!(state = %interaction.name, "Provider state is not registered");
            return Ok(StateResponseBuilder::new(StatusCode::NOT_FOUND)
                .body(not_registered(&interaction.name))
                .build());
        };

        let name = interaction.name.clone();
        let params = interaction.into_params();
        info!(state = %name, params = params.len(), "Executing provider state");
        if let Err(e) = handler.execute(&params).await {
            error!(state = %name, error = %format!("{e:#}"), "Provider state handler failed");
            return Ok(StateResponseBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
                .body(handler_failed(&name, &e))
                .build());
        }
        debug!(state = %name, "Provider state established");

        Ok(StateResponseBuilder::new(StatusCode::OK).build())
    }
}

impl<S> Layer<S> for ProviderStateLayer {
    type Service = ProviderStateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ProviderStateService {
            inner,
            layer: self.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProviderStateService<S> {
    inner: S,
    layer: ProviderStateLayer,
}

impl<S> ProviderStateService<S> {
    pub fn new(inner: S, layer: ProviderStateLayer) -> Self {
        Self { inner, layer }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S, B, ResBody> Service<Request<B>> for ProviderStateService<S>
where
    S: Service<Request<B>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
    ResBody: Body<Data = bytes::Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<StateBody>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        if !self.layer.matches(req.uri().path()) {
            let next = self.inner.call(req);
            return Box::pin(async move {
                let response = next.await.map_err(Into::into)?;
                Ok(response.map(boxed))
            });
        }

        let layer = self.layer.clone();
        Box::pin(async move { layer.dispatch(req).await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::StateParams;
    use bytes::Bytes;
    use http_body_util::Full;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Downstream application: counts calls and answers "from inner".
    #[derive(Clone)]
    struct Inner {
        calls: Arc<AtomicUsize>,
    }

    impl Service<Request<Full<Bytes>>> for Inner {
        type Response = Response<Full<Bytes>>;
        type Error = Infallible;
        type Future = futures::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<Full<Bytes>>) -> Self::Future {
            self.calls.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Ok(Response::new(Full::new(Bytes::from("from inner")))))
        }
    }

    struct Harness {
        state_calls: Arc<AtomicUsize>,
        inner_calls: Arc<AtomicUsize>,
        last_params: Arc<parking_lot::Mutex<Option<StateParams>>>,
        service: ProviderStateService<Inner>,
    }

    fn harness() -> Harness {
        let state_calls = Arc::new(AtomicUsize::new(0));
        let inner_calls = Arc::new(AtomicUsize::new(0));

        let last_params = Arc::new(parking_lot::Mutex::new(None));

        let counter = Arc::clone(&state_calls);
        let params_sink = Arc::clone(&last_params);
        let registry = ProviderStateRegistry::builder()
            .state("an event exists", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .state_with_params("an event with id exists", move |params| {
                *params_sink.lock() = Some(params.clone());
            })
            .async_state("storage is down", |_| async {
                Err::<(), _>(anyhow::anyhow!("connection refused"))
            })
            .build()
            .unwrap();

        let inner = Inner {
            calls: Arc::clone(&inner_calls),
        };
        let service = ProviderStateLayer::new(registry).layer(inner);
        Harness {
            state_calls,
            inner_calls,
            last_params,
            service,
        }
    }

    fn request(method: Method, path: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn text(response: Response<StateBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_registered_state_executes_once() {
        let h = harness();
        let response = h
            .service
            .clone()
            .oneshot(request(
                Method::POST,
                "/provider-states",
                r#"{"name":"an event exists"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "");
        assert_eq!(h.state_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.inner_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_numeric_params_reach_handler_as_text() {
        let h = harness();
        let response = h
            .service
            .clone()
            .oneshot(request(
                Method::POST,
                "/provider-states",
                r#"{"name":"an event with id exists","params":{"id":42}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let params = h.last_params.lock().clone().unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
    }

    #[tokio::test]
    async fn test_other_paths_pass_through() {
        let h = harness();
        let response = h
            .service
            .clone()
            .oneshot(request(Method::GET, "/events", ""))
            .await
            .unwrap();

        assert_eq!(text(response).await, "from inner");
        assert_eq!(h.inner_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.state_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_post_is_bad_request() {
        let h = harness();
        let response = h
            .service
            .clone()
            .oneshot(request(
                Method::GET,
                "/provider-states",
                r#"{"name":"an event exists"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(text(response).await.contains("needs to be a POST method"));
        assert_eq!(h.state_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.inner_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_state_is_not_found() {
        let h = harness();
        let response = h
            .service
            .clone()
            .oneshot(request(
                Method::POST,
                "/provider-states",
                r#"{"name":"nobody registered this"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(text(response).await.contains("not registered"));
        assert_eq!(h.state_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_error_is_server_error() {
        let h = harness();
        let response = h
            .service
            .clone()
            .oneshot(request(
                Method::POST,
                "/provider-states",
                r#"{"name":"storage is down","params":{"region":"eu"}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(text(response).await.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_deserialize_error() {
        let h = harness();
        let err = h
            .service
            .clone()
            .oneshot(request(Method::POST, "/provider-states", "{not json"))
            .await
            .unwrap_err();

        let err = err.downcast::<ProviderStateError>().unwrap();
        assert!(matches!(*err, ProviderStateError::Deserialize(_)));
        assert_eq!(h.state_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let h = harness();
        let service = ProviderStateService::new(
            h.service.get_ref().clone(),
            ProviderStateLayer::new(ProviderStateRegistry::default()).with_max_body_bytes(8),
        );
        let err = service
            .oneshot(request(
                Method::POST,
                "/provider-states",
                r#"{"name":"an event exists"}"#,
            ))
            .await
            .unwrap_err();

        let err = err.downcast::<ProviderStateError>().unwrap();
        assert!(matches!(*err, ProviderStateError::BodyTooLarge { limit: 8 }));
    }

    #[tokio::test]
    async fn test_custom_route() {
        let h = harness();
        let registry = ProviderStateRegistry::builder()
            .state("ready", || {})
            .build()
            .unwrap();
        let service = ProviderStateLayer::new(registry)
            .with_route("/_pact/state")
            .layer(h.service.get_ref().clone());

        let response = service
            .clone()
            .oneshot(request(Method::POST, "/_pact/state", r#"{"name":"ready"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = service
            .oneshot(request(Method::POST, "/provider-states", r#"{"name":"ready"}"#))
            .await
            .unwrap();
        assert_eq!(text(response).await, "from inner");
    }
}
