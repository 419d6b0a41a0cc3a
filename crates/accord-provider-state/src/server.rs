//! Standalone HTTP host for the provider state middleware.

use crate::config::ProviderStateConfig;
use crate::middleware::ProviderStateLayer;
use crate::registry::ProviderStateRegistry;
use crate::response::{BoxError, StateBody, StateResponseBuilder};
use bytes::Bytes;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::task::{Context, Poll};
use tokio::net::TcpListener;
use tower::{Layer, Service, ServiceExt};
use tracing::{debug, error, info};

/// Serves provider state calls in front of an application service.
pub struct ProviderStateServer {
    addr: SocketAddr,
    layer: ProviderStateLayer,
}

impl ProviderStateServer {
    /// Also installs the tracing subscriber from `config.log_level` unless
    /// the process already has one.
    pub fn new(config: &ProviderStateConfig, registry: ProviderStateRegistry) -> Self {
        if !config.init_logging() {
            debug!("Tracing subscriber already installed, ignoring 'log_level'");
        }
        Self {
            addr: config.listen,
            layer: ProviderStateLayer::from_config(config, registry),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bind the configured address and answer every non-state request
    /// with 404.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener, NotFound).await
    }

    /// Accept connections on `listener`, passing non-state requests to
    /// `inner`. Runs until accepting fails.
    pub async fn serve<S, ResBody>(self, listener: TcpListener, inner: S) -> Result<(), anyhow::Error>
    where
        S: Service<Request<Incoming>, Response = Response<ResBody>> + Clone + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
        ResBody: hyper::body::Body<Data = Bytes> + Send + 'static,
        ResBody::Error: Into<BoxError>,
    {
        let local = listener.local_addr()?;
        info!(
            route = self.layer.route(),
            states = self.layer.registry().len(),
            "Provider state server listening on http://{}",
            local
        );

        let service = self.layer.layer(inner);
        loop {
            let (stream, peer) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let service = service.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let service = service.clone();
                    async move { Ok::<_, Infallible>(respond(service, req).await) }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!(%peer, "Provider state connection error: {}", e);
                }
            });
        }
    }
}

async fn respond<S>(service: S, req: Request<Incoming>) -> Response<StateBody>
where
    S: Service<Request<Incoming>, Response = Response<StateBody>, Error = BoxError>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    match service.oneshot(req).await {
        Ok(response) => response,
        Err(e) => {
            error!(%method, %path, error = %e, "Provider state request failed");
            StateResponseBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
                .body(e.to_string())
                .build()
        }
    }
}

/// Fallback for hosts with no application behind the middleware.
#[derive(Clone, Copy, Debug, Default)]
pub struct NotFound;

impl<B> Service<Request<B>> for NotFound {
    type Response = Response<StateBody>;
    type Error = Infallible;
    type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: Request<B>) -> Self::Future {
        std::future::ready(Ok(StateResponseBuilder::new(StatusCode::NOT_FOUND).build()))
    }
}
