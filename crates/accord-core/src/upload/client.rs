use super::{MultipartUpload, UploadError};
use bytes::Bytes;
use futures::{stream, StreamExt, TryStreamExt};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

/// Request body type for uploads: framing chunks around a streamed file.
pub type UploadBody = UnsyncBoxBody<Bytes, io::Error>;

/// Posts files as `multipart/form-data` to an HTTP endpoint.
///
/// The file is streamed from disk; its handle is owned by the request body
/// and closed when the body finishes or the request is dropped.
#[derive(Clone)]
pub struct FileUploadClient {
    client: Client<HttpConnector, UploadBody>,
    base_uri: String,
    bearer_token: Option<String>,
    timeout: Option<Duration>,
    expected_status: StatusCode,
}

impl FileUploadClient {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            base_uri: base_uri.into().trim_end_matches('/').to_string(),
            bearer_token: None,
            timeout: None,
            expected_status: StatusCode::CREATED,
        }
    }

    /// Send `Authorization: Bearer <token>` with every upload.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Bound the whole exchange, including reading the response body.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Status treated as success. Defaults to `201 Created`.
    pub fn with_expected_status(mut self, status: StatusCode) -> Self {
        self.expected_status = status;
        self
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Upload `file` to `path` (relative to the base URI) as the single
    /// part `part_name`. Returns the response body on the expected status.
    pub async fn upload(
        &self,
        path: &str,
        file: impl AsRef<Path>,
        content_type: &str,
        part_name: &str,
    ) -> Result<Bytes, UploadError> {
        let file = file.as_ref();
        let multipart = MultipartUpload::for_path(file, content_type, part_name)?;
        let uri: Uri = format!("{}{}", self.base_uri, path).parse()?;

        let exchange = self.send(uri.clone(), file, multipart);
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, exchange).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(%uri, timeout_ms = limit.as_millis() as u64, "File upload timed out");
                    Err(UploadError::Timeout(limit))
                }
            },
            None => exchange.await,
        }
    }

    async fn send(
        &self,
        uri: Uri,
        file: &Path,
        multipart: MultipartUpload,
    ) -> Result<Bytes, UploadError> {
        let io_error = |source| UploadError::Io {
            path: file.to_path_buf(),
            source,
        };
        let handle = tokio::fs::File::open(file).await.map_err(io_error)?;
        let length = handle.metadata().await.map_err(io_error)?.len();

        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri.clone())
            .header(CONTENT_TYPE, multipart.content_type_header())
            .header(CONTENT_LENGTH, length + multipart.overhead());
        if let Some(token) = &self.bearer_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let chunks = stream::once(futures::future::ready(Ok(multipart.preamble())))
            .chain(ReaderStream::new(handle))
            .chain(stream::once(futures::future::ready(Ok(multipart.epilogue()))))
            .map_ok(Frame::data);
        let request = request.body(StreamBody::new(chunks).boxed_unsync())?;

        info!(%uri, file_name = multipart.file_name(), bytes = length, "Uploading file");
        let response = self.client.request(request).await?;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();
        debug!(%uri, status = status.as_u16(), "Upload response received");

        if status != self.expected_status {
            return Err(UploadError::RequestFailure {
                method: Method::POST,
                uri,
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body)
    }
}
