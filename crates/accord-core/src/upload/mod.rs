//! Streaming `multipart/form-data` file uploads.
//!
//! [`MultipartUpload`] produces the framing around one file part and
//! [`FileUploadClient`] streams a file from disk inside that framing.

mod client;
mod multipart;

pub use client::{FileUploadClient, UploadBody};
pub use multipart::MultipartUpload;

use hyper::{Method, StatusCode, Uri};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(
        "The request for {method} {uri} failed. Response Status: {}, Response Body: {body}",
        .status.as_u16()
    )]
    RequestFailure {
        method: Method,
        uri: Uri,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to read upload file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload file path has no usable file name: {}", .0.display())]
    InvalidFileName(PathBuf),

    #[error("Invalid upload URI: {0}")]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),

    #[error("Failed to build upload request: {0}")]
    Http(#[from] hyper::http::Error),

    #[error("Upload request failed: {0}")]
    Client(#[from] hyper_util::client::legacy::Error),

    #[error("Failed to read upload response: {0}")]
    Response(#[from] hyper::Error),

    #[error("Upload did not complete within {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failure_message() {
        let err = UploadError::RequestFailure {
            method: Method::POST,
            uri: "http://localhost:9000/events/upload-file".parse().unwrap(),
            status: StatusCode::BAD_REQUEST,
            body: "File content-type must be image/jpeg".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "The request for POST http://localhost:9000/events/upload-file failed. \
             Response Status: 400, Response Body: File content-type must be image/jpeg"
        );
    }
}
