use super::UploadError;
use bytes::Bytes;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::Path;

const BOUNDARY_LEN: usize = 32;

/// Framing for a `multipart/form-data` body carrying a single file part.
///
/// Only the bytes around the file are produced here; the file content is
/// streamed between [`preamble`](Self::preamble) and
/// [`epilogue`](Self::epilogue) by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartUpload {
    boundary: String,
    part_name: String,
    file_name: String,
    content_type: String,
}

impl MultipartUpload {
    pub fn new(
        part_name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        let boundary = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(BOUNDARY_LEN)
            .map(char::from)
            .collect();
        Self {
            boundary,
            part_name: part_name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
        }
    }

    /// Framing for uploading `path`, using its final component as file name.
    pub fn for_path(
        path: &Path,
        content_type: impl Into<String>,
        part_name: impl Into<String>,
    ) -> Result<Self, UploadError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| UploadError::InvalidFileName(path.to_path_buf()))?;
        Ok(Self::new(part_name, file_name, content_type))
    }

    /// Replace the random boundary.
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type_header(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Part disposition with both the plain and the RFC 5987 extended
    /// file name, so non-ASCII names survive.
    pub fn content_disposition(&self) -> String {
        format!(
            "form-data; name=\"{}\"; filename=\"{}\"; filename*=utf-8''{}",
            quote(&self.part_name),
            quote(&self.file_name),
            urlencoding::encode(&self.file_name)
        )
    }

    /// Opening boundary and part headers.
    pub fn preamble(&self) -> Bytes {
        Bytes::from(format!(
            "--{}\r\nContent-Disposition: {}\r\nContent-Type: {}\r\n\r\n",
            self.boundary,
            self.content_disposition(),
            self.content_type
        ))
    }

    /// Closing boundary.
    pub fn epilogue(&self) -> Bytes {
        Bytes::from(format!("\r\n--{}--\r\n", self.boundary))
    }

    /// Framing overhead in bytes, excluding the file content.
    pub fn overhead(&self) -> u64 {
        (self.preamble().len() + self.epilogue().len()) as u64
    }
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_is_random_alphanumeric() {
        let a = MultipartUpload::new("file", "a.jpeg", "image/jpeg");
        let b = MultipartUpload::new("file", "a.jpeg", "image/jpeg");

        assert_eq!(a.boundary().len(), 32);
        assert!(a.boundary().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a.boundary(), b.boundary());
    }

    #[test]
    fn test_content_type_header() {
        let upload = MultipartUpload::new("file", "a.jpeg", "image/jpeg").with_boundary("xyz");
        assert_eq!(
            upload.content_type_header(),
            "multipart/form-data; boundary=xyz"
        );
    }

    #[test]
    fn test_content_disposition_ascii() {
        let upload = MultipartUpload::new("file", "test_file.jpeg", "image/jpeg");
        assert_eq!(
            upload.content_disposition(),
            "form-data; name=\"file\"; filename=\"test_file.jpeg\"; filename*=utf-8''test_file.jpeg"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let upload = MultipartUpload::new("file", "café menu.jpeg", "image/jpeg");
        assert_eq!(
            upload.content_disposition(),
            "form-data; name=\"file\"; filename=\"café menu.jpeg\"; filename*=utf-8''caf%C3%A9%20menu.jpeg"
        );
    }

    #[test]
    fn test_content_disposition_escapes_quotes() {
        let upload = MultipartUpload::new("file", "say \"hi\".txt", "text/plain");
        assert!(upload
            .content_disposition()
            .contains("filename=\"say \\\"hi\\\".txt\""));
    }

    #[test]
    fn test_framing() {
        let upload = MultipartUpload::new("file", "a.txt", "text/plain").with_boundary("B");

        assert_eq!(
            upload.preamble(),
            Bytes::from(
                "--B\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"; \
                 filename*=utf-8''a.txt\r\nContent-Type: text/plain\r\n\r\n"
            )
        );
        assert_eq!(upload.epilogue(), Bytes::from("\r\n--B--\r\n"));
        assert_eq!(
            upload.overhead(),
            (upload.preamble().len() + upload.epilogue().len()) as u64
        );
    }

    #[test]
    fn test_for_path_uses_file_name() {
        let upload =
            MultipartUpload::for_path(Path::new("/tmp/uploads/photo.jpeg"), "image/jpeg", "file")
                .unwrap();
        assert_eq!(upload.file_name(), "photo.jpeg");
    }

    #[test]
    fn test_for_path_without_file_name() {
        let err = MultipartUpload::for_path(Path::new("/"), "image/jpeg", "file").unwrap_err();
        assert!(matches!(err, UploadError::InvalidFileName(_)));
    }
}
