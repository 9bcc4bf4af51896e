//! Outbound request bodies.
//!
//! # Design
//! `Body` is what the caller hands in; `BodyDescriptor` is the normalized,
//! length-aware form the normalizer derives headers from. Everything except a
//! stream is turned into bytes up front. Streams report a length only when it
//! was given or can be read from file metadata, and file metadata is only
//! queried during `finalize`.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeekExt};

use crate::error::NormalizeError;
use crate::multipart::FormData;

pub type BoxReader = Pin<Box<dyn AsyncRead + Send>>;

/// A request body as supplied by the caller.
#[derive(Debug, Default)]
pub enum Body {
    #[default]
    Absent,
    /// A string or buffer, sent as-is.
    Inline(Bytes),
    /// Serialized with `serde_json`; defaults `content-type` to `application/json`.
    Json(serde_json::Value),
    /// URL-encoded pairs; defaults `content-type` to `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    Multipart(FormData),
    Stream(BodyStream),
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Inline(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Inline(Bytes::from(s))
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::Inline(Bytes::from(v))
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::Inline(b)
    }
}

impl From<FormData> for Body {
    fn from(form: FormData) -> Self {
        Body::Multipart(form)
    }
}

impl From<BodyStream> for Body {
    fn from(stream: BodyStream) -> Self {
        Body::Stream(stream)
    }
}

enum Source {
    Reader { reader: BoxReader, length: Option<u64> },
    File(File),
    Path(PathBuf),
}

/// A streamed body.
pub struct BodyStream {
    source: Source,
}

impl BodyStream {
    /// Any reader; `length` is trusted when given.
    pub fn from_reader<R>(reader: R, length: Option<u64>) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self {
            source: Source::Reader {
                reader: Box::pin(reader),
                length,
            },
        }
    }

    /// An open file; its remaining size is probed at finalize.
    pub fn from_file(file: File) -> Self {
        Self {
            source: Source::File(file),
        }
    }

    /// A file opened and sized at finalize.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Path(path.into()),
        }
    }

    /// Length known without any I/O.
    pub fn known_length(&self) -> Option<u64> {
        match &self.source {
            Source::Reader { length, .. } => *length,
            Source::File(_) | Source::Path(_) => None,
        }
    }

    pub fn needs_probe(&self) -> bool {
        !matches!(self.source, Source::Reader { .. })
    }

    /// Open the source if needed and measure what is left to read.
    ///
    /// Fails outright only when the source cannot be opened; a failed size
    /// query still hands back the reader.
    pub(crate) async fn probe(self) -> io::Result<Probed> {
        let mut file = match self.source {
            Source::Reader { reader, length } => {
                return Ok(Probed {
                    length: Ok(length),
                    reader,
                });
            }
            Source::File(file) => file,
            Source::Path(path) => File::open(&path).await?,
        };
        let length = remaining_len(&mut file).await.map(Some);
        Ok(Probed {
            length,
            reader: Box::pin(file),
        })
    }

    pub(crate) fn into_reader(self) -> Option<BoxReader> {
        match self.source {
            Source::Reader { reader, .. } => Some(reader),
            Source::File(file) => Some(Box::pin(file)),
            Source::Path(_) => None,
        }
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Reader { length, .. } => f.debug_struct("BodyStream").field("length", length).finish(),
            Source::File(_) => f.write_str("BodyStream(File)"),
            Source::Path(p) => f.debug_tuple("BodyStream").field(p).finish(),
        }
    }
}

pub(crate) struct Probed {
    pub length: io::Result<Option<u64>>,
    pub reader: BoxReader,
}

async fn remaining_len(file: &mut File) -> io::Result<u64> {
    let total = file.metadata().await?.len();
    let pos = file.stream_position().await?;
    Ok(total.saturating_sub(pos))
}

/// The normalized body.
#[derive(Debug)]
pub enum BodyDescriptor {
    Absent,
    InlineBytes {
        bytes: Bytes,
        content_type: Option<&'static str>,
    },
    Stream(BodyStream),
    Multipart(FormData),
}

impl BodyDescriptor {
    pub fn from_body(body: Body) -> Result<Self, NormalizeError> {
        Ok(match body {
            Body::Absent => BodyDescriptor::Absent,
            Body::Inline(bytes) => BodyDescriptor::InlineBytes {
                bytes,
                content_type: None,
            },
            Body::Json(value) => {
                let bytes = serde_json::to_vec(&value).map_err(|e| NormalizeError::InvalidOptions(e.to_string()))?;
                BodyDescriptor::InlineBytes {
                    bytes: Bytes::from(bytes),
                    content_type: Some("application/json"),
                }
            }
            Body::Form(pairs) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .finish();
                BodyDescriptor::InlineBytes {
                    bytes: Bytes::from(encoded),
                    content_type: Some("application/x-www-form-urlencoded"),
                }
            }
            Body::Multipart(form) => BodyDescriptor::Multipart(form),
            Body::Stream(stream) => BodyDescriptor::Stream(stream),
        })
    }

    /// Byte length when it is known without I/O.
    pub fn known_length(&self) -> Option<u64> {
        match self {
            BodyDescriptor::Absent => None,
            BodyDescriptor::InlineBytes { bytes, .. } => Some(bytes.len() as u64),
            BodyDescriptor::Stream(stream) => stream.known_length(),
            BodyDescriptor::Multipart(form) => Some(form.encoded_len()),
        }
    }

    pub fn default_content_type(&self) -> Option<String> {
        match self {
            BodyDescriptor::InlineBytes { content_type, .. } => content_type.map(str::to_string),
            BodyDescriptor::Multipart(form) => Some(form.content_type()),
            BodyDescriptor::Absent | BodyDescriptor::Stream(_) => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, BodyDescriptor::Absent)
    }

    pub fn needs_probe(&self) -> bool {
        matches!(self, BodyDescriptor::Stream(s) if s.needs_probe())
    }
}

/// The payload handed to the transport.
pub enum FinalBody {
    Empty,
    Bytes(Bytes),
    Stream(BoxReader),
}

impl FinalBody {
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            FinalBody::Bytes(b) => Some(b),
            FinalBody::Empty | FinalBody::Stream(_) => None,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, FinalBody::Stream(_))
    }
}

impl fmt::Debug for FinalBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalBody::Empty => f.write_str("Empty"),
            FinalBody::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            FinalBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_are_measured_in_bytes() {
        let body = BodyDescriptor::from_body("ünïcødé ✓".into()).unwrap();
        assert_eq!(body.known_length(), Some("ünïcødé ✓".len() as u64));
        assert_ne!(body.known_length(), Some("ünïcødé ✓".chars().count() as u64));
        assert_eq!(body.default_content_type(), None);
    }

    #[test]
    fn json_body_is_serialized() {
        let body = BodyDescriptor::from_body(Body::Json(json!({"a": 1}))).unwrap();
        match &body {
            BodyDescriptor::InlineBytes { bytes, .. } => assert_eq!(&bytes[..], br#"{"a":1}"#),
            other => panic!("expected inline bytes, got {other:?}"),
        }
        assert_eq!(body.default_content_type().as_deref(), Some("application/json"));
    }

    #[test]
    fn form_body_is_url_encoded() {
        let body = BodyDescriptor::from_body(Body::Form(vec![
            ("q".to_string(), "a b&c".to_string()),
            ("n".to_string(), "1".to_string()),
        ]))
        .unwrap();
        match &body {
            BodyDescriptor::InlineBytes { bytes, .. } => assert_eq!(&bytes[..], b"q=a+b%26c&n=1"),
            other => panic!("expected inline bytes, got {other:?}"),
        }
        assert_eq!(
            body.default_content_type().as_deref(),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn multipart_reports_length_and_boundary() {
        let form = FormData::with_boundary("xyz").text("a", "b");
        let expected = form.encoded_len();
        let body = BodyDescriptor::from_body(form.into()).unwrap();
        assert_eq!(body.known_length(), Some(expected));
        assert_eq!(
            body.default_content_type().as_deref(),
            Some("multipart/form-data; boundary=xyz")
        );
    }

    #[test]
    fn reader_streams_use_declared_length() {
        let known = BodyDescriptor::from_body(BodyStream::from_reader(&b"hello"[..], Some(5)).into()).unwrap();
        assert_eq!(known.known_length(), Some(5));
        assert!(!known.needs_probe());

        let unknown = BodyDescriptor::from_body(BodyStream::from_reader(&b"hello"[..], None).into()).unwrap();
        assert_eq!(unknown.known_length(), None);
    }

    #[tokio::test]
    async fn file_streams_are_probed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.txt");
        tokio::fs::write(&path, b"0123456789").await.unwrap();

        let stream = BodyStream::from_path(&path);
        assert!(stream.needs_probe());
        assert_eq!(stream.known_length(), None);
        let probed = stream.probe().await.unwrap();
        assert_eq!(probed.length.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn partially_read_files_report_the_remainder() {
        use tokio::io::AsyncReadExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.txt");
        tokio::fs::write(&path, b"0123456789").await.unwrap();
        let mut file = File::open(&path).await.unwrap();
        let mut head = [0u8; 4];
        file.read_exact(&mut head).await.unwrap();

        let probed = BodyStream::from_file(file).probe().await.unwrap();
        assert_eq!(probed.length.unwrap(), Some(6));
    }

    #[tokio::test]
    async fn missing_path_fails_to_probe() {
        let dir = tempfile::tempdir().unwrap();
        let err = BodyStream::from_path(dir.path().join("gone")).probe().await.err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
