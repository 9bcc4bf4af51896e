//! Outbound request normalization for an HTTP client.
//!
//! # Overview
//! Turns a loosely specified request (URL or components, headers, body,
//! options) into a fully determined request: every derived header computed,
//! every explicit caller header respected, and the body reduced to bytes or a
//! stream whose length is known whenever it can be. The caller's transport
//! performs the actual I/O (host-does-IO pattern).
//!
//! # Design
//! - `Normalizer` holds only configuration; each request gets its own
//!   `HeaderTable` and `BodyDescriptor`, so nothing is shared between
//!   in-flight normalizations.
//! - `normalize` is synchronous and performs all validation;
//!   `PendingRequest::finalize` is async only to size file-backed streams.
//! - Header instructions are a tagged `HeaderValue` (present, deleted,
//!   unchanged) rather than sentinel values.
//!
//! ```
//! use outbound_core::{Normalizer, NormalizerConfig, RequestOptions};
//!
//! let normalizer = Normalizer::new(NormalizerConfig { brotli: false, ..Default::default() });
//! let pending = normalizer
//!     .normalize(RequestOptions::new("http://example.com:8080/").header("X-Trace", "1"))
//!     .unwrap();
//! assert_eq!(pending.headers().get_str("host"), Some("example.com:8080"));
//! assert_eq!(pending.headers().get_str("accept-encoding"), Some("gzip, deflate"));
//! ```

pub mod body;
pub mod config;
pub mod encoding;
pub mod error;
pub mod headers;
pub mod host;
pub mod multipart;
pub mod normalizer;
pub mod options;
pub mod request;
pub mod target;

pub use body::{Body, BodyDescriptor, BodyStream, FinalBody};
pub use config::{NormalizerConfig, ProbeFailurePolicy};
pub use encoding::{brotli_supported, EncodingNegotiator};
pub use error::NormalizeError;
pub use headers::{FieldValue, HeaderPatch, HeaderTable, HeaderValue};
pub use host::host_header;
pub use multipart::FormData;
pub use normalizer::{derive_body_headers, Normalizer, PendingRequest};
pub use options::RequestOptions;
pub use request::Request;
pub use target::{ResolvedTarget, Target, UrlComponents};
