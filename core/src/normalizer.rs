//! Turns `RequestOptions` into a fully determined `Request`.
//!
//! # Design
//! Headers are assembled in three stages on one `HeaderTable`:
//! 1. configured defaults (`user-agent`, `accept`),
//! 2. the caller's headers, applied with `set` so they can overwrite, delete
//!    or keep defaults,
//! 3. computed headers (`accept-encoding`, `host`, `content-type`,
//!    `content-length`), applied with `set_computed` so they never replace a
//!    caller value and never resurrect a deleted one.
//!
//! URL strings and structured components are resolved before stage 1, so
//! both input shapes go through the exact same table construction.
//!
//! `normalize` does all of this synchronously. `PendingRequest::finalize`
//! is only asynchronous because file-backed streams need a metadata query to
//! learn their length; dropping its future closes the file and sends nothing.

use http::Method;
use tracing::{debug, warn};

use crate::body::{BodyDescriptor, FinalBody};
use crate::config::{NormalizerConfig, ProbeFailurePolicy};
use crate::encoding::EncodingNegotiator;
use crate::error::NormalizeError;
use crate::headers::{HeaderPatch, HeaderTable};
use crate::options::RequestOptions;
use crate::request::Request;
use crate::target::ResolvedTarget;

const ACCEPT: &str = "accept";
const ACCEPT_ENCODING: &str = "accept-encoding";
const CONTENT_LENGTH: &str = "content-length";
const CONTENT_TYPE: &str = "content-type";
const HOST: &str = "host";
const USER_AGENT: &str = "user-agent";

/// Stateless request normalizer; one instance can serve any number of
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
    negotiator: EncodingNegotiator,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        let negotiator = EncodingNegotiator::new(config.brotli);
        Self { config, negotiator }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Validate `options` and build the header table.
    pub fn normalize(&self, options: RequestOptions) -> Result<PendingRequest, NormalizeError> {
        let RequestOptions {
            target,
            method,
            headers: user_headers,
            body,
            decompress,
        } = options;

        user_headers.validate()?;
        let target = ResolvedTarget::resolve(&target)?;
        let body = BodyDescriptor::from_body(body)?;

        let mut headers = HeaderTable::new();
        headers.merge(&self.default_headers());
        headers.merge(&user_headers);

        let mut computed = HeaderPatch::new();
        if let Some(encoding) = self.negotiator.negotiate(decompress) {
            computed.push(ACCEPT_ENCODING, encoding);
        }
        computed.push(HOST, target.host_header());
        headers.merge_computed(&computed);

        let body_headers = derive_body_headers(&body, &headers, &method);
        headers.merge_computed(&body_headers);

        debug!(
            %method,
            %target,
            headers = headers.len(),
            probe = body.needs_probe(),
            "request normalized"
        );

        Ok(PendingRequest {
            method,
            target,
            headers,
            body,
            probe_failure: self.config.probe_failure,
        })
    }

    /// `normalize` followed by `PendingRequest::finalize`.
    pub async fn finalize(&self, options: RequestOptions) -> Result<Request, NormalizeError> {
        self.normalize(options)?.finalize().await
    }

    fn default_headers(&self) -> HeaderPatch {
        let mut patch = HeaderPatch::new();
        if let Some(ua) = &self.config.user_agent {
            patch.push(USER_AGENT, ua.as_str());
        }
        if let Some(accept) = &self.config.accept {
            patch.push(ACCEPT, accept.as_str());
        }
        patch
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

/// A normalized request whose body length may still need probing.
#[derive(Debug)]
pub struct PendingRequest {
    method: Method,
    target: ResolvedTarget,
    headers: HeaderTable,
    body: BodyDescriptor,
    probe_failure: ProbeFailurePolicy,
}

impl PendingRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &ResolvedTarget {
        &self.target
    }

    /// Headers as known before any probing.
    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    pub fn body(&self) -> &BodyDescriptor {
        &self.body
    }

    /// Probe the body length if needed and produce the immutable request.
    pub async fn finalize(self) -> Result<Request, NormalizeError> {
        let PendingRequest {
            method,
            target,
            mut headers,
            body,
            probe_failure,
        } = self;

        let body = match body {
            BodyDescriptor::Absent => FinalBody::Empty,
            BodyDescriptor::InlineBytes { bytes, .. } => FinalBody::Bytes(bytes),
            BodyDescriptor::Multipart(form) => FinalBody::Bytes(form.encode()),
            BodyDescriptor::Stream(stream) if stream.needs_probe() => {
                let probed = stream.probe().await.map_err(NormalizeError::BodyInspection)?;
                match probed.length {
                    Ok(length) => {
                        if let Some(len) = derive_length(length, false, &headers, &method) {
                            headers.set_computed(CONTENT_LENGTH, len);
                        }
                    }
                    Err(e) if probe_failure == ProbeFailurePolicy::Chunked => {
                        warn!(error = %e, %target, "stream length unknown, sending without content-length");
                    }
                    Err(e) => return Err(NormalizeError::BodyInspection(e)),
                }
                FinalBody::Stream(probed.reader)
            }
            BodyDescriptor::Stream(stream) => match stream.into_reader() {
                Some(reader) => FinalBody::Stream(reader),
                None => FinalBody::Empty,
            },
        };

        Ok(Request::new(method, target, headers, body))
    }
}

/// Headers implied by `body`, given what `existing` already holds.
///
/// A caller-supplied `content-length` is never re-derived, even when it
/// disagrees with the body. A caller-supplied `content-type` is kept as is.
pub fn derive_body_headers(body: &BodyDescriptor, existing: &HeaderTable, method: &Method) -> HeaderPatch {
    let mut patch = HeaderPatch::new();
    if !existing.contains(CONTENT_TYPE) {
        if let Some(content_type) = body.default_content_type() {
            patch.push(CONTENT_TYPE, content_type);
        }
    }
    if let Some(len) = derive_length(body.known_length(), body.is_absent(), existing, method) {
        patch.push(CONTENT_LENGTH, len);
    }
    patch
}

fn derive_length(known: Option<u64>, absent: bool, existing: &HeaderTable, method: &Method) -> Option<String> {
    if let Some(explicit) = existing.get(CONTENT_LENGTH) {
        if let (Some(explicit), Some(known)) = (explicit.as_str(), known) {
            if explicit.trim() != known.to_string() {
                warn!(explicit, actual = known, "explicit content-length differs from body length");
            }
        }
        return None;
    }
    match known {
        Some(len) => Some(len.to_string()),
        None if absent && expects_content(method) => Some("0".to_string()),
        None => None,
    }
}

/// Methods that define a meaning for enclosed content; an empty body is
/// announced with `content-length: 0`.
fn expects_content(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}
