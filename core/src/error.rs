//! Error types for request normalization.
//!
//! # Design
//! Every variant except `BodyInspection` is raised synchronously by
//! `Normalizer::normalize`, before any body is probed or any byte reaches the
//! transport. Conflicting explicit headers are not errors: the caller's value
//! always wins.

use std::io;

use thiserror::Error;

/// Errors returned while normalizing or finalizing a request.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A header value was neither a string, a list of strings, nor a deletion
    /// marker, or it contains bytes that cannot be written on the wire.
    #[error("invalid value for header `{name}`")]
    InvalidHeaderValue { name: String },

    #[error("invalid header name `{0}`")]
    InvalidHeaderName(String),

    /// The URL could not be parsed, has no host, or uses an unsupported scheme.
    #[error("invalid request target: {0}")]
    InvalidTarget(String),

    #[error("invalid method `{0}`")]
    InvalidMethod(String),

    /// The loose option bag had the wrong shape or an unknown key.
    #[error("invalid request options: {0}")]
    InvalidOptions(String),

    /// Querying the size of a stream body failed.
    #[error("body inspection failed: {0}")]
    BodyInspection(#[source] io::Error),
}
