//! `accept-encoding` negotiation.
//!
//! # Design
//! Whether responses can be Brotli-decoded is a property of the build, not of
//! a request. It is probed once per process by `brotli_supported` and handed
//! to `EncodingNegotiator` as a plain value so normalization stays
//! deterministic under test.

use once_cell::sync::Lazy;

static BROTLI_SUPPORTED: Lazy<bool> = Lazy::new(|| cfg!(feature = "brotli"));

/// Whether the response decoding layer can handle `br`.
pub fn brotli_supported() -> bool {
    *BROTLI_SUPPORTED
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingNegotiator {
    brotli: bool,
}

impl EncodingNegotiator {
    pub fn new(brotli: bool) -> Self {
        Self { brotli }
    }

    /// The computed `accept-encoding` value, or `None` when responses will not
    /// be decompressed and the header must not be sent at all.
    pub fn negotiate(&self, decompress: bool) -> Option<&'static str> {
        if !decompress {
            return None;
        }
        if self.brotli {
            Some("gzip, deflate, br")
        } else {
            Some("gzip, deflate")
        }
    }
}

impl Default for EncodingNegotiator {
    fn default() -> Self {
        Self::new(brotli_supported())
    }
}
