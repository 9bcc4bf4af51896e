//! Request targets.
//!
//! # Design
//! Callers may name the target as a URL string or as structured components.
//! Both shapes are resolved into a single `ResolvedTarget` up front, so the
//! rest of normalization never branches on how the target was written.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::NormalizeError;
use crate::host::{default_port, host_header};

/// Structured description of a request target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlComponents {
    /// `http`, `https`, `ws` or `wss`; a trailing `:` is accepted.
    #[serde(default = "default_scheme", alias = "protocol")]
    pub scheme: String,
    #[serde(alias = "host")]
    pub hostname: String,
    #[serde(default)]
    pub port: Option<u16>,
    /// Origin-form path, optionally already carrying a query.
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub query: Option<String>,
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_path() -> String {
    "/".to_string()
}

impl UrlComponents {
    pub fn new(scheme: &str, hostname: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            hostname: hostname.to_string(),
            port: None,
            path: default_path(),
            query: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }
}

/// Where a request goes, as the caller wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Url(String),
    Components(UrlComponents),
}

impl From<&str> for Target {
    fn from(url: &str) -> Self {
        Target::Url(url.to_string())
    }
}

impl From<String> for Target {
    fn from(url: String) -> Self {
        Target::Url(url)
    }
}

impl From<UrlComponents> for Target {
    fn from(components: UrlComponents) -> Self {
        Target::Components(components)
    }
}

/// A target reduced to the parts normalization and the transport need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub scheme: String,
    pub hostname: String,
    /// The port as written; `None` when it was omitted or implied by the scheme.
    pub port: Option<u16>,
    pub path_and_query: String,
}

impl ResolvedTarget {
    pub fn resolve(target: &Target) -> Result<Self, NormalizeError> {
        match target {
            Target::Url(raw) => Self::from_url(raw),
            Target::Components(c) => Self::from_components(c),
        }
    }

    fn from_url(raw: &str) -> Result<Self, NormalizeError> {
        let url = Url::parse(raw).map_err(|e| NormalizeError::InvalidTarget(format!("{raw}: {e}")))?;
        let scheme = checked_scheme(url.scheme())?;
        let hostname = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| NormalizeError::InvalidTarget(format!("{raw}: missing host")))?
            .to_string();
        let mut path_and_query = url.path().to_string();
        if let Some(q) = url.query() {
            path_and_query.push('?');
            path_and_query.push_str(q);
        }
        Ok(Self {
            scheme,
            hostname,
            port: url.port(),
            path_and_query,
        })
    }

    /// Components are spelled out as a URL and parsed like one, so both input
    /// shapes share host lowercasing, path encoding and default-port rules.
    fn from_components(c: &UrlComponents) -> Result<Self, NormalizeError> {
        let scheme = checked_scheme(c.scheme.trim_end_matches(':'))?;
        if c.hostname.is_empty() {
            return Err(NormalizeError::InvalidTarget("missing hostname".to_string()));
        }
        if c.hostname.chars().any(|ch| ch.is_control() || ch.is_whitespace() || "/?#@\\".contains(ch)) {
            return Err(NormalizeError::InvalidTarget(format!("invalid hostname {:?}", c.hostname)));
        }

        let host = if c.hostname.contains(':') && !c.hostname.starts_with('[') {
            format!("[{}]", c.hostname)
        } else {
            c.hostname.clone()
        };
        let mut raw = format!("{scheme}://{host}");
        if let Some(port) = c.port {
            raw.push_str(&format!(":{port}"));
        }
        if !c.path.starts_with('/') {
            raw.push('/');
        }
        raw.push_str(&c.path);
        if let Some(q) = c.query.as_deref().map(|q| q.trim_start_matches('?')) {
            if !q.is_empty() {
                raw.push('?');
                raw.push_str(q);
            }
        }
        Self::from_url(&raw)
    }

    /// The port the transport connects to.
    pub fn effective_port(&self) -> u16 {
        self.port.or_else(|| default_port(&self.scheme)).unwrap_or(80)
    }

    pub fn host_header(&self) -> String {
        host_header(&self.hostname, self.port, &self.scheme)
    }

    pub fn is_secure(&self) -> bool {
        matches!(self.scheme.as_str(), "https" | "wss")
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host_header(), self.path_and_query)
    }
}

fn checked_scheme(scheme: &str) -> Result<String, NormalizeError> {
    let scheme = scheme.to_ascii_lowercase();
    if default_port(&scheme).is_none() {
        return Err(NormalizeError::InvalidTarget(format!("unsupported scheme `{scheme}`")));
    }
    Ok(scheme)
}
