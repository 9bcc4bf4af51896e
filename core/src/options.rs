//! Per-request options.
//!
//! # Design
//! `RequestOptions` is the typed surface. `RequestOptions::from_json` accepts
//! the loose option bag that scripting front-ends tend to produce, and maps
//! it onto the typed surface with a fixed key set: unknown keys are rejected
//! rather than ignored, so a typo never silently drops a setting.

use http::Method;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::body::Body;
use crate::error::NormalizeError;
use crate::headers::{HeaderPatch, HeaderValue};
use crate::target::{Target, UrlComponents};

/// Everything the caller says about one request.
#[derive(Debug)]
pub struct RequestOptions {
    pub target: Target,
    pub method: Method,
    pub headers: HeaderPatch,
    pub body: Body,
    /// Whether responses will be decompressed; controls `accept-encoding`.
    pub decompress: bool,
}

impl RequestOptions {
    pub fn new(target: impl Into<Target>) -> Self {
        Self {
            target: target.into(),
            method: Method::GET,
            headers: HeaderPatch::new(),
            body: Body::Absent,
            decompress: true,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<HeaderValue>) -> Self {
        self.headers.push(name, value);
        self
    }

    pub fn headers(mut self, patch: HeaderPatch) -> Self {
        for (name, value) in patch.iter() {
            self.headers.push(name, value.clone());
        }
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn decompress(mut self, decompress: bool) -> Self {
        self.decompress = decompress;
        self
    }

    /// Build options from a loose JSON option bag.
    ///
    /// Recognized keys: `url`, `protocol`, `hostname` (or `host`), `port`,
    /// `path`, `method`, `headers`, `body`, `json`, `form`, `decompress`.
    ///
    /// Header values are a string, an array of strings, or `null` to delete
    /// the header. JSON has no `undefined`: a header left out of `headers` is
    /// left unchanged, and `HeaderValue::Unchanged` itself is only available
    /// through the typed builder.
    pub fn from_json(value: Value) -> Result<Self, NormalizeError> {
        let raw: RawOptions =
            serde_json::from_value(value).map_err(|e| NormalizeError::InvalidOptions(e.to_string()))?;

        let target = match (raw.url, raw.hostname) {
            (Some(url), None) => {
                if raw.protocol.is_some() || raw.port.is_some() || raw.path.is_some() {
                    return Err(NormalizeError::InvalidOptions(
                        "`url` cannot be combined with protocol, port or path".to_string(),
                    ));
                }
                Target::Url(url)
            }
            (None, Some(hostname)) => Target::Components(UrlComponents {
                scheme: raw.protocol.unwrap_or_else(|| "http".to_string()),
                hostname,
                port: raw.port,
                path: raw.path.unwrap_or_else(|| "/".to_string()),
                query: None,
            }),
            (Some(_), Some(_)) => {
                return Err(NormalizeError::InvalidOptions(
                    "`url` and `hostname` are mutually exclusive".to_string(),
                ))
            }
            (None, None) => {
                return Err(NormalizeError::InvalidOptions("missing `url` or `hostname`".to_string()))
            }
        };

        let method = match raw.method {
            Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| NormalizeError::InvalidMethod(m.clone()))?,
            None => Method::GET,
        };

        let mut headers = HeaderPatch::new();
        for (name, value) in raw.headers.unwrap_or_default() {
            let value = header_value_from_json(&name, value)?;
            headers.push(name, value);
        }

        let body = match (raw.body, raw.json, raw.form) {
            (None, None, None) => Body::Absent,
            (Some(text), None, None) => Body::from(text),
            (None, Some(json), None) => Body::Json(json),
            (None, None, Some(form)) => Body::Form(form_pairs(form)?),
            _ => {
                return Err(NormalizeError::InvalidOptions(
                    "only one of `body`, `json` and `form` may be given".to_string(),
                ))
            }
        };

        Ok(Self {
            target,
            method,
            headers,
            body,
            decompress: raw.decompress.unwrap_or(true),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    url: Option<String>,
    #[serde(alias = "scheme")]
    protocol: Option<String>,
    #[serde(alias = "host")]
    hostname: Option<String>,
    port: Option<u16>,
    path: Option<String>,
    method: Option<String>,
    headers: Option<Map<String, Value>>,
    body: Option<String>,
    json: Option<Value>,
    form: Option<Map<String, Value>>,
    decompress: Option<bool>,
}

fn header_value_from_json(name: &str, value: Value) -> Result<HeaderValue, NormalizeError> {
    let invalid = || NormalizeError::InvalidHeaderValue { name: name.to_string() };
    match value {
        Value::String(s) => Ok(HeaderValue::from(s)),
        Value::Null => Ok(HeaderValue::Deleted),
        Value::Array(items) => {
            let values = items
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s),
                    _ => Err(invalid()),
                })
                .collect::<Result<Vec<_>, _>>()?;
            if values.is_empty() {
                return Err(invalid());
            }
            Ok(HeaderValue::from(values))
        }
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => Err(invalid()),
    }
}

fn form_pairs(form: Map<String, Value>) -> Result<Vec<(String, String)>, NormalizeError> {
    form.into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(NormalizeError::InvalidOptions(format!(
                        "form field `{k}` must be a string, number or boolean"
                    )))
                }
            };
            Ok((k, v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_bag_is_parsed() {
        let opts = RequestOptions::from_json(json!({
            "url": "https://example.com/a",
            "method": "put",
            "headers": {"X-One": "1", "x-gone": null, "x-many": ["a", "b"]},
            "decompress": false
        }))
        .unwrap();
        assert_eq!(opts.target, Target::Url("https://example.com/a".to_string()));
        assert_eq!(opts.method, Method::PUT);
        assert!(!opts.decompress);
        let headers: Vec<_> = opts.headers.iter().collect();
        assert_eq!(headers[0], ("X-One", &HeaderValue::from("1")));
        assert_eq!(headers[1], ("x-gone", &HeaderValue::Deleted));
        assert_eq!(
            headers[2],
            ("x-many", &HeaderValue::from(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn component_bag_is_parsed() {
        let opts = RequestOptions::from_json(json!({
            "protocol": "https:",
            "host": "example.com",
            "port": 8443,
            "path": "/x"
        }))
        .unwrap();
        match opts.target {
            Target::Components(c) => {
                assert_eq!(c.scheme, "https:");
                assert_eq!(c.hostname, "example.com");
                assert_eq!(c.port, Some(8443));
                assert_eq!(c.path, "/x");
            }
            other => panic!("expected components, got {other:?}"),
        }
        assert_eq!(opts.method, Method::GET);
        assert!(opts.decompress);
    }

    #[test]
    fn non_string_header_values_are_rejected() {
        for bad in [json!(1), json!(true), json!({"a": "b"}), json!(["ok", 2]), json!([])] {
            let err = RequestOptions::from_json(json!({
                "url": "http://example.com",
                "headers": {"x-bad": bad}
            }))
            .unwrap_err();
            assert!(matches!(err, NormalizeError::InvalidHeaderValue { ref name } if name == "x-bad"));
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RequestOptions::from_json(json!({"url": "http://example.com", "retries": 3})).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidOptions(_)));
    }

    #[test]
    fn conflicting_targets_and_bodies_are_rejected() {
        let err = RequestOptions::from_json(json!({"url": "http://a", "hostname": "b"})).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidOptions(_)));

        let err = RequestOptions::from_json(json!({"url": "http://a", "body": "x", "json": {}})).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidOptions(_)));

        let err = RequestOptions::from_json(json!({"method": "GET"})).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidOptions(_)));
    }

    #[test]
    fn form_values_are_stringified() {
        let opts = RequestOptions::from_json(json!({
            "url": "http://example.com",
            "form": {"n": 1, "b": true, "s": "x"}
        }))
        .unwrap();
        match opts.body {
            Body::Form(pairs) => assert_eq!(
                pairs,
                vec![
                    ("n".to_string(), "1".to_string()),
                    ("b".to_string(), "true".to_string()),
                    ("s".to_string(), "x".to_string()),
                ]
            ),
            other => panic!("expected form body, got {other:?}"),
        }
    }

    #[test]
    fn invalid_method_is_reported() {
        let err = RequestOptions::from_json(json!({"url": "http://a", "method": "GE T"})).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidMethod(_)));
    }

    #[test]
    fn omitted_header_leaves_default_in_place() {
        use crate::normalizer::Normalizer;

        let opts = RequestOptions::from_json(json!({
            "url": "http://example.com",
            "headers": {"user-agent": null}
        }))
        .unwrap();
        let pending = Normalizer::default().normalize(opts).unwrap();
        assert_eq!(pending.headers().get_str("accept"), Some("*/*"));
        assert!(!pending.headers().contains("user-agent"));
    }
}
