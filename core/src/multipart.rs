//! `multipart/form-data` bodies.
//!
//! # Design
//! Every part is held in memory, so the exact encoded length is known before
//! a single byte is written. `encoded_len` and `encode` walk the same part
//! headers, which keeps the advertised `content-length` and the emitted
//! payload in lockstep.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

const CRLF: &str = "\r\n";

/// One field of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    fn header(&self, boundary: &str) -> String {
        let mut head = format!(
            "--{boundary}{CRLF}Content-Disposition: form-data; name=\"{}\"",
            escape_quoted(&self.name)
        );
        if let Some(filename) = &self.filename {
            head.push_str(&format!("; filename=\"{}\"", escape_quoted(filename)));
        }
        head.push_str(CRLF);
        if let Some(ct) = &self.content_type {
            head.push_str(&format!("Content-Type: {ct}{CRLF}"));
        }
        head.push_str(CRLF);
        head
    }
}

/// An ordered set of form fields with its boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormData {
    boundary: String,
    parts: Vec<Part>,
}

impl FormData {
    /// Empty form with a fresh random boundary.
    pub fn new() -> Self {
        Self::with_boundary(&generate_boundary())
    }

    pub fn with_boundary(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_string(),
            parts: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.push(Part {
            name: name.to_string(),
            filename: None,
            content_type: None,
            data: Bytes::copy_from_slice(value.as_bytes()),
        });
        self
    }

    /// Add a file-like part; `content_type` defaults to `application/octet-stream`.
    /// Control characters in `content_type` are dropped so it stays one header line.
    pub fn file(
        mut self,
        name: &str,
        filename: &str,
        content_type: Option<&str>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(Part {
            name: name.to_string(),
            filename: Some(filename.to_string()),
            content_type: Some(strip_controls(content_type.unwrap_or("application/octet-stream"))),
            data: data.into(),
        });
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Exact byte length of `encode()`.
    pub fn encoded_len(&self) -> u64 {
        let parts: usize = self
            .parts
            .iter()
            .map(|p| p.header(&self.boundary).len() + p.data.len() + CRLF.len())
            .sum();
        (parts + self.footer().len()) as u64
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len() as usize);
        for part in &self.parts {
            buf.put_slice(part.header(&self.boundary).as_bytes());
            buf.put_slice(&part.data);
            buf.put_slice(CRLF.as_bytes());
        }
        buf.put_slice(self.footer().as_bytes());
        buf.freeze()
    }

    fn footer(&self) -> String {
        format!("--{}--{CRLF}", self.boundary)
    }
}

impl Default for FormData {
    fn default() -> Self {
        Self::new()
    }
}

/// 26 dashes followed by 24 random hex digits.
fn generate_boundary() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}{}", "-".repeat(26), &random[..24])
}

fn escape_quoted(s: &str) -> String {
    s.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}

fn strip_controls(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "--------------------------012345678901234567890123";

    #[test]
    fn single_text_field_layout() {
        let form = FormData::with_boundary(BOUNDARY).text("a", "b");
        let expected = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nb\r\n--{BOUNDARY}--\r\n"
        );
        assert_eq!(form.encode(), Bytes::from(expected));
        assert_eq!(form.encoded_len(), 157);
    }

    #[test]
    fn encoded_len_matches_payload_for_mixed_parts() {
        let form = FormData::with_boundary(BOUNDARY)
            .text("greeting", "héllo wörld")
            .file("upload", "data.bin", None, vec![0u8, 1, 2, 3])
            .file("page", "index.html", Some("text/html"), "<p>hi</p>");
        assert_eq!(form.encoded_len(), form.encode().len() as u64);

        let body = String::from_utf8_lossy(&form.encode()).into_owned();
        assert!(body.contains("name=\"upload\"; filename=\"data.bin\"\r\nContent-Type: application/octet-stream\r\n"));
        assert!(body.contains("Content-Type: text/html\r\n"));
    }

    #[test]
    fn empty_form_is_only_the_closing_boundary() {
        let form = FormData::with_boundary("xyz");
        assert_eq!(form.encode(), Bytes::from_static(b"--xyz--\r\n"));
        assert_eq!(form.encoded_len(), 9);
    }

    #[test]
    fn generated_boundaries_are_unique_and_sized() {
        let a = FormData::new();
        let b = FormData::new();
        assert_eq!(a.boundary().len(), 50);
        assert!(a.boundary().starts_with("--------------------------"));
        assert_ne!(a.boundary(), b.boundary());
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let form = FormData::with_boundary("b").text("we\"ird", "v");
        let body = String::from_utf8_lossy(&form.encode()).into_owned();
        assert!(body.contains("name=\"we%22ird\""));
    }

    #[test]
    fn line_breaks_in_part_content_type_are_dropped() {
        let form = FormData::with_boundary("b").file("f", "x.txt", Some("text/plain\r\nX-Injected: 1"), "v");
        let body = String::from_utf8_lossy(&form.encode()).into_owned();
        assert!(body.contains("Content-Type: text/plainX-Injected: 1\r\n\r\nv\r\n"));
        assert!(!body.contains("\r\nX-Injected"));
        assert_eq!(form.encoded_len(), form.encode().len() as u64);
    }
}
