//! The finalized request handed to the transport.
//!
//! # Design
//! A `Request` is plain data: the transport reads the method, target, ordered
//! header lines and body from it and owns all socket I/O. Nothing here can
//! be mutated once `PendingRequest::finalize` has produced it.

use bytes::Bytes;
use http::Method;

use crate::body::FinalBody;
use crate::headers::HeaderTable;
use crate::target::ResolvedTarget;

#[derive(Debug)]
pub struct Request {
    method: Method,
    target: ResolvedTarget,
    headers: HeaderTable,
    body: FinalBody,
}

impl Request {
    pub(crate) fn new(method: Method, target: ResolvedTarget, headers: HeaderTable, body: FinalBody) -> Self {
        Self {
            method,
            target,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &ResolvedTarget {
        &self.target
    }

    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    pub fn body(&self) -> &FinalBody {
        &self.body
    }

    /// The request line and header block in HTTP/1.1 wire format, ending with
    /// the blank line that separates it from the body.
    pub fn write_head(&self) -> Bytes {
        let mut head = format!("{} {} HTTP/1.1\r\n", self.method, self.target.path_and_query);
        for (name, value) in self.headers.iter_wire() {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        Bytes::from(head)
    }

    pub fn into_parts(self) -> (Method, ResolvedTarget, HeaderTable, FinalBody) {
        (self.method, self.target, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;

    #[test]
    fn head_uses_origin_form_and_spelling_as_set() {
        let target = ResolvedTarget::resolve(&Target::from("http://example.com:8080/a?b=c")).unwrap();
        let mut headers = HeaderTable::new();
        headers.set("user-agent", "lib");
        headers.set("X-Custom", "1");
        headers.set("x-multi", vec!["a".to_string(), "b".to_string()]);
        let req = Request::new(Method::POST, target, headers, FinalBody::Empty);

        assert_eq!(
            req.write_head(),
            Bytes::from_static(
                b"POST /a?b=c HTTP/1.1\r\nuser-agent: lib\r\nX-Custom: 1\r\nx-multi: a\r\nx-multi: b\r\n\r\n"
            )
        );
    }
}
