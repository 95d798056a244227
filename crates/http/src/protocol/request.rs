//! Parsed HTTP requests.
//!
//! A request is produced in two steps: the header decoder builds a
//! [`RequestHead`] once the blank line separating head and body has arrived,
//! and the head is turned into a full [`Request`] when the declared body
//! bytes are available. Path parameters are the only part filled in later,
//! by the router that matched the request.

use std::net::SocketAddr;

use bytes::BytesMut;
use http::Version;
use serde_json::Value;
use tokio_util::codec::Decoder;

use crate::codec::HeaderDecoder;
use crate::protocol::{Authorization, Headers, Method, Params, ParseError};

/// Request line and headers of an inbound message.
///
/// `Host`, `Content-Type`, `Content-Length`, `Accept` and `Connection` are
/// extracted into typed fields; every other header lands in [`Headers`].
#[derive(Debug, Clone)]
pub struct RequestHead {
    method: Method,
    path: String,
    query: Params,
    version: Version,
    headers: Headers,
    host: Option<String>,
    content_type: Option<String>,
    content_length: Option<usize>,
    accept: Option<String>,
    connection: Option<String>,
    head_len: usize,
}

impl RequestHead {
    /// Creates a head from the request line. The target is split at the
    /// first `?` into path and query string.
    pub fn new(method: Method, target: &str, version: Version) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Params::parse_query(query)),
            None => (target, Params::new()),
        };

        Self {
            method,
            path: path.to_string(),
            query,
            version,
            headers: Headers::new(),
            host: None,
            content_type: None,
            content_length: None,
            accept: None,
            connection: None,
            head_len: 0,
        }
    }

    /// Records one header line, routing well-known names to their typed field.
    pub fn apply_header(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        if name.eq_ignore_ascii_case("host") {
            self.host = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("content-type") {
            self.content_type = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("content-length") {
            let length = value
                .trim()
                .parse::<usize>()
                .map_err(|_| ParseError::invalid_content_length(format!("value {value} is not usize")))?;
            self.content_length = Some(length);
        } else if name.eq_ignore_ascii_case("accept") {
            self.accept = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("connection") {
            self.connection = Some(value.to_string());
        } else {
            self.headers.insert(name, value);
        }
        Ok(())
    }

    pub(crate) fn set_head_len(&mut self, head_len: usize) {
        self.head_len = head_len;
    }

    /// Number of bytes up to and including the blank line.
    pub fn head_len(&self) -> usize {
        self.head_len
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Declared body length, zero when the header is absent.
    pub fn body_len(&self) -> usize {
        self.content_length.unwrap_or(0)
    }

    /// Attaches the body bytes, decoding them as JSON when they are not blank.
    pub fn into_request(self, body: &[u8], client_addr: Option<SocketAddr>) -> Result<Request, ParseError> {
        let body = if body.trim_ascii().is_empty() {
            None
        } else {
            let value = serde_json::from_slice::<Value>(body).map_err(ParseError::invalid_body)?;
            Some(value)
        };

        Ok(Request { head: self, path_params: Params::new(), body, client_addr })
    }
}

/// A complete request handed to handlers.
#[derive(Debug, Clone)]
pub struct Request {
    head: RequestHead,
    path_params: Params,
    body: Option<Value>,
    client_addr: Option<SocketAddr>,
}

impl Request {
    /// Builds a request without going through the wire format.
    pub fn new(method: Method, target: &str) -> Self {
        Self { head: RequestHead::new(method, target, Version::HTTP_11), path_params: Params::new(), body: None, client_addr: None }
    }

    /// Parses one complete frame: request line, headers, blank line and body.
    ///
    /// Everything after the blank line is the body, cut to `Content-Length`
    /// when that header is present and smaller.
    pub fn parse(frame: &[u8], client_addr: Option<SocketAddr>) -> Result<Request, ParseError> {
        let mut src = BytesMut::from(frame);
        let head = HeaderDecoder::new(frame.len()).decode(&mut src)?.ok_or(ParseError::MissingSeparator)?;

        let body = match head.content_length {
            Some(length) if length < src.len() => &src[..length],
            _ => &src[..],
        };
        head.into_request(body, client_addr)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ParseError> {
        self.head.apply_header(name, value)?;
        Ok(self)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_client_addr(mut self, client_addr: SocketAddr) -> Self {
        self.client_addr = Some(client_addr);
        self
    }

    pub fn method(&self) -> Method {
        self.head.method
    }

    /// The route path without the query string.
    pub fn path(&self) -> &str {
        &self.head.path
    }

    pub fn version(&self) -> Version {
        self.head.version
    }

    /// Headers other than the typed well-known ones.
    pub fn headers(&self) -> &Headers {
        &self.head.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name)
    }

    pub fn host(&self) -> Option<&str> {
        self.head.host.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.head.content_type.as_deref()
    }

    pub fn content_length(&self) -> Option<usize> {
        self.head.content_length
    }

    pub fn accept(&self) -> Option<&str> {
        self.head.accept.as_deref()
    }

    pub fn connection(&self) -> Option<&str> {
        self.head.connection.as_deref()
    }

    pub fn query_params(&self) -> &Params {
        &self.head.query
    }

    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Replaces the path parameters, called once a route has matched.
    pub fn set_path_params(&mut self, params: Params) {
        self.path_params = params;
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn take_body(&mut self) -> Option<Value> {
        self.body.take()
    }

    pub fn client_addr(&self) -> Option<SocketAddr> {
        self.client_addr
    }

    pub fn authorization(&self) -> Option<Authorization> {
        self.header("Authorization").and_then(Authorization::parse)
    }

    /// Whether the connection should stay open after answering this request.
    ///
    /// An explicit `Connection` header decides, with `keep-alive` taking
    /// precedence over `close`. Without one HTTP/1.1 keeps alive and older
    /// versions close.
    pub fn keep_alive(&self) -> bool {
        match self.head.connection.as_deref() {
            Some(value) => {
                let mut close = false;
                for token in value.split(',').map(str::trim) {
                    if token.eq_ignore_ascii_case("keep-alive") {
                        return true;
                    }
                    close |= token.eq_ignore_ascii_case("close");
                }
                !close && self.head.version == Version::HTTP_11
            }
            None => self.head.version == Version::HTTP_11,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use serde_json::json;

    #[test]
    fn test_parse_full_request() {
        let str = indoc! {r#"
        POST /users/42?page=2&sort=name%20asc HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Content-Type: application/json
        Content-Length: 14
        Accept: */*
        X-Trace: abc

        {"name":"tom"}
        "#};

        let frame = str.replace('\n', "\r\n");
        let request = Request::parse(frame.as_bytes(), None).unwrap();

        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.path(), "/users/42");
        assert_eq!(request.version(), Version::HTTP_11);
        assert_eq!(request.host(), Some("127.0.0.1:8080"));
        assert_eq!(request.content_type(), Some("application/json"));
        assert_eq!(request.content_length(), Some(14));
        assert_eq!(request.accept(), Some("*/*"));
        assert_eq!(request.headers().len(), 2);
        assert_eq!(request.header("user-agent"), Some("curl/7.79.1"));
        assert_eq!(request.header("Host"), None);
        assert_eq!(request.query_params().get("page"), Some("2"));
        assert_eq!(request.query_params().get("sort"), Some("name asc"));
        assert_eq!(request.body(), Some(&json!({"name": "tom"})));
        assert!(request.path_params().is_empty());
    }

    #[test]
    fn test_parse_without_body() {
        let frame = "GET /health HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let request = Request::parse(frame.as_bytes(), None).unwrap();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.body(), None);
    }

    #[test]
    fn test_parse_missing_separator() {
        let frame = "GET /health HTTP/1.1\r\nHost: localhost\r\n";
        let result = Request::parse(frame.as_bytes(), None);

        assert!(matches!(result, Err(ParseError::MissingSeparator)));
    }

    #[test]
    fn test_parse_invalid_method() {
        let frame = "HEAD /health HTTP/1.1\r\n\r\n";
        let result = Request::parse(frame.as_bytes(), None);

        assert!(matches!(result, Err(ParseError::InvalidMethod(m)) if m == "HEAD"));
    }

    #[test]
    fn test_parse_invalid_json_body() {
        let frame = "POST /users HTTP/1.1\r\nContent-Length: 7\r\n\r\n{name: ";
        let result = Request::parse(frame.as_bytes(), None);

        assert!(matches!(result, Err(ParseError::InvalidBody { .. })));
    }

    #[test]
    fn test_keep_alive() {
        let http11 = Request::new(Method::Get, "/");
        assert!(http11.keep_alive());

        let close = Request::new(Method::Get, "/").with_header("Connection", "close").unwrap();
        assert!(!close.keep_alive());

        let both = Request::new(Method::Get, "/").with_header("connection", "Close, Keep-Alive").unwrap();
        assert!(both.keep_alive());

        let http10 = Request::parse(b"GET / HTTP/1.0\r\n\r\n", None).unwrap();
        assert!(!http10.keep_alive());

        let http10_keep = Request::parse(b"GET / HTTP/1.0\r\nConnection: keep-alive\r\n\r\n", None).unwrap();
        assert!(http10_keep.keep_alive());
    }

    #[test]
    fn test_authorization() {
        let request = Request::new(Method::Get, "/").with_header("Authorization", "Bearer t0k3n").unwrap();
        assert_eq!(request.authorization(), Some(Authorization::Bearer("t0k3n".into())));

        assert_eq!(Request::new(Method::Get, "/").authorization(), None);
    }

    #[test]
    fn test_invalid_content_length() {
        let result = Request::new(Method::Post, "/").with_header("Content-Length", "ten");
        assert!(matches!(result, Err(ParseError::InvalidContentLength { .. })));
    }
}
