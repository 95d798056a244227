//! Outbound HTTP responses.
//!
//! A [`Response`] is a status, an ordered header list and an optional body.
//! `Content-Type` and `Content-Length` are derived from the body when the
//! response is written, see [`crate::codec::ResponseEncoder`].

use bytes::{Bytes, BytesMut};
use http::StatusCode;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::codec::ResponseEncoder;
use crate::protocol::Headers;

/// Serialized body together with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBody {
    content_type: String,
    data: Bytes,
}

impl ResponseBody {
    pub fn new(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self { content_type: content_type.into(), data: data.into() }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Option<ResponseBody>,
}

impl Response {
    /// A response without body.
    pub fn new(status: StatusCode) -> Self {
        Self { status, headers: Headers::new(), body: None }
    }

    /// `204 No Content`.
    pub fn empty() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    pub fn with_body(status: StatusCode, body: ResponseBody) -> Self {
        Self { status, headers: Headers::new(), body: Some(body) }
    }

    /// Serializes `value` as the JSON body.
    ///
    /// A value that fails to serialize yields a 500 error response instead.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(data) => Self::with_body(status, ResponseBody::new(mime::APPLICATION_JSON.as_ref(), data)),
            Err(e) => {
                error!(cause = %e, "failed to serialize response body");
                Self::error(StatusCode::INTERNAL_SERVER_ERROR, "response body could not be serialized")
            }
        }
    }

    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self::with_body(status, ResponseBody::new(mime::TEXT_PLAIN_UTF_8.as_ref(), text.into()))
    }

    pub fn html(status: StatusCode, html: impl Into<String>) -> Self {
        Self::with_body(status, ResponseBody::new(mime::TEXT_HTML_UTF_8.as_ref(), html.into()))
    }

    /// A `302 Found` pointing at `location`.
    pub fn redirect(location: &str) -> Self {
        let mut response = Self::new(StatusCode::FOUND);
        response.add_header("Location", location);
        response
    }

    /// The structured error body `{"error": {"code": .., "message": ..}}`.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": message.into(),
            }
        });
        Self::json(status, &body)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Adds a header, replacing the value of an existing one with the same name.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(&self) -> Option<&ResponseBody> {
        self.body.as_ref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.body.as_ref().map(ResponseBody::content_type)
    }

    /// Decodes a JSON body, mostly useful in tests.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.body.as_ref().and_then(|body| serde_json::from_slice(&body.data).ok())
    }

    /// The wire representation. Calling it repeatedly yields identical bytes.
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::new();
        ResponseEncoder::write(self, &mut dst);
        dst.freeze()
    }
}
