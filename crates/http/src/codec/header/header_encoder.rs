//! Encoder for the status line and header block of a response.
//!
//! `Content-Type` and `Content-Length` always come from the body so the
//! framing can't disagree with the payload. Explicit headers with those
//! names are skipped, the rest are written in insertion order.

use bytes::{BufMut, BytesMut};
use http::StatusCode;
use tokio_util::codec::Encoder;

use crate::protocol::{Response, SendError};

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 256;

/// Encoder for HTTP response heads implementing the [`Encoder`] trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl HeaderEncoder {
    pub(crate) fn write(response: &Response, dst: &mut BytesMut) {
        dst.reserve(INIT_HEADER_SIZE);

        let status = response.status();
        dst.put_slice(b"HTTP/1.1 ");
        dst.put_slice(status.as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(status.canonical_reason().unwrap_or("Unknown").as_bytes());
        dst.put_slice(b"\r\n");

        match response.body() {
            Some(body) => {
                put_header(dst, "Content-Type", body.content_type());
                put_header(dst, "Content-Length", &body.len().to_string());
            }
            None if has_no_content(status) => {}
            None => put_header(dst, "Content-Length", "0"),
        }

        for (name, value) in response.headers().iter() {
            if name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            put_header(dst, name, value);
        }
        dst.put_slice(b"\r\n");
    }
}

impl Encoder<&Response> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: &Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Self::write(item, dst);
        Ok(())
    }
}

// 1xx, 204 and 304 never carry a body, so no Content-Length either
fn has_no_content(status: StatusCode) -> bool {
    status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}

#[inline]
fn put_header(dst: &mut BytesMut, name: &str, value: &str) {
    dst.put_slice(name.as_bytes());
    dst.put_slice(b": ");
    dst.put_slice(value.as_bytes());
    dst.put_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ResponseBody;

    fn encode(response: &Response) -> String {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode(response, &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn test_no_content() {
        let mut response = Response::new(StatusCode::NO_CONTENT);
        response.add_header("Connection", "close");

        assert_eq!(encode(&response), "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n");
    }

    #[test]
    fn test_empty_body_still_framed() {
        let response = Response::new(StatusCode::ACCEPTED);

        assert_eq!(encode(&response), "HTTP/1.1 202 Accepted\r\nContent-Length: 0\r\n\r\n");
    }

    #[test]
    fn test_explicit_framing_headers_are_ignored() {
        let mut response = Response::with_body(StatusCode::OK, ResponseBody::new("text/plain", "abc"));
        response.add_header("Content-Length", "999").add_header("X-Kind", "demo").add_header("content-type", "text/html");

        assert_eq!(
            encode(&response),
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 3\r\nX-Kind: demo\r\n\r\n"
        );
    }
}
