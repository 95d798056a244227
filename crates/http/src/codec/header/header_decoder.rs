//! Decoder for the request line and header block.
//!
//! Parsing is delegated to `httparse`; once the blank line has arrived the
//! head bytes are split off the buffer and turned into a [`RequestHead`].
//! Until then the buffered size is checked against the configured ceiling so
//! a peer can't grow the buffer without ever finishing the head.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Only HTTP/1.0 and HTTP/1.1

use bytes::{Buf, BytesMut};
use http::Version;
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{Method, ParseError, RequestHead};

/// Maximum number of headers allowed in a request
pub const MAX_HEADER_NUM: usize = 64;

/// Decoder for HTTP request heads implementing the [`Decoder`] trait.
#[derive(Debug, Clone, Copy)]
pub struct HeaderDecoder {
    max_size: usize,
}

impl HeaderDecoder {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }
}

impl Decoder for HeaderDecoder {
    type Item = RequestHead;
    type Error = ParseError;

    /// Returns `Ok(None)` while the blank line hasn't been received.
    ///
    /// # Errors
    ///
    /// - `TooLarge` when an incomplete head already exceeds the ceiling
    /// - `TooManyHeaders` above [`MAX_HEADER_NUM`]
    /// - `InvalidRequestLine`, `InvalidMethod`, `InvalidVersion` or
    ///   `InvalidHeader` for malformed input
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let parsed_result = req.parse(&src[..]).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            Error::Token | Error::Version | Error::NewLine => ParseError::invalid_request_line(e.to_string()),
            e => ParseError::invalid_header(e.to_string()),
        });

        let head_len = match parsed_result? {
            Status::Complete(head_len) => head_len,
            Status::Partial => {
                ensure!(src.len() <= self.max_size, ParseError::too_large(src.len(), self.max_size));
                return Ok(None);
            }
        };
        trace!(head_len, "parsed request head");

        let method = req.method.ok_or_else(|| ParseError::invalid_request_line("missing method"))?.parse::<Method>()?;
        let target = req.path.ok_or_else(|| ParseError::invalid_request_line("missing path"))?;
        let version = match req.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            v => return Err(ParseError::InvalidVersion(v)),
        };

        let mut head = RequestHead::new(method, target, version);
        for header in req.headers.iter() {
            let value = std::str::from_utf8(header.value)
                .map_err(|_| ParseError::invalid_header(format!("value of {} is not utf8", header.name)))?;
            head.apply_header(header.name, value)?;
        }
        head.set_head_len(head_len);

        src.advance(head_len);
        Ok(Some(head))
    }
}
