//! HTTP request decoder module
//!
//! Requests are framed in two phases: the head is decoded by
//! [`HeaderDecoder`], then exactly `Content-Length` body bytes are awaited
//! (zero when the header is absent). The configured ceiling applies to the
//! whole frame, head plus declared body.
//!
//! # Example
//!
//! ```no_run
//! use wharf_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new(1024 * 1024, None);
//! let mut buffer = BytesMut::from("GET / HTTP/1.1\r\n\r\n");
//! let request = decoder.decode(&mut buffer);
//! ```

use std::net::SocketAddr;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header::HeaderDecoder;
use crate::ensure;
use crate::protocol::{ParseError, Request, RequestHead};

/// A decoder producing one [`Request`] per complete frame.
///
/// # State Machine
///
/// The decoder keeps its state in the `pending` field:
/// - `None`: currently parsing the head
/// - `Some(RequestHead)`: waiting for the declared body bytes
#[derive(Debug)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    max_request_size: usize,
    client_addr: Option<SocketAddr>,
    pending: Option<RequestHead>,
}

impl RequestDecoder {
    pub fn new(max_request_size: usize, client_addr: Option<SocketAddr>) -> Self {
        Self { header_decoder: HeaderDecoder::new(max_request_size), max_request_size, client_addr, pending: None }
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let head = match self.pending.take() {
            Some(head) => head,
            None => match self.header_decoder.decode(src)? {
                Some(head) => {
                    let total = head.head_len().checked_add(head.body_len()).unwrap_or(usize::MAX);
                    ensure!(total <= self.max_request_size, ParseError::too_large(total, self.max_request_size));
                    head
                }
                None => return Ok(None),
            },
        };

        let body_len = head.body_len();
        if src.len() < body_len {
            trace!(received = src.len(), expected = body_len, "waiting for request body");
            src.reserve(body_len - src.len());
            self.pending = Some(head);
            return Ok(None);
        }

        let body = src.split_to(body_len);
        head.into_request(&body, self.client_addr).map(Some)
    }
}
