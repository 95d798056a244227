//! HTTP codec module for encoding and decoding HTTP messages
//!
//! - [`RequestDecoder`]: frames and parses inbound requests, head first,
//!   then the `Content-Length` body
//! - [`ResponseEncoder`]: serializes a [`Response`](crate::protocol::Response)
//!   with a derived `Content-Type` / `Content-Length` pair
//!
//! Both plug into `tokio_util::codec::{FramedRead, FramedWrite}`, which is how
//! the connection layer drives them.

mod header;
mod request_decoder;
mod response_encoder;

pub use header::{HeaderDecoder, HeaderEncoder, MAX_HEADER_NUM};
pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
