//! Request head decoding and response head encoding.
//!
//! - [`HeaderDecoder`]: request line and headers into a
//!   [`RequestHead`](crate::protocol::RequestHead), enforcing the size ceiling
//! - [`HeaderEncoder`]: status line and headers of a
//!   [`Response`](crate::protocol::Response)

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_decoder::MAX_HEADER_NUM;
pub use header_encoder::HeaderEncoder;
