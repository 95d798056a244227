use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::codec::header::HeaderEncoder;
use crate::protocol::{Response, SendError};

/// Writes a complete [`Response`]: head from [`HeaderEncoder`], then the body bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn write(response: &Response, dst: &mut BytesMut) {
        HeaderEncoder::write(response, dst);
        if let Some(body) = response.body() {
            dst.put_slice(body.data());
        }
    }
}

impl Encoder<&Response> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: &Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Self::write(item, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_encode_matches_to_bytes() {
        let mut response = Response::error(StatusCode::METHOD_NOT_ALLOWED, "nope");
        response.add_header("Connection", "close");

        let mut dst = BytesMut::new();
        ResponseEncoder::new().encode(&response, &mut dst).unwrap();

        assert_eq!(dst.freeze(), response.to_bytes());
        assert!(response.to_bytes().ends_with(br#"{"error":{"code":405,"message":"nope"}}"#));
    }
}
