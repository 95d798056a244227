use async_trait::async_trait;
use wharf_http::protocol::{Request, Response};

use crate::error::{Error, HttpException};
use crate::handler::RequestHandler;
use crate::middleware::Middleware;

pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Rejects requests whose declared `Content-Length` exceeds a limit with 413.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit {
    max_bytes: usize,
}

impl BodyLimit {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

impl Default for BodyLimit {
    fn default() -> Self {
        Self::new(DEFAULT_BODY_LIMIT)
    }
}

#[async_trait]
impl Middleware for BodyLimit {
    async fn handle(&self, req: Request, next: &dyn RequestHandler) -> Result<Response, Error> {
        if req.content_length().is_some_and(|length| length > self.max_bytes) {
            return Err(HttpException::payload_too_large(format!(
                "Payload too large. Maximum allowed size is {} bytes",
                self.max_bytes
            ))
            .into());
        }
        next.invoke(req).await
    }
}
