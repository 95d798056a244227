use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};
use wharf_http::protocol::{Request, Response};

use crate::error::Error;
use crate::handler::RequestHandler;
use crate::middleware::Middleware;

/// Logs one line per request with its outcome and latency.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

#[async_trait]
impl Middleware for AccessLog {
    async fn handle(&self, req: Request, next: &dyn RequestHandler) -> Result<Response, Error> {
        let method = req.method();
        let path = req.path().to_string();
        let start = Instant::now();

        let result = next.invoke(req).await;

        let elapsed = start.elapsed();
        match &result {
            Ok(response) => info!(%method, %path, status = response.status().as_u16(), ?elapsed, "request served"),
            Err(e) => warn!(%method, %path, cause = %e, ?elapsed, "request failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use http::StatusCode;
    use wharf_http::protocol::Method;

    #[tokio::test]
    async fn test_passes_through() {
        let next = handler_fn(|_req: Request| async { Ok(Response::text(StatusCode::OK, "ok")) });

        let response = AccessLog.handle(Request::new(Method::Get, "/health"), &next).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
