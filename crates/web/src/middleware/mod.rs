//! Middleware and the chain builder.
//!
//! A [`Middleware`] receives the request together with the rest of the
//! pipeline and decides whether, and how, to call it. [`compose`] folds an
//! ordered list right to left around a terminal handler, so the first
//! middleware in the list runs first.

mod access_log;
mod body_limit;
mod guard;
mod rate_limit;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use wharf_http::protocol::{Request, Response};

use crate::error::Error;
use crate::handler::RequestHandler;

pub use access_log::AccessLog;
pub use body_limit::{BodyLimit, DEFAULT_BODY_LIMIT};
pub use guard::{Guard, GuardStrategy};
pub use rate_limit::RateLimit;

#[async_trait]
pub trait Middleware: Send + Sync {
    /// Handles `req`, calling `next` zero or one time.
    async fn handle(&self, req: Request, next: &dyn RequestHandler) -> Result<Response, Error>;
}

/// One link of a composed pipeline.
struct Chained {
    middleware: Arc<dyn Middleware>,
    next: Arc<dyn RequestHandler>,
}

impl fmt::Debug for Chained {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chained").finish_non_exhaustive()
    }
}

#[async_trait]
impl RequestHandler for Chained {
    async fn invoke(&self, req: Request) -> Result<Response, Error> {
        self.middleware.handle(req, self.next.as_ref()).await
    }
}

/// Builds `m1(m2(...mn(terminal)))` from `[m1, m2, ..., mn]`.
///
/// An empty list returns `terminal` itself.
pub fn compose(middlewares: &[Arc<dyn Middleware>], terminal: Arc<dyn RequestHandler>) -> Arc<dyn RequestHandler> {
    middlewares.iter().rev().fold(terminal, |next, middleware| {
        Arc::new(Chained { middleware: Arc::clone(middleware), next }) as Arc<dyn RequestHandler>
    })
}

/// A middleware backed by a function.
pub struct MiddlewareFn<F> {
    f: F,
}

impl<F> fmt::Debug for MiddlewareFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareFn").finish_non_exhaustive()
    }
}

/// Adapts a function into a [`Middleware`].
///
/// ```
/// use wharf_web::middleware::middleware_fn;
///
/// let tag = middleware_fn(|req, next| {
///     Box::pin(async move {
///         next.invoke(req).await.map(|mut response| {
///             response.add_header("X-Served-By", "wharf");
///             response
///         })
///     })
/// });
/// # let _ = tag;
/// ```
pub fn middleware_fn<F>(f: F) -> MiddlewareFn<F>
where
    F: for<'a> Fn(Request, &'a dyn RequestHandler) -> BoxFuture<'a, Result<Response, Error>> + Send + Sync,
{
    MiddlewareFn { f }
}

#[async_trait]
impl<F> Middleware for MiddlewareFn<F>
where
    F: for<'a> Fn(Request, &'a dyn RequestHandler) -> BoxFuture<'a, Result<Response, Error>> + Send + Sync,
{
    async fn handle(&self, req: Request, next: &dyn RequestHandler) -> Result<Response, Error> {
        (self.f)(req, next).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpException;
    use crate::handler::{MockRequestHandler, handler_fn};
    use http::StatusCode;
    use std::sync::Mutex;
    use wharf_http::protocol::Method;

    struct Record {
        name: &'static str,
        trace: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Middleware for Record {
        async fn handle(&self, req: Request, next: &dyn RequestHandler) -> Result<Response, Error> {
            self.trace.lock().unwrap().push(format!("{} in", self.name));
            let response = next.invoke(req).await;
            self.trace.lock().unwrap().push(format!("{} out", self.name));
            response
        }
    }

    struct Deny;

    #[async_trait]
    impl Middleware for Deny {
        async fn handle(&self, _req: Request, _next: &dyn RequestHandler) -> Result<Response, Error> {
            Err(HttpException::forbidden("denied").into())
        }
    }

    #[tokio::test]
    async fn test_compose_runs_first_middleware_first() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let middlewares: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Record { name: "m1", trace: Arc::clone(&trace) }),
            Arc::new(Record { name: "m2", trace: Arc::clone(&trace) }),
        ];
        let terminal_trace = Arc::clone(&trace);
        let terminal: Arc<dyn RequestHandler> = Arc::new(handler_fn(move |_req: Request| {
            let trace = Arc::clone(&terminal_trace);
            async move {
                trace.lock().unwrap().push("handler".to_string());
                Ok(Response::empty())
            }
        }));

        let pipeline = compose(&middlewares, terminal);
        pipeline.invoke(Request::new(Method::Get, "/")).await.unwrap();

        assert_eq!(*trace.lock().unwrap(), vec!["m1 in", "m2 in", "handler", "m2 out", "m1 out"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_next() {
        let mut terminal = MockRequestHandler::new();
        terminal.expect_invoke().never();

        let middlewares: Vec<Arc<dyn Middleware>> = vec![Arc::new(Deny)];
        let pipeline = compose(&middlewares, Arc::new(terminal));

        let result = pipeline.invoke(Request::new(Method::Get, "/")).await;
        assert!(matches!(result, Err(Error::Http(e)) if e.status() == StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn test_empty_chain_is_terminal() {
        let mut terminal = MockRequestHandler::new();
        terminal.expect_invoke().times(1).returning(|_| Ok(Response::empty()));

        let pipeline = compose(&[], Arc::new(terminal));

        let response = pipeline.invoke(Request::new(Method::Get, "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_middleware_fn() {
        let tag: Arc<dyn Middleware> = Arc::new(middleware_fn(|req, next| {
            Box::pin(async move {
                next.invoke(req).await.map(|mut response| {
                    response.add_header("X-Served-By", "wharf");
                    response
                })
            })
        }));
        let terminal: Arc<dyn RequestHandler> = Arc::new(handler_fn(|_req: Request| async { Ok(Response::empty()) }));

        let response = compose(&[tag], terminal).invoke(Request::new(Method::Get, "/")).await.unwrap();
        assert_eq!(response.header("x-served-by"), Some("wharf"));
    }
}
