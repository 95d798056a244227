use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use wharf_http::protocol::{Authorization, Request, Response};

use crate::error::{Error, HttpException};
use crate::handler::RequestHandler;
use crate::middleware::Middleware;

type Predicate = dyn Fn(Option<&Authorization>) -> bool + Send + Sync;

/// How a [`Guard`] decides whether the credentials are acceptable.
#[derive(Clone)]
pub enum GuardStrategy {
    Bearer(String),
    Basic { username: String, password: String },
    ApiKey(String),
    /// Passes if any inner strategy passes.
    Any(Vec<GuardStrategy>),
    /// Passes if every inner strategy passes.
    All(Vec<GuardStrategy>),
    Custom(Arc<Predicate>),
}

impl fmt::Debug for GuardStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(..)"),
            Self::Basic { username, .. } => f.debug_struct("Basic").field("username", username).finish_non_exhaustive(),
            Self::ApiKey(_) => f.write_str("ApiKey(..)"),
            Self::Any(strategies) => f.debug_tuple("Any").field(strategies).finish(),
            Self::All(strategies) => f.debug_tuple("All").field(strategies).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl GuardStrategy {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Option<&Authorization>) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn check(&self, auth: Option<&Authorization>) -> bool {
        match (self, auth) {
            (Self::Bearer(expected), Some(Authorization::Bearer(token))) => expected == token,
            (Self::Basic { username, password }, Some(Authorization::Basic { username: u, password: p })) => {
                username == u && password == p
            }
            (Self::ApiKey(expected), Some(Authorization::ApiKey(key))) => expected == key,
            (Self::Any(strategies), auth) => strategies.iter().any(|s| s.check(auth)),
            (Self::All(strategies), auth) => strategies.iter().all(|s| s.check(auth)),
            (Self::Custom(predicate), auth) => predicate(auth),
            _ => false,
        }
    }
}

/// Answers 401 unless the request's `Authorization` header satisfies the
/// strategy.
#[derive(Debug, Clone)]
pub struct Guard {
    strategy: GuardStrategy,
    message: String,
}

impl Guard {
    pub fn new(strategy: GuardStrategy) -> Self {
        Self { strategy, message: "Unauthorized".to_string() }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

#[async_trait]
impl Middleware for Guard {
    async fn handle(&self, req: Request, next: &dyn RequestHandler) -> Result<Response, Error> {
        if !self.strategy.check(req.authorization().as_ref()) {
            return Err(HttpException::unauthorized(self.message.as_str()).into());
        }
        next.invoke(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use http::StatusCode;
    use wharf_http::protocol::Method;

    fn with_auth(value: &str) -> Request {
        Request::new(Method::Get, "/admin").with_header("Authorization", value).unwrap()
    }

    #[tokio::test]
    async fn test_bearer_guard() {
        let guard = Guard::new(GuardStrategy::Bearer("secret".to_string()));
        let next = handler_fn(|_req: Request| async { Ok(Response::empty()) });

        assert!(guard.handle(with_auth("Bearer secret"), &next).await.is_ok());

        let Err(Error::Http(e)) = guard.handle(with_auth("Bearer wrong"), &next).await else {
            panic!("expected 401");
        };
        assert_eq!(e.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(e.message(), "Unauthorized");

        assert!(guard.handle(Request::new(Method::Get, "/admin"), &next).await.is_err());
    }

    #[test]
    fn test_composite_strategies() {
        let basic = Authorization::Basic { username: "ann".into(), password: "pw".into() };
        let key = Authorization::ApiKey("k1".into());

        let any = GuardStrategy::Any(vec![
            GuardStrategy::ApiKey("k1".into()),
            GuardStrategy::Basic { username: "ann".into(), password: "pw".into() },
        ]);
        assert!(any.check(Some(&basic)));
        assert!(any.check(Some(&key)));
        assert!(!any.check(None));

        let all = GuardStrategy::All(vec![
            GuardStrategy::ApiKey("k1".into()),
            GuardStrategy::custom(|auth| auth.is_some()),
        ]);
        assert!(all.check(Some(&key)));
        assert!(!all.check(Some(&basic)));
    }
}
