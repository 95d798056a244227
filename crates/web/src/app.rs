//! The application: global middlewares around every registered router.

use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error, info};
use wharf_http::handler::Handler;
use wharf_http::protocol::{Request, Response};

use crate::error::{Error, HttpException};
use crate::handler::RequestHandler;
use crate::middleware::{Middleware, compose};
use crate::router::{MethodHandler, Route, RouteOutcome, Router, RouterBuilder};

/// Anything that can be registered on an [`AppBuilder`].
pub enum Registrable {
    Route(Route),
    Router(Router),
    Middleware(Arc<dyn Middleware>),
}

impl fmt::Debug for Registrable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route(route) => f.debug_tuple("Route").field(route).finish(),
            Self::Router(router) => f.debug_tuple("Router").field(router).finish(),
            Self::Middleware(_) => f.write_str("Middleware(..)"),
        }
    }
}

impl From<Route> for Registrable {
    fn from(route: Route) -> Self {
        Self::Route(route)
    }
}

impl From<Router> for Registrable {
    fn from(router: Router) -> Self {
        Self::Router(router)
    }
}

impl From<Arc<dyn Middleware>> for Registrable {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        Self::Middleware(middleware)
    }
}

/// Tries each router in order. A method mismatch only becomes a 405 once
/// no router owns the path under the request's method.
struct RouterSet {
    routers: Vec<Router>,
}

#[async_trait]
impl RequestHandler for RouterSet {
    async fn invoke(&self, mut req: Request) -> Result<Response, Error> {
        let mut method_mismatch = false;

        for router in &self.routers {
            req = match router.resolve(req).await {
                RouteOutcome::Matched(result) => return result,
                RouteOutcome::MethodMismatch(req) => {
                    method_mismatch = true;
                    req
                }
                RouteOutcome::NoMatch(req) => req,
            };
        }

        if method_mismatch {
            Err(HttpException::method_not_allowed(req.path(), req.method()).into())
        } else {
            Err(HttpException::not_found(req.path(), req.method()).into())
        }
    }
}

pub struct App {
    pipeline: Arc<dyn RequestHandler>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App").finish_non_exhaustive()
    }
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder { base: Router::builder(""), routers: Vec::new(), middlewares: Vec::new() }
    }

    /// Runs the request through the pipeline. Never fails: errors and panics
    /// are rendered as responses.
    pub async fn resolve(&self, req: Request) -> Response {
        let method = req.method();
        let path = req.path().to_string();

        match AssertUnwindSafe(self.pipeline.invoke(req)).catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(Error::Internal(e))) => {
                error!(%method, %path, cause = %e, "handler failed");
                HttpException::internal(e.to_string()).to_response()
            }
            Ok(Err(e)) => {
                debug!(%method, %path, cause = %e, "request rejected");
                e.into_response()
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%method, %path, cause = message, "handler panicked");
                HttpException::internal(message).to_response()
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "Internal Server Error"
    }
}

#[async_trait]
impl Handler for App {
    type Error = Infallible;

    async fn call(&self, req: Request) -> Result<Response, Self::Error> {
        Ok(self.resolve(req).await)
    }
}

pub struct AppBuilder {
    base: RouterBuilder,
    routers: Vec<Router>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppBuilder")
            .field("base", &self.base)
            .field("routers", &self.routers)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

macro_rules! app_method_route {
    ($method:ident) => {
        pub fn $method<H: RequestHandler + 'static>(self, path: impl Into<String>, handler: H) -> Self {
            self.route(path, crate::router::$method(handler))
        }
    };
}

impl AppBuilder {
    pub fn register(mut self, registrable: impl Into<Registrable>) -> Self {
        match registrable.into() {
            Registrable::Route(route) => self.base = self.base.add(route),
            Registrable::Router(router) => self.routers.push(router),
            Registrable::Middleware(middleware) => self.middlewares.push(middleware),
        }
        self
    }

    /// Adds a route to the implicit base router.
    pub fn route(self, path: impl Into<String>, method_handler: MethodHandler) -> Self {
        self.register(Route::new(path, method_handler))
    }

    app_method_route!(get);
    app_method_route!(post);
    app_method_route!(put);
    app_method_route!(patch);
    app_method_route!(delete);
    app_method_route!(options);

    /// Adds a router. Routers are tried in registration order, after the
    /// base router.
    pub fn router(self, router: Router) -> Self {
        self.register(router)
    }

    /// Adds a global middleware. Global middlewares run before routing, in
    /// the order added.
    pub fn middleware<M: Middleware + 'static>(self, middleware: M) -> Self {
        self.register(Arc::new(middleware) as Arc<dyn Middleware>)
    }

    pub fn build(self) -> App {
        let mut routers = Vec::with_capacity(self.routers.len() + 1);
        routers.push(self.base.build());
        routers.extend(self.routers);

        for router in &routers {
            for (method, pattern) in router.routes() {
                info!(%method, pattern, "route registered");
            }
        }

        let terminal: Arc<dyn RequestHandler> = Arc::new(RouterSet { routers });
        App { pipeline: compose(&self.middlewares, terminal) }
    }
}
