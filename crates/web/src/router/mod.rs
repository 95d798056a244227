//! Prefix scoped route tables.
//!
//! A [`Router`] owns the routes registered under one path prefix and the
//! middlewares that wrap them. Routes are matched by precedence: static
//! patterns first, then patterns with `{param}` segments, then patterns
//! ending in `*`. Within one bucket registration order decides and the first
//! full match wins.

mod pattern;

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{trace, warn};
use wharf_http::protocol::{Method, Params, Request, Response};

use crate::error::Error;
use crate::handler::RequestHandler;
use crate::middleware::{Middleware, compose};

use pattern::Pattern;

pub use pattern::{WILDCARD_PARAM, normalize};

/// A handler bound to one method, waiting for its path.
pub struct MethodHandler {
    method: Method,
    handler: Arc<dyn RequestHandler>,
}

impl fmt::Debug for MethodHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodHandler").field("method", &self.method).finish_non_exhaustive()
    }
}

impl MethodHandler {
    pub fn new<H: RequestHandler + 'static>(method: Method, handler: H) -> Self {
        Self { method, handler: Arc::new(handler) }
    }

    pub fn method(&self) -> Method {
        self.method
    }
}

macro_rules! method_handler {
    ($method:ident, $variant:ident) => {
        pub fn $method<H: RequestHandler + 'static>(handler: H) -> MethodHandler {
            MethodHandler::new(Method::$variant, handler)
        }
    };
}

method_handler!(get, Get);
method_handler!(post, Post);
method_handler!(put, Put);
method_handler!(patch, Patch);
method_handler!(delete, Delete);
method_handler!(options, Options);

/// One `(method, path, handler)` binding.
#[derive(Debug)]
pub struct Route {
    path: String,
    method_handler: MethodHandler,
}

impl Route {
    pub fn new(path: impl Into<String>, method_handler: MethodHandler) -> Self {
        Self { path: path.into(), method_handler }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> Method {
        self.method_handler.method
    }
}

/// A route after registration: full pattern and its composed pipeline.
struct Entry {
    method: Method,
    pattern: Pattern,
    handler: Arc<dyn RequestHandler>,
}

/// Outcome of looking up one method and path.
pub enum RouteMatch<'router> {
    Found { handler: &'router dyn RequestHandler, params: Params },
    /// Some pattern matched the path, but under other methods only.
    MethodMismatch,
    NotFound,
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found { params, .. } => f.debug_struct("Found").field("params", params).finish_non_exhaustive(),
            Self::MethodMismatch => f.write_str("MethodMismatch"),
            Self::NotFound => f.write_str("NotFound"),
        }
    }
}

/// Outcome of [`Router::resolve`]. Unmatched requests are handed back so the
/// caller can try elsewhere.
#[derive(Debug)]
pub enum RouteOutcome {
    Matched(Result<Response, Error>),
    MethodMismatch(Request),
    NoMatch(Request),
}

pub struct Router {
    prefix: String,
    entries: Vec<Entry>,
    ordered: OnceCell<Vec<usize>>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("prefix", &self.prefix).field("routes", &self.entries.len()).finish()
    }
}

impl Router {
    /// Starts a router whose routes all live under `prefix`.
    pub fn builder(prefix: impl Into<String>) -> RouterBuilder {
        RouterBuilder { prefix: prefix.into(), routes: Vec::new(), middlewares: Vec::new() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Registered `(method, pattern)` pairs in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (Method, &str)> {
        self.entries.iter().map(|entry| (entry.method, entry.pattern.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry indices in precedence order, computed on first use.
    fn ordered(&self) -> &[usize] {
        self.ordered.get_or_init(|| {
            let mut indices: Vec<usize> = (0..self.entries.len()).collect();
            indices.sort_by_key(|&index| self.entries[index].pattern.specificity());
            indices
        })
    }

    /// Looks up `method` and `path`. A trailing `/` on `path` is ignored.
    pub fn at(&self, method: Method, path: &str) -> RouteMatch<'_> {
        let path = normalize(path);
        let mut method_mismatch = false;

        for &index in self.ordered() {
            let entry = &self.entries[index];
            let Some(params) = entry.pattern.matches(path) else {
                continue;
            };
            if entry.method == method {
                trace!(%method, path, pattern = %entry.pattern, "route matched");
                return RouteMatch::Found { handler: entry.handler.as_ref(), params };
            }
            method_mismatch = true;
        }

        if method_mismatch { RouteMatch::MethodMismatch } else { RouteMatch::NotFound }
    }

    /// Runs the matching route's pipeline with its path parameters attached.
    pub async fn resolve(&self, mut req: Request) -> RouteOutcome {
        match self.at(req.method(), req.path()) {
            RouteMatch::Found { handler, params } => {
                req.set_path_params(params);
                RouteOutcome::Matched(handler.invoke(req).await)
            }
            RouteMatch::MethodMismatch => RouteOutcome::MethodMismatch(req),
            RouteMatch::NotFound => RouteOutcome::NoMatch(req),
        }
    }
}

pub struct RouterBuilder {
    prefix: String,
    routes: Vec<Route>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("prefix", &self.prefix)
            .field("routes", &self.routes)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

impl RouterBuilder {
    pub fn route(self, path: impl Into<String>, method_handler: MethodHandler) -> Self {
        self.add(Route::new(path, method_handler))
    }

    pub fn add(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Wraps every route of this router. Middlewares run in the order added.
    pub fn middleware<M: Middleware + 'static>(self, middleware: M) -> Self {
        self.shared_middleware(Arc::new(middleware))
    }

    pub fn shared_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn build(self) -> Router {
        let mut entries: Vec<Entry> = Vec::with_capacity(self.routes.len());

        for route in self.routes {
            let pattern = Pattern::parse(&self.prefix, &route.path);
            let method = route.method_handler.method;

            if entries.iter().any(|entry| entry.method == method && entry.pattern == pattern) {
                warn!(%method, pattern = %pattern, "duplicate route, the first registration wins");
            }

            let handler = compose(&self.middlewares, route.method_handler.handler);
            entries.push(Entry { method, pattern, handler });
        }

        Router { prefix: self.prefix, entries, ordered: OnceCell::new() }
    }
}
