//! Fixtures shared by the benchmarks.

/// A raw request frame used as decoder input.
#[derive(Debug, Copy, Clone)]
pub struct RequestFixture {
    name: &'static str,
    payload: &'static str,
}

impl RequestFixture {
    pub const fn new(name: &'static str, payload: &'static str) -> Self {
        Self { name, payload }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn payload(&self) -> &'static str {
        self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Which precedence bucket a route lookup is expected to land in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteKind {
    Static,
    Parametrized,
    Wildcard,
    Missing,
}

/// One path to resolve against the benchmark route table.
#[derive(Debug, Copy, Clone)]
pub struct RouteCase {
    kind: RouteKind,
    path: &'static str,
}

impl RouteCase {
    pub const fn new(kind: RouteKind, path: &'static str) -> Self {
        Self { kind, path }
    }

    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn label(&self) -> String {
        format!("{:?}:{}", self.kind, self.path)
    }
}

/// Endpoints registered by the router benchmark, in registration order.
pub const ENDPOINTS: &[&str] = &[
    "/files/*",
    "/users/{id}/posts/{post}",
    "/users/{id}",
    "/users",
    "/users/me",
    "/orders/{id}/items",
    "/orders",
    "/health",
];

pub const ROUTE_CASES: &[RouteCase] = &[
    RouteCase::new(RouteKind::Static, "/health"),
    RouteCase::new(RouteKind::Static, "/users/me"),
    RouteCase::new(RouteKind::Parametrized, "/users/42/posts/7"),
    RouteCase::new(RouteKind::Wildcard, "/files/css/site.css"),
    RouteCase::new(RouteKind::Missing, "/nowhere/at/all"),
];
