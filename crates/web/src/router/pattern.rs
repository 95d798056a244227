//! Route patterns: `/users/{id}`, `/static/*`.

use std::fmt;

use tracing::warn;
use wharf_http::protocol::Params;

/// Path parameter name holding what a trailing `*` matched.
pub const WILDCARD_PARAM: &str = "wildcard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// Precedence bucket of a pattern, lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Specificity {
    Static,
    Parametrized,
    Wildcard,
}

/// A parsed endpoint pattern, prefix included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub(crate) fn parse(prefix: &str, endpoint: &str) -> Self {
        let raw = normalize(&join(prefix, endpoint)).to_string();

        let mut segments = Vec::new();
        for part in raw.split('/').filter(|s| !s.is_empty()) {
            if part == "*" {
                segments.push(Segment::Wildcard);
                break;
            }
            match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) => segments.push(Segment::Param(name.to_string())),
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        if segments.last() == Some(&Segment::Wildcard) && !raw.ends_with("/*") {
            warn!(pattern = %raw, "segments after '*' are ignored");
        }

        Self { raw, segments }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.raw
    }

    pub(crate) fn specificity(&self) -> Specificity {
        if self.segments.contains(&Segment::Wildcard) {
            Specificity::Wildcard
        } else if self.segments.iter().any(|s| matches!(s, Segment::Param(_))) {
            Specificity::Parametrized
        } else {
            Specificity::Static
        }
    }

    /// Matches a normalized path, returning the captured parameters.
    pub(crate) fn matches(&self, path: &str) -> Option<Params> {
        let mut parts = path.split('/').filter(|s| !s.is_empty());
        let mut params = Params::new();

        for segment in &self.segments {
            match segment {
                Segment::Wildcard => {
                    let rest: Vec<&str> = parts.collect();
                    params.insert(WILDCARD_PARAM, rest.join("/"));
                    return Some(params);
                }
                Segment::Literal(literal) => {
                    if parts.next()? != literal.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.next()?;
                    params.insert(name.as_str(), value);
                }
            }
        }

        match parts.next() {
            Some(_) => None,
            None => Some(params),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Strips one trailing `/` unless the path is the root.
pub fn normalize(path: &str) -> &str {
    if path.len() > 1 { path.strip_suffix('/').unwrap_or(path) } else { path }
}

fn join(prefix: &str, endpoint: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    format!("{prefix}/{endpoint}")
}
