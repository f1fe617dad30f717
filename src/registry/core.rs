use crate::shape::Shape;
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::info;

/// Allowed placeholder names: `:id`, `:user_id`, `:v2`, ...
static PLACEHOLDER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z][A-Za-z0-9_]*$").expect("placeholder name regex"));

/// Failure raised at registration time.
///
/// All contract-level mistakes surface here, at startup, so the matcher can
/// stay deterministic and side-effect-free at request time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate route registered for `{method} {pattern}`")]
    DuplicateRoute { method: Method, pattern: String },
    #[error("placeholder `:{name}` appears more than once in `{pattern}`")]
    DuplicatePlaceholder { pattern: String, name: String },
    #[error("route `{method} {pattern}` is ambiguous with already registered `{existing}`")]
    AmbiguousRoute {
        method: Method,
        pattern: String,
        existing: String,
    },
    #[error("invalid path pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// One segment of a compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// Named variable segment, bound to the raw path segment at match time.
    Placeholder(Arc<str>),
}

/// Route declaration as written by the contract author.
///
/// Shapes for params, query, and payload are optional — a route with no
/// declared query shape ignores the query string entirely. The output shape
/// is always declared; every route produces a response body.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub path_pattern: String,
    pub handler_name: String,
    pub params: Option<Shape>,
    pub query: Option<Shape>,
    pub payload: Option<Shape>,
    pub output: Shape,
}

impl Route {
    #[must_use]
    pub fn new(
        method: Method,
        path_pattern: impl Into<String>,
        handler_name: impl Into<String>,
        output: Shape,
    ) -> Self {
        Self {
            method,
            path_pattern: path_pattern.into(),
            handler_name: handler_name.into(),
            params: None,
            query: None,
            payload: None,
            output,
        }
    }

    #[must_use]
    pub fn params(mut self, shape: Shape) -> Self {
        self.params = Some(shape);
        self
    }

    #[must_use]
    pub fn query(mut self, shape: Shape) -> Self {
        self.query = Some(shape);
        self
    }

    #[must_use]
    pub fn payload(mut self, shape: Shape) -> Self {
        self.payload = Some(shape);
        self
    }
}

/// Registered route with its pattern compiled into segments.
///
/// Constructed only by [`Registry::register`]; immutable for the process
/// lifetime afterwards.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub method: Method,
    pub path_pattern: String,
    pub handler_name: String,
    pub params: Option<Shape>,
    pub query: Option<Shape>,
    pub payload: Option<Shape>,
    pub output: Shape,
    pub(crate) segments: Vec<Segment>,
}

impl RouteSpec {
    /// Compiled segments of the path pattern, in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Holds the full route catalog. Populated before any request is served,
/// never mutated after; reads need no synchronization.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    routes: Vec<Arc<RouteSpec>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route, compiling its pattern and enforcing the
    /// registration-time invariants.
    pub fn register(&mut self, route: Route) -> Result<(), RegistryError> {
        let segments = compile_pattern(&route.path_pattern)?;

        for existing in &self.routes {
            if existing.method != route.method {
                continue;
            }
            match overlap(&existing.segments, &segments) {
                Overlap::Identical => {
                    return Err(RegistryError::DuplicateRoute {
                        method: route.method,
                        pattern: route.path_pattern,
                    });
                }
                Overlap::Ambiguous => {
                    return Err(RegistryError::AmbiguousRoute {
                        method: route.method,
                        pattern: route.path_pattern,
                        existing: existing.path_pattern.clone(),
                    });
                }
                Overlap::Disjoint => {}
            }
        }

        info!(
            method = %route.method,
            pattern = %route.path_pattern,
            handler_name = %route.handler_name,
            routes_count = self.routes.len() + 1,
            "route registered"
        );

        self.routes.push(Arc::new(RouteSpec {
            method: route.method,
            path_pattern: route.path_pattern,
            handler_name: route.handler_name,
            params: route.params,
            query: route.query,
            payload: route.payload,
            output: route.output,
            segments,
        }));
        Ok(())
    }

    /// All registered routes in registration order. This is the projection
    /// surface for client-binding generation.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteSpec>> {
        self.routes.iter()
    }

    /// Routes of one method, in registration order (consumed by the matcher).
    pub fn routes_for<'a>(
        &'a self,
        method: &'a Method,
    ) -> impl Iterator<Item = &'a Arc<RouteSpec>> + 'a {
        self.routes.iter().filter(move |r| &r.method == method)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Split a pattern like `/users/:id` into segments, rejecting malformed
/// patterns and repeated placeholder names.
fn compile_pattern(pattern: &str) -> Result<Vec<Segment>, RegistryError> {
    let invalid = |reason: &str| RegistryError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if !pattern.starts_with('/') {
        return Err(invalid("pattern must start with `/`"));
    }

    if pattern == "/" {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    let mut names: Vec<&str> = Vec::new();
    for part in pattern[1..].split('/') {
        if part.is_empty() {
            return Err(invalid("empty path segment"));
        }
        if let Some(name) = part.strip_prefix(':') {
            if !PLACEHOLDER_NAME.is_match(name) {
                return Err(invalid("placeholder name must be alphanumeric"));
            }
            if names.contains(&name) {
                return Err(RegistryError::DuplicatePlaceholder {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            names.push(name);
            segments.push(Segment::Placeholder(Arc::from(name)));
        } else {
            segments.push(Segment::Literal(part.to_string()));
        }
    }
    Ok(segments)
}

enum Overlap {
    Identical,
    Ambiguous,
    Disjoint,
}

/// Two same-method patterns overlap if some concrete path could match both:
/// equal segment counts and every position compatible (equal literals, or a
/// placeholder on either side).
fn overlap(a: &[Segment], b: &[Segment]) -> Overlap {
    if a.len() != b.len() {
        return Overlap::Disjoint;
    }
    let mut identical = true;
    for (lhs, rhs) in a.iter().zip(b) {
        match (lhs, rhs) {
            (Segment::Literal(l), Segment::Literal(r)) => {
                if l != r {
                    return Overlap::Disjoint;
                }
            }
            (Segment::Placeholder(_), Segment::Placeholder(_)) => {}
            _ => identical = false,
        }
    }
    if identical {
        Overlap::Identical
    } else {
        Overlap::Ambiguous
    }
}
