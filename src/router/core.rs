use crate::registry::{Registry, RouteSpec, Segment};
use http::Method;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum number of path parameters before heap allocation.
/// Most REST paths carry at most a handful of placeholders.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the match hot path.
///
/// Names are `Arc<str>` because they come from the static route table and
/// cloning them is an atomic increment; values are per-request strings cut
/// out of the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of successfully matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route contract (shared, never cloned deeply).
    pub route: Arc<RouteSpec>,
    /// Placeholder bindings extracted from the path (`:id` -> `"123"`).
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name.
    #[inline]
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Matches incoming method + path against the registry's route catalog.
///
/// Holds the registry behind an `Arc`; the catalog is fully populated before
/// any request is served, so matching needs no synchronization.
#[derive(Debug, Clone)]
pub struct Matcher {
    registry: Arc<Registry>,
}

impl Matcher {
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Match a request to a route and bind its placeholders.
    ///
    /// The path must already be percent-decoded (the transport's job).
    /// Placeholder segments match any non-empty segment; literal segments
    /// must be equal position-for-position; segment counts must agree.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "route match attempt");

        let segments: Vec<&str> = split_path(path);

        for route in self.registry.routes_for(method) {
            if let Some(params) = bind(route.segments(), &segments) {
                debug!(
                    method = %method,
                    path = %path,
                    route_pattern = %route.path_pattern,
                    handler_name = %route.handler_name,
                    path_params = ?params,
                    "route matched"
                );
                return Some(RouteMatch {
                    route: Arc::clone(route),
                    path_params: params,
                });
            }
        }

        warn!(method = %method, path = %path, "no route matched");
        None
    }
}

/// Split a concrete request path into segments. `/` has no segments;
/// a trailing slash produces a trailing empty segment, which no placeholder
/// or literal accepts.
fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn bind(pattern: &[Segment], segments: &[&str]) -> Option<ParamVec> {
    if pattern.len() != segments.len() {
        return None;
    }
    let mut params = ParamVec::new();
    for (expected, actual) in pattern.iter().zip(segments) {
        match expected {
            Segment::Literal(lit) => {
                if lit != actual {
                    return None;
                }
            }
            Segment::Placeholder(name) => {
                if actual.is_empty() {
                    return None;
                }
                params.push((Arc::clone(name), (*actual).to_string()));
            }
        }
    }
    Some(params)
}
