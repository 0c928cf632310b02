//! High-level router API.

use http::Method;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::node::{parse_pattern, Node};
use crate::params::Params;

/// Outcome of matching a request against the router.
#[derive(Debug)]
pub enum Match<'a, T> {
    /// A route serves this method and path.
    Found {
        /// The routed value.
        value: &'a T,
        /// Captured path parameters.
        params: Params,
        /// The pattern the route was registered with.
        pattern: &'a str,
    },
    /// The path is known but not for this method.
    MethodNotAllowed {
        /// Methods the path does serve.
        allowed: Vec<Method>,
    },
    /// Nothing is registered for this path.
    NotFound,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    pattern: String,
    value: T,
}

/// Radix tree router mapping `(method, path pattern)` pairs to values.
///
/// Registration is strict: a method and pattern pair can be inserted once, and
/// a second insert fails with [`RouteError::Duplicate`].
///
/// # Example
///
/// ```rust
/// use cfgate_router::{Match, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(Method::GET, "/v3/apps/{guid}", "get-app").unwrap();
///
/// match router.at(&Method::GET, "/v3/apps/abc") {
///     Match::Found { value, params, .. } => {
///         assert_eq!(*value, "get-app");
///         assert_eq!(params.get("guid"), Some("abc"));
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<Entry<T>>,
    len: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            len: 0,
        }
    }

    /// Registers `value` for `method` on `pattern`.
    ///
    /// Patterns use `{name}` for single-segment parameters and a trailing
    /// `*name` for a catch-all.
    pub fn insert(&mut self, method: Method, pattern: &str, value: T) -> Result<(), RouteError> {
        let segments = parse_pattern(pattern)?;
        let entry = Entry {
            pattern: pattern.to_string(),
            value,
        };
        self.root.insert(pattern, &segments, method, entry)?;
        self.len += 1;
        Ok(())
    }

    /// Matches a concrete request path.
    #[must_use]
    pub fn at(&self, method: &Method, path: &str) -> Match<'_, T> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();

        let Some(methods) = self.root.find(&segments, &mut params) else {
            return Match::NotFound;
        };

        match methods.get(method) {
            Some(entry) => Match::Found {
                value: &entry.value,
                params,
                pattern: &entry.pattern,
            },
            None => Match::MethodNotAllowed {
                allowed: allowed_methods(methods),
            },
        }
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn allowed_methods<T>(methods: &MethodRouter<T>) -> Vec<Method> {
    methods.allowed().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found<'a, T>(m: Match<'a, T>) -> (&'a T, Params) {
        match m {
            Match::Found { value, params, .. } => (value, params),
            other => panic!("expected a match, got {:?}", std::mem::discriminant(&other)),
        }
    }

    #[test]
    fn test_new_router_is_empty() {
        let router: Router<()> = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_static_and_param_routes() {
        let mut router = Router::new();
        router.insert(Method::GET, "/v3/apps", "list").unwrap();
        router.insert(Method::GET, "/v3/apps/{guid}", "get").unwrap();
        router.insert(Method::POST, "/v3/apps", "create").unwrap();
        assert_eq!(router.len(), 3);

        let (value, _) = found(router.at(&Method::GET, "/v3/apps"));
        assert_eq!(*value, "list");

        let (value, params) = found(router.at(&Method::GET, "/v3/apps/a-1"));
        assert_eq!(*value, "get");
        assert_eq!(params.get("guid"), Some("a-1"));

        let (value, _) = found(router.at(&Method::POST, "/v3/apps"));
        assert_eq!(*value, "create");
    }

    #[test]
    fn test_found_reports_pattern() {
        let mut router = Router::new();
        router.insert(Method::GET, "/v3/jobs/{guid}", 1).unwrap();

        match router.at(&Method::GET, "/v3/jobs/app.delete~x") {
            Match::Found { pattern, .. } => assert_eq!(pattern, "/v3/jobs/{guid}"),
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut router = Router::new();
        router.insert(Method::GET, "/v3/apps/{guid}", 1).unwrap();

        let err = router.insert(Method::GET, "/v3/apps/{guid}/", 2).unwrap_err();
        assert_eq!(
            err,
            RouteError::Duplicate {
                method: Method::GET,
                pattern: "/v3/apps/{guid}/".to_string(),
            }
        );
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_same_pattern_different_methods() {
        let mut router = Router::new();
        router.insert(Method::GET, "/v3/apps/{guid}", 1).unwrap();
        router.insert(Method::DELETE, "/v3/apps/{guid}", 2).unwrap();

        let (value, _) = found(router.at(&Method::DELETE, "/v3/apps/x"));
        assert_eq!(*value, 2);
    }

    #[test]
    fn test_method_not_allowed() {
        let mut router = Router::new();
        router.insert(Method::GET, "/v3/apps", 1).unwrap();

        match router.at(&Method::POST, "/v3/apps") {
            Match::MethodNotAllowed { allowed } => assert_eq!(allowed, vec![Method::GET]),
            _ => panic!("expected method not allowed"),
        }
    }

    #[test]
    fn test_not_found() {
        let mut router = Router::new();
        router.insert(Method::GET, "/v3/apps", 1).unwrap();

        assert!(matches!(router.at(&Method::GET, "/v3/spaces"), Match::NotFound));
        assert!(matches!(router.at(&Method::GET, "/v3/apps/x/y"), Match::NotFound));
    }

    #[test]
    fn test_wildcard() {
        let mut router = Router::new();
        router.insert(Method::GET, "/api/v1/read/*rest", "read").unwrap();

        let (_, params) = found(router.at(&Method::GET, "/api/v1/read/a/b"));
        assert_eq!(params.get("rest"), Some("a/b"));
    }

    #[test]
    fn test_trailing_slash_matches() {
        let mut router = Router::new();
        router.insert(Method::GET, "/v3", "root").unwrap();

        let (value, _) = found(router.at(&Method::GET, "/v3/"));
        assert_eq!(*value, "root");
    }
}
