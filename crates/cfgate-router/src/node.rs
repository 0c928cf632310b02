//! Radix tree node.
//!
//! Each node owns one path segment. Children are split by kind so that
//! matching can try them in priority order: static, then parameter, then
//! wildcard.

use http::Method;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::params::Params;

/// What a pattern segment matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    /// Literal text.
    Static(String),
    /// `{name}`: exactly one path segment.
    Param(String),
    /// `*name`: the rest of the path. Must be last.
    Wildcard(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    name: String,
    methods: Option<MethodRouter<T>>,
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
    wildcard_child: Option<Box<Node<T>>>,
}

/// Splits a pattern into typed segments, ignoring empty segments so that
/// `/v3/apps/` and `/v3/apps` share a node.
pub(crate) fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RouteError> {
    if !pattern.starts_with('/') {
        return Err(RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "pattern must start with '/'",
        });
    }

    let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(raw.len());

    for (index, segment) in raw.iter().enumerate() {
        if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if name.is_empty() {
                return Err(RouteError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: "parameter name must not be empty",
                });
            }
            segments.push(Segment::Param(name.to_string()));
        } else if let Some(name) = segment.strip_prefix('*') {
            if index + 1 != raw.len() {
                return Err(RouteError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: "wildcard must be the last segment",
                });
            }
            segments.push(Segment::Wildcard(name.to_string()));
        } else {
            segments.push(Segment::Static((*segment).to_string()));
        }
    }

    Ok(segments)
}

impl<T> Node<T> {
    fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    pub(crate) fn root() -> Self {
        Self::with_name("")
    }

    pub(crate) fn insert(
        &mut self,
        pattern: &str,
        segments: &[Segment],
        method: Method,
        value: T,
    ) -> Result<(), RouteError> {
        let Some((head, rest)) = segments.split_first() else {
            return self
                .methods
                .get_or_insert_with(MethodRouter::new)
                .insert(method.clone(), value)
                .map_err(|_| RouteError::Duplicate {
                    method,
                    pattern: pattern.to_string(),
                });
        };

        let child = match head {
            Segment::Static(text) => {
                match self
                    .static_children
                    .binary_search_by(|c| c.name.as_str().cmp(text.as_str()))
                {
                    Ok(i) => &mut self.static_children[i],
                    Err(i) => {
                        self.static_children.insert(i, Node::with_name(text.clone()));
                        &mut self.static_children[i]
                    }
                }
            }
            Segment::Param(name) => {
                Self::named_child(&mut self.param_child, name, pattern)?
            }
            Segment::Wildcard(name) => {
                Self::named_child(&mut self.wildcard_child, name, pattern)?
            }
        };

        child.insert(pattern, rest, method, value)
    }

    fn named_child<'a>(
        slot: &'a mut Option<Box<Node<T>>>,
        name: &str,
        pattern: &str,
    ) -> Result<&'a mut Node<T>, RouteError> {
        let child: &mut Node<T> = slot.get_or_insert_with(|| Box::new(Node::with_name(name)));
        if child.name != name {
            return Err(RouteError::ParamConflict {
                pattern: pattern.to_string(),
                existing: child.name.clone(),
                found: name.to_string(),
            });
        }
        Ok(child)
    }

    /// Finds the method table for `segments`, recording captures in `params`.
    pub(crate) fn find<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((head, rest)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Ok(i) = self
            .static_children
            .binary_search_by(|c| c.name.as_str().cmp(*head))
        {
            if let Some(found) = self.static_children[i].find(rest, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            let mark = params.len();
            params.push(child.name.clone(), *head);
            if let Some(found) = child.find(rest, params) {
                return Some(found);
            }
            params.truncate(mark);
        }

        if let Some(child) = &self.wildcard_child {
            if let Some(methods) = &child.methods {
                params.push(child.name.clone(), segments.join("/"));
                return Some(methods);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(root: &'a Node<&'static str>, path: &str) -> Option<(&'a MethodRouter<&'static str>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        root.find(&segments, &mut params).map(|m| (m, params))
    }

    fn insert(root: &mut Node<&'static str>, pattern: &str, value: &'static str) -> Result<(), RouteError> {
        let segments = parse_pattern(pattern)?;
        root.insert(pattern, &segments, Method::GET, value)
    }

    #[test]
    fn test_parse_pattern_kinds() {
        let segments = parse_pattern("/v3/apps/{guid}/*rest").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Static("v3".to_string()),
                Segment::Static("apps".to_string()),
                Segment::Param("guid".to_string()),
                Segment::Wildcard("rest".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_pattern_rejects_relative() {
        assert!(matches!(
            parse_pattern("v3/apps"),
            Err(RouteError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_parse_pattern_rejects_inner_wildcard() {
        assert!(matches!(
            parse_pattern("/files/*path/more"),
            Err(RouteError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_static_beats_param() {
        let mut root = Node::root();
        insert(&mut root, "/v3/apps/{guid}", "get-app").unwrap();
        insert(&mut root, "/v3/apps/summary", "summary").unwrap();

        let (methods, params) = find(&root, "/v3/apps/summary").unwrap();
        assert_eq!(methods.get(&Method::GET), Some(&"summary"));
        assert!(params.is_empty());

        let (methods, params) = find(&root, "/v3/apps/abc").unwrap();
        assert_eq!(methods.get(&Method::GET), Some(&"get-app"));
        assert_eq!(params.get("guid"), Some("abc"));
    }

    #[test]
    fn test_param_backtracking_drops_stale_capture() {
        let mut root = Node::root();
        insert(&mut root, "/v3/{kind}/list", "by-kind").unwrap();
        insert(&mut root, "/v3/*rest", "fallback").unwrap();

        let (methods, params) = find(&root, "/v3/apps/other").unwrap();
        assert_eq!(methods.get(&Method::GET), Some(&"fallback"));
        assert_eq!(params.get("kind"), None);
        assert_eq!(params.get("rest"), Some("apps/other"));
    }

    #[test]
    fn test_conflicting_param_names() {
        let mut root = Node::root();
        insert(&mut root, "/v3/apps/{guid}", "a").unwrap();

        let err = insert(&mut root, "/v3/apps/{app_guid}/env", "b").unwrap_err();
        assert!(matches!(err, RouteError::ParamConflict { .. }));
    }

    #[test]
    fn test_root_path() {
        let mut root = Node::root();
        insert(&mut root, "/", "root").unwrap();

        let (methods, _) = find(&root, "/").unwrap();
        assert_eq!(methods.get(&Method::GET), Some(&"root"));
    }
}
