//! Path parameter storage.
//!
//! Parameters captured while matching a pattern such as
//! `/v3/apps/{guid}/routes` are kept in a small inline vector. Resource paths
//! rarely capture more than two values, so matching stays allocation free for
//! the common case.

use smallvec::SmallVec;

const INLINE_PARAMS: usize = 4;

/// Named values captured from a matched path.
///
/// Lookup is linear, which beats hashing at these sizes.
///
/// # Example
///
/// ```rust
/// use cfgate_router::Params;
///
/// let mut params = Params::new();
/// params.push("guid", "app-1");
/// assert_eq!(params.get("guid"), Some("app-1"));
/// assert_eq!(params.get("name"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured value.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of captured values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Drops captures past `len`. Used when a match attempt backtracks.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut params = Params::new();
        params.push("guid", "abc");
        params.push("name", "web");

        assert_eq!(params.get("guid"), Some("abc"));
        assert_eq!(params.get("name"), Some("web"));
        assert_eq!(params.get("space"), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_truncate_discards_later_captures() {
        let mut params = Params::new();
        params.push("a", "1");
        params.push("b", "2");
        params.truncate(1);

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("b"), None);
    }

    #[test]
    fn test_iter_preserves_order() {
        let params: Params = vec![
            ("first".to_string(), "1".to_string()),
            ("second".to_string(), "2".to_string()),
        ]
        .into_iter()
        .collect();

        let names: Vec<&str> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
