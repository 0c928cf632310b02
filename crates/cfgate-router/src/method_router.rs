//! Per-path method table.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to routed values for a single path pattern.
///
/// A pattern normally serves two or three methods, so the table is an inline
/// vector scanned linearly.
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    entries: SmallVec<[(Method, T); 4]>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` for `method`.
    ///
    /// Returns the value back if the method is already taken; the existing
    /// entry is left in place.
    pub fn insert(&mut self, method: Method, value: T) -> Result<(), T> {
        if self.contains(&method) {
            return Err(value);
        }
        self.entries.push((method, value));
        Ok(())
    }

    /// Returns the value registered for `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&T> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, v)| v)
    }

    /// Returns `true` if `method` has a value.
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        self.entries.iter().any(|(m, _)| m == method)
    }

    /// Methods registered for this path, in registration order.
    pub fn allowed(&self) -> impl Iterator<Item = &Method> {
        self.entries.iter().map(|(m, _)| m)
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
