//! A single route: a compiled pattern plus the handler paths it resolves to.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::router::method::Method;
use crate::router::pattern::{CompiledPattern, PatternMatch, RouteResult};

// =============================================================================
// Paths
// =============================================================================

/// What a route sets a handler field or parameter to when it matches.
#[derive(Debug, Clone, PartialEq)]
pub enum PathValue {
    /// Leave the field untouched.
    Unset,
    Literal(String),
    /// Value of the capture group at this one-based position.
    Position(usize),
}

impl From<&str> for PathValue {
    fn from(value: &str) -> Self {
        PathValue::Literal(value.to_string())
    }
}

impl From<String> for PathValue {
    fn from(value: String) -> Self {
        PathValue::Literal(value)
    }
}

impl From<usize> for PathValue {
    fn from(position: usize) -> Self {
        PathValue::Position(position)
    }
}

/// Handler paths keyed by name, preserving insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paths {
    entries: Vec<(String, PathValue)>,
}

impl Paths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a path; re-inserting a name overwrites in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PathValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PathValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PathValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fold `other` in; its entries win on name collisions.
    pub fn merge(&mut self, other: Paths) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Paths
where
    K: Into<String>,
    V: Into<PathValue>,
{
    fn from(entries: [(K, V); N]) -> Self {
        let mut paths = Paths::new();
        for (name, value) in entries {
            paths.insert(name, value);
        }
        paths
    }
}

/// `()` reads as "no paths" at call sites that require a paths argument.
impl From<()> for Paths {
    fn from(_: ()) -> Self {
        Paths::new()
    }
}

// =============================================================================
// Route
// =============================================================================

pub(crate) type BeforeMatch = dyn Fn(&str, &Route) -> bool;

/// One registered route.
pub struct Route {
    pattern: CompiledPattern,
    paths: Paths,
    methods: Option<Vec<Method>>,
    name: Option<String>,
    before_match: Option<Rc<BeforeMatch>>,
    id: Cell<Option<u64>>,
}

impl Route {
    pub fn new(pattern: &str) -> Self {
        Route {
            pattern: CompiledPattern::compile(pattern),
            paths: Paths::new(),
            methods: None,
            name: None,
            before_match: None,
            id: Cell::new(None),
        }
    }

    pub fn with_paths(pattern: &str, paths: impl Into<Paths>) -> Self {
        let mut route = Route::new(pattern);
        route.paths = paths.into();
        route
    }

    /// Name the route for later lookup.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restrict the route to the given HTTP methods.
    #[must_use]
    pub fn via(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    /// Install a predicate consulted after the pattern matches; returning
    /// `false` vetoes the match and the search moves on.
    #[must_use]
    pub fn before_match(mut self, callback: impl Fn(&str, &Route) -> bool + 'static) -> Self {
        self.before_match = Some(Rc::new(callback));
        self
    }

    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn methods(&self) -> Option<&[Method]> {
        self.methods.as_deref()
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Identifier assigned at registration; `None` until then.
    pub fn id(&self) -> Option<u64> {
        self.id.get()
    }

    pub(crate) fn set_id(&self, id: u64) {
        self.id.set(Some(id));
    }

    pub(crate) fn has_before_match(&self) -> bool {
        self.before_match.is_some()
    }

    pub(crate) fn set_before_match_shared(&mut self, callback: Rc<BeforeMatch>) {
        self.before_match = Some(callback);
    }

    /// Test the route against a request. A `None` method skips the method
    /// check entirely.
    pub fn try_match(
        &self,
        path: &str,
        method: Option<Method>,
    ) -> RouteResult<Option<PatternMatch>> {
        if let (Some(allowed), Some(requested)) = (&self.methods, method) {
            if !allowed.contains(&requested) {
                return Ok(None);
            }
        }
        let Some(captures) = self.pattern.matches(path)? else {
            return Ok(None);
        };
        if let Some(callback) = &self.before_match {
            if !callback(path, self) {
                return Ok(None);
            }
        }
        Ok(Some(captures))
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.pattern())
            .field("paths", &self.paths)
            .field("methods", &self.methods)
            .field("name", &self.name)
            .field("before_match", &self.before_match.is_some())
            .field("id", &self.id.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_overwrite_in_place() {
        let mut paths = Paths::new();
        paths.insert("controller", "posts");
        paths.insert("action", "index");
        paths.insert("controller", "pages");
        let keys: Vec<&str> = paths.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["controller", "action"]);
        assert_eq!(
            paths.get("controller"),
            Some(&PathValue::Literal("pages".to_string()))
        );
    }

    #[test]
    fn test_paths_merge_prefers_other() {
        let mut base: Paths = [("controller", "posts"), ("action", "index")].into();
        base.merge([("action", "edit")].into());
        assert_eq!(
            base.get("action"),
            Some(&PathValue::Literal("edit".to_string()))
        );
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_position_paths_from_usize() {
        let paths: Paths = [("year", 1), ("month", 2)].into();
        assert_eq!(paths.get("year"), Some(&PathValue::Position(1)));
    }

    #[test]
    fn test_method_restriction() {
        let route = Route::with_paths("/login", [("controller", "session")]).via([Method::Post]);
        assert!(route.try_match("/login", Some(Method::Get)).unwrap().is_none());
        assert!(route.try_match("/login", Some(Method::Post)).unwrap().is_some());
        // A method-less request bypasses the restriction.
        assert!(route.try_match("/login", None).unwrap().is_some());
    }

    #[test]
    fn test_before_match_veto() {
        let route = Route::new("/admin/{page}").before_match(|path, _| !path.contains("secret"));
        assert!(route.try_match("/admin/users", None).unwrap().is_some());
        assert!(route.try_match("/admin/secret", None).unwrap().is_none());
    }

    #[test]
    fn test_before_match_sees_the_route() {
        let route = Route::new("/only-named/{x}")
            .name("gate")
            .before_match(|_, route| route.route_name() == Some("gate"));
        assert!(route.try_match("/only-named/1", None).unwrap().is_some());
    }
}
