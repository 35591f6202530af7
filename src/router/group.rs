//! Route groups: a shared prefix, default paths and match predicate applied
//! to a batch of routes mounted together.

use std::rc::Rc;

use crate::router::method::Method;
use crate::router::route::{BeforeMatch, Paths, Route};

/// A batch of routes sharing a prefix and defaults.
///
/// Prefix and defaults are applied as each route is added, so set them
/// before calling [`RouteGroup::add`].
#[derive(Default)]
pub struct RouteGroup {
    prefix: Option<String>,
    defaults: Paths,
    before_match: Option<Rc<BeforeMatch>>,
    routes: Vec<Route>,
}

impl RouteGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend this prefix to every pattern added afterwards.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Paths every route in the group starts from; a route's own paths win
    /// on collision.
    #[must_use]
    pub fn defaults(mut self, defaults: impl Into<Paths>) -> Self {
        self.defaults = defaults.into();
        self
    }

    /// Predicate applied to every route in the group that does not carry
    /// its own.
    #[must_use]
    pub fn before_match(mut self, callback: impl Fn(&str, &Route) -> bool + 'static) -> Self {
        self.before_match = Some(Rc::new(callback));
        self
    }

    /// Add a route under the group prefix.
    #[must_use]
    pub fn add(mut self, pattern: &str, paths: impl Into<Paths>) -> Self {
        self.push(pattern, paths, None);
        self
    }

    /// Add a GET-only route under the group prefix.
    #[must_use]
    pub fn add_get(mut self, pattern: &str, paths: impl Into<Paths>) -> Self {
        self.push(pattern, paths, Some(Method::Get));
        self
    }

    /// Add a POST-only route under the group prefix.
    #[must_use]
    pub fn add_post(mut self, pattern: &str, paths: impl Into<Paths>) -> Self {
        self.push(pattern, paths, Some(Method::Post));
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    fn push(&mut self, pattern: &str, paths: impl Into<Paths>, method: Option<Method>) {
        let full = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, pattern),
            None => pattern.to_string(),
        };
        let mut merged = self.defaults.clone();
        merged.merge(paths.into());
        let mut route = Route::with_paths(&full, merged);
        if let Some(method) = method {
            route = route.via([method]);
        }
        self.routes.push(route);
    }

    /// Consume the group, handing its routes to the router.
    pub(crate) fn into_routes(self) -> Vec<Route> {
        let RouteGroup {
            before_match,
            mut routes,
            ..
        } = self;
        if let Some(callback) = before_match {
            for route in &mut routes {
                if !route.has_before_match() {
                    route.set_before_match_shared(Rc::clone(&callback));
                }
            }
        }
        routes
    }
}
