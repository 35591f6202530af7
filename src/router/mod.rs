//! URI routing.
//!
//! A [`Router`] holds an ordered list of [`Route`]s and resolves a request
//! URI to handler coordinates: namespace, module, controller, action, plus
//! free-form parameters. Matching walks the routes in reverse registration
//! order, so later routes take precedence, and stops at the first route
//! whose pattern, method restriction and `before_match` predicate all
//! accept the request.
//!
//! ```no_run
//! use katydid::router::Router;
//!
//! let mut router = Router::new();
//! router.add("/:controller/:action/:params", ());
//! router.add("/about", [("controller", "pages"), ("action", "about")]);
//!
//! router.handle("/posts/edit/42", None).unwrap();
//! assert_eq!(router.controller_name(), Some("posts"));
//! assert_eq!(router.action_name(), Some("edit"));
//! ```

pub mod group;
pub mod method;
pub mod pattern;
pub mod route;

pub use group::RouteGroup;
pub use method::Method;
pub use pattern::{CompiledPattern, PatternMatch, RouteError, RouteResult};
pub use route::{PathValue, Paths, Route};

use std::rc::Rc;

// =============================================================================
// Router
// =============================================================================

/// Matches request URIs against registered routes and keeps the outcome of
/// the most recent [`Router::handle`] call.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Rc<Route>>,
    next_id: u64,
    default_namespace: Option<String>,
    default_module: Option<String>,
    default_controller: Option<String>,
    default_action: Option<String>,
    not_found: Option<Paths>,
    remove_extra_slashes: bool,

    namespace: Option<String>,
    module: Option<String>,
    controller: Option<String>,
    action: Option<String>,
    params: Vec<(String, String)>,
    was_matched: bool,
    matched_route: Option<Rc<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Register a route answering any method. Returns the route id.
    pub fn add(&mut self, pattern: &str, paths: impl Into<Paths>) -> u64 {
        self.add_route(Route::with_paths(pattern, paths))
    }

    /// Register a prebuilt route. Returns the id assigned to it.
    pub fn add_route(&mut self, route: Route) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        route.set_id(id);
        self.routes.push(Rc::new(route));
        id
    }

    pub fn add_get(&mut self, pattern: &str, paths: impl Into<Paths>) -> u64 {
        self.add_with_method(pattern, paths, Method::Get)
    }

    pub fn add_post(&mut self, pattern: &str, paths: impl Into<Paths>) -> u64 {
        self.add_with_method(pattern, paths, Method::Post)
    }

    pub fn add_put(&mut self, pattern: &str, paths: impl Into<Paths>) -> u64 {
        self.add_with_method(pattern, paths, Method::Put)
    }

    pub fn add_patch(&mut self, pattern: &str, paths: impl Into<Paths>) -> u64 {
        self.add_with_method(pattern, paths, Method::Patch)
    }

    pub fn add_delete(&mut self, pattern: &str, paths: impl Into<Paths>) -> u64 {
        self.add_with_method(pattern, paths, Method::Delete)
    }

    pub fn add_options(&mut self, pattern: &str, paths: impl Into<Paths>) -> u64 {
        self.add_with_method(pattern, paths, Method::Options)
    }

    pub fn add_head(&mut self, pattern: &str, paths: impl Into<Paths>) -> u64 {
        self.add_with_method(pattern, paths, Method::Head)
    }

    fn add_with_method(&mut self, pattern: &str, paths: impl Into<Paths>, method: Method) -> u64 {
        self.add_route(Route::with_paths(pattern, paths).via([method]))
    }

    /// Register every route of a group.
    pub fn mount(&mut self, group: RouteGroup) {
        for route in group.into_routes() {
            self.add_route(route);
        }
    }

    /// Paths applied when no route matches. The matched flag stays false.
    pub fn not_found(&mut self, paths: impl Into<Paths>) {
        self.not_found = Some(paths.into());
    }

    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.default_namespace = Some(namespace.into());
    }

    pub fn set_default_module(&mut self, module: impl Into<String>) {
        self.default_module = Some(module.into());
    }

    pub fn set_default_controller(&mut self, controller: impl Into<String>) {
        self.default_controller = Some(controller.into());
    }

    pub fn set_default_action(&mut self, action: impl Into<String>) {
        self.default_action = Some(action.into());
    }

    /// Strip trailing slashes from handled URIs; the bare root is kept.
    pub fn remove_extra_slashes(&mut self, enabled: bool) {
        self.remove_extra_slashes = enabled;
    }

    // -------------------------------------------------------------------------
    // Matching
    // -------------------------------------------------------------------------

    /// Resolve `uri`, updating the router state. Returns whether a route
    /// matched. Passing `None` as the method skips method restrictions.
    pub fn handle(&mut self, uri: &str, method: Option<Method>) -> RouteResult<bool> {
        let mut path = if uri.is_empty() { "/" } else { uri }.to_string();
        if self.remove_extra_slashes && path.len() > 1 {
            let trimmed = path.trim_end_matches('/');
            path = if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            };
        }

        self.reset();

        let mut found: Option<(Rc<Route>, PatternMatch)> = None;
        for route in self.routes.iter().rev() {
            tracing::trace!(pattern = route.pattern().pattern(), "trying route");
            if let Some(captures) = route.try_match(&path, method)? {
                found = Some((Rc::clone(route), captures));
                break;
            }
        }

        match found {
            Some((route, captures)) => {
                tracing::debug!(uri = %path, pattern = route.pattern().pattern(), "route matched");
                self.apply_paths(route.paths(), Some(&captures));
                self.apply_captures(&captures);
                self.was_matched = true;
                self.matched_route = Some(route);
            }
            None => {
                if let Some(paths) = self.not_found.clone() {
                    tracing::warn!(uri = %path, "no route matched, applying not-found paths");
                    self.apply_paths(&paths, None);
                } else {
                    tracing::debug!(uri = %path, "no route matched");
                }
            }
        }
        Ok(self.was_matched)
    }

    fn reset(&mut self) {
        self.namespace = self.default_namespace.clone();
        self.module = self.default_module.clone();
        self.controller = self.default_controller.clone();
        self.action = self.default_action.clone();
        self.params.clear();
        self.was_matched = false;
        self.matched_route = None;
    }

    /// Apply a route's paths. Handler fields only take literals here; their
    /// dynamic values arrive through the named captures afterwards.
    fn apply_paths(&mut self, paths: &Paths, captures: Option<&PatternMatch>) {
        let entries: Vec<(String, PathValue)> = paths
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        for (name, value) in entries {
            match value {
                PathValue::Unset => {}
                PathValue::Literal(text) => {
                    if name == "params" {
                        self.splat_params(&text);
                    } else if !self.set_handler_field(&name, text.clone()) {
                        self.insert_param(&name, text);
                    }
                }
                PathValue::Position(n) => {
                    if is_handler_field(&name) {
                        continue;
                    }
                    if let Some(text) = captures.and_then(|c| c.position(n)) {
                        if name == "params" {
                            let text = text.to_string();
                            self.splat_params(&text);
                        } else {
                            self.insert_param(&name, text.to_string());
                        }
                    }
                }
            }
        }
    }

    /// Named captures override the paths; `params` expands into numbered
    /// parameters.
    fn apply_captures(&mut self, captures: &PatternMatch) {
        let named: Vec<(String, String)> = captures
            .named()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (name, value) in named {
            if self.set_handler_field(&name, value.clone()) {
                continue;
            }
            if name == "params" {
                self.splat_params(&value);
            } else {
                self.insert_param(&name, value);
            }
        }
    }

    /// Split a raw parameter tail into numbered parameters.
    fn splat_params(&mut self, tail: &str) {
        let parts: Vec<String> = tail
            .trim_matches('/')
            .split('/')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
        for (i, part) in parts.into_iter().enumerate() {
            self.insert_param(&i.to_string(), part);
        }
    }

    fn set_handler_field(&mut self, name: &str, value: String) -> bool {
        match name {
            "namespace" => self.namespace = Some(value),
            "module" => self.module = Some(value),
            "controller" => self.controller = Some(value),
            "action" => self.action = Some(value),
            _ => return false,
        }
        true
    }

    fn insert_param(&mut self, name: &str, value: String) {
        match self.params.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.params.push((name.to_string(), value)),
        }
    }

    // -------------------------------------------------------------------------
    // Outcome
    // -------------------------------------------------------------------------

    pub fn namespace_name(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn controller_name(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    pub fn action_name(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn was_matched(&self) -> bool {
        self.was_matched
    }

    pub fn matched_route(&self) -> Option<Rc<Route>> {
        self.matched_route.clone()
    }

    pub fn route_by_name(&self, name: &str) -> Option<Rc<Route>> {
        self.routes
            .iter()
            .find(|route| route.route_name() == Some(name))
            .cloned()
    }

    pub fn route_by_id(&self, id: u64) -> Option<Rc<Route>> {
        self.routes
            .iter()
            .find(|route| route.id() == Some(id))
            .cloned()
    }

    pub fn routes(&self) -> &[Rc<Route>] {
        &self.routes
    }
}

fn is_handler_field(name: &str) -> bool {
    matches!(name, "namespace" | "module" | "controller" | "action")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mvc_router() -> Router {
        let mut router = Router::new();
        router.add("/", [("controller", "index"), ("action", "index")]);
        router.add("/:controller", [("action", "index")]);
        router.add("/:controller/:action", ());
        router
    }

    #[test]
    fn test_controller_action_resolution() {
        let mut router = mvc_router();
        assert!(router.handle("/posts/edit", None).unwrap());
        assert_eq!(router.controller_name(), Some("posts"));
        assert_eq!(router.action_name(), Some("edit"));
        assert_eq!(router.params().count(), 0);
        assert_eq!(
            router.matched_route().unwrap().pattern().pattern(),
            "/:controller/:action"
        );
    }

    #[test]
    fn test_empty_uri_is_the_root() {
        let mut router = mvc_router();
        assert!(router.handle("", None).unwrap());
        assert_eq!(router.controller_name(), Some("index"));
        assert_eq!(router.action_name(), Some("index"));
    }

    #[test]
    fn test_positional_paths_with_params_tail() {
        let mut router = Router::new();
        router.add(
            "/admin/:controller/a/:action/:params",
            [("controller", 1), ("action", 2), ("params", 3)],
        );
        assert!(router.handle("/admin/users/a/delete/sean/19", None).unwrap());
        assert_eq!(router.controller_name(), Some("users"));
        assert_eq!(router.action_name(), Some("delete"));
        assert_eq!(router.param("0"), Some("sean"));
        assert_eq!(router.param("1"), Some("19"));
    }

    #[test]
    fn test_int_capture_through_position_path() {
        let mut router = Router::new();
        router.add(
            "/invoice/:int",
            [
                ("controller", PathValue::from("invoices")),
                ("action", PathValue::from("show")),
                ("id", PathValue::Position(1)),
            ],
        );
        assert!(router.handle("/invoice/207", None).unwrap());
        assert_eq!(router.param("id"), Some("207"));
    }

    #[test]
    fn test_later_routes_win() {
        let mut router = Router::new();
        router.add("/help", [("controller", "pages"), ("action", "help")]);
        router.add("/help", [("controller", "support"), ("action", "index")]);
        assert!(router.handle("/help", None).unwrap());
        assert_eq!(router.controller_name(), Some("support"));
    }

    #[test]
    fn test_extra_slashes_are_stripped_when_enabled() {
        let mut router = mvc_router();
        router.remove_extra_slashes(true);
        assert!(router.handle("/posts///", None).unwrap());
        assert_eq!(router.controller_name(), Some("posts"));
        // The root keeps its single slash.
        assert!(router.handle("/", None).unwrap());
        assert_eq!(router.controller_name(), Some("index"));
    }

    #[test]
    fn test_not_found_paths() {
        let mut router = mvc_router();
        router.not_found([("controller", "errors"), ("action", "show404")]);
        assert!(!router.handle("/no/such/deep/path", None).unwrap());
        assert!(!router.was_matched());
        assert_eq!(router.controller_name(), Some("errors"));
        assert_eq!(router.action_name(), Some("show404"));
        assert!(router.matched_route().is_none());
    }

    #[test]
    fn test_state_resets_between_handles() {
        let mut router = mvc_router();
        router.set_default_controller("home");
        router.set_default_action("index");
        assert!(router.handle("/posts/edit", None).unwrap());
        assert!(!router.handle("/a/b/c/d", None).unwrap());
        assert_eq!(router.controller_name(), Some("home"));
        assert_eq!(router.action_name(), Some("index"));
        assert_eq!(router.params().count(), 0);
    }

    #[test]
    fn test_method_dispatch() {
        let mut router = Router::new();
        router.add_get("/session", [("action", "form")]);
        router.add_post("/session", [("action", "create")]);
        assert!(router.handle("/session", Some(Method::Post)).unwrap());
        assert_eq!(router.action_name(), Some("create"));
        assert!(router.handle("/session", Some(Method::Get)).unwrap());
        assert_eq!(router.action_name(), Some("form"));
    }

    #[test]
    fn test_route_lookup() {
        let mut router = Router::new();
        let id = router.add_route(
            Route::with_paths("/profile", [("controller", "users")]).name("profile"),
        );
        assert_eq!(
            router.route_by_name("profile").unwrap().id(),
            Some(id)
        );
        assert_eq!(
            router.route_by_id(id).unwrap().route_name(),
            Some("profile")
        );
        assert!(router.route_by_name("missing").is_none());
    }

    #[test]
    fn test_mounted_group() {
        let mut router = Router::new();
        let group = RouteGroup::new()
            .prefix("/api")
            .defaults([("module", "api")])
            .add("/items/{id:\\d+}", [("controller", "items"), ("action", "show")]);
        router.mount(group);
        assert!(router.handle("/api/items/7", None).unwrap());
        assert_eq!(router.module_name(), Some("api"));
        assert_eq!(router.param("id"), Some("7"));
    }

    #[test]
    fn test_bad_pattern_errors_on_handle() {
        let mut router = Router::new();
        router.add("/broken/([a-z", ());
        let err = router.handle("/broken/x", None).unwrap_err();
        assert!(matches!(err, RouteError::Compilation { .. }));
    }

    #[test]
    fn test_unset_leaves_defaults_alone() {
        let mut router = Router::new();
        router.set_default_module("frontend");
        router.add(
            "/landing",
            [
                ("module", PathValue::Unset),
                ("controller", PathValue::from("landing")),
            ],
        );
        assert!(router.handle("/landing", None).unwrap());
        assert_eq!(router.module_name(), Some("frontend"));
        assert_eq!(router.controller_name(), Some("landing"));
    }
}
