#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use katydid::router::{Method, PathValue, Route, RouteError, RouteGroup, Router};

    fn site_router() -> Router {
        let mut router = Router::new();
        router.set_default_controller("index");
        router.set_default_action("index");
        router.add("/", ());
        router.add("/:controller", [("action", "index")]);
        router.add("/:controller/:action/:params", ());
        router.add(
            "/blog/{year:\\d{4}}/{slug}",
            [("controller", "blog"), ("action", "post")],
        );
        router
    }

    #[test]
    fn test_mvc_resolution() {
        let mut router = site_router();
        assert!(router.handle("/posts/edit/100", None).unwrap());
        assert_eq!(router.controller_name(), Some("posts"));
        assert_eq!(router.action_name(), Some("edit"));
        assert_eq!(router.param("0"), Some("100"));
    }

    #[test]
    fn test_defaults_fill_missing_parts() {
        let mut router = site_router();
        assert!(router.handle("/session", None).unwrap());
        assert_eq!(router.controller_name(), Some("session"));
        assert_eq!(router.action_name(), Some("index"));

        assert!(router.handle("/", None).unwrap());
        assert_eq!(router.controller_name(), Some("index"));
        assert_eq!(router.action_name(), Some("index"));
    }

    #[test]
    fn test_custom_placeholders_beat_generic_routes() {
        let mut router = site_router();
        assert!(router.handle("/blog/2024/katydid_song", None).unwrap());
        assert_eq!(router.controller_name(), Some("blog"));
        assert_eq!(router.action_name(), Some("post"));
        assert_eq!(router.param("year"), Some("2024"));
        assert_eq!(router.param("slug"), Some("katydid_song"));
    }

    #[test]
    fn test_positional_paths() {
        let mut router = Router::new();
        router.add(
            "/admin/:controller/a/:action/:params",
            [("controller", 1), ("action", 2), ("params", 3)],
        );
        assert!(router.handle("/admin/users/a/delete/sean/19", None).unwrap());
        assert_eq!(router.controller_name(), Some("users"));
        assert_eq!(router.action_name(), Some("delete"));
        let params: Vec<(&str, &str)> = router.params().collect();
        assert_eq!(params, vec![("0", "sean"), ("1", "19")]);
    }

    #[test]
    fn test_rest_style_group() {
        let mut router = Router::new();
        let group = RouteGroup::new()
            .prefix("/api/v1")
            .defaults([("module", "api"), ("namespace", "Api\\V1")])
            .add_get("/robots", [("controller", "robots"), ("action", "index")])
            .add_get(
                "/robots/{id:\\d+}",
                [("controller", "robots"), ("action", "show")],
            )
            .add_post("/robots", [("controller", "robots"), ("action", "create")]);
        router.mount(group);

        assert!(router.handle("/api/v1/robots/42", Some(Method::Get)).unwrap());
        assert_eq!(router.namespace_name(), Some("Api\\V1"));
        assert_eq!(router.module_name(), Some("api"));
        assert_eq!(router.action_name(), Some("show"));
        assert_eq!(router.param("id"), Some("42"));

        assert!(router.handle("/api/v1/robots", Some(Method::Post)).unwrap());
        assert_eq!(router.action_name(), Some("create"));

        assert!(!router.handle("/api/v1/robots/42", Some(Method::Delete)).unwrap());
    }

    #[test]
    fn test_before_match_runs_only_after_pattern_match() {
        let calls = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&calls);
        let mut router = Router::new();
        router.add_route(
            Route::with_paths("/gated/{page}", [("controller", "gate")]).before_match(
                move |path, _| {
                    seen.set(seen.get() + 1);
                    !path.ends_with("/closed")
                },
            ),
        );

        assert!(!router.handle("/elsewhere", None).unwrap());
        assert_eq!(calls.get(), 0);

        assert!(router.handle("/gated/open", None).unwrap());
        assert_eq!(calls.get(), 1);

        assert!(!router.handle("/gated/closed", None).unwrap());
        assert_eq!(calls.get(), 2);
        assert!(!router.was_matched());
    }

    #[test]
    fn test_not_found_fallback() {
        let mut router = site_router();
        router.not_found([("controller", "errors"), ("action", "show404")]);
        assert!(!router.handle("/a/b/c/d/e", None).unwrap());
        assert!(!router.was_matched());
        assert_eq!(router.controller_name(), Some("errors"));
        assert_eq!(router.action_name(), Some("show404"));
    }

    #[test]
    fn test_named_route_lookup() {
        let mut router = Router::new();
        router.add_route(
            Route::with_paths("/profile/{id}", [("controller", "users")]).name("profile"),
        );
        let route = router.route_by_name("profile").unwrap();
        assert_eq!(route.pattern().pattern(), "/profile/{id}");
        assert_eq!(router.route_by_id(route.id().unwrap()).unwrap().route_name(), Some("profile"));
    }

    #[test]
    fn test_unset_path_keeps_router_default() {
        let mut router = Router::new();
        router.set_default_module("frontend");
        router.add(
            "/landing",
            [
                ("module", PathValue::Unset),
                ("controller", PathValue::from("landing")),
                ("action", PathValue::from("index")),
            ],
        );
        assert!(router.handle("/landing", None).unwrap());
        assert_eq!(router.module_name(), Some("frontend"));
    }

    #[test]
    fn test_trailing_slash_normalization() {
        let mut router = site_router();
        router.remove_extra_slashes(true);
        assert!(router.handle("/posts/", None).unwrap());
        assert_eq!(router.controller_name(), Some("posts"));
    }

    #[test]
    fn test_invalid_custom_regex_reports_the_pattern() {
        let mut router = Router::new();
        router.add("/broken/{id:[0-9", ());
        match router.handle("/broken/5", None) {
            Err(RouteError::Compilation { pattern, .. }) => {
                assert_eq!(pattern, "/broken/{id:[0-9");
            }
            other => panic!("expected a compilation error, got {:?}", other),
        }
    }
}
