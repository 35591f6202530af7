#[cfg(test)]
mod tests {
    use katydid::db::Value;
    use katydid::sql::{BuildError, Builder, FieldSpec};

    #[test]
    fn test_minimal_select() {
        let stmt = Builder::new().from("Robots").statement().unwrap();
        assert_eq!(stmt.text(), "SELECT [Robots].* FROM [Robots]");
    }

    #[test]
    fn test_single_column_with_limit() {
        let stmt = Builder::new()
            .columns("id")
            .add_from("City", None)
            .limit(1)
            .statement()
            .unwrap();
        assert_eq!(stmt.text(), "SELECT id FROM [City] LIMIT 1");
    }

    #[test]
    fn test_full_select_shape() {
        let builder = Builder::new()
            .columns("r.id, r.name")
            .add_from("Robots", Some("r"))
            .left_join("RobotsParts", Some("r.id = p.robot_id"), Some("p"))
            .r#where("r.type = :type:", [("type", "mechanical")])
            .and_where("r.year > :year:", [("year", 2010)])
            .group_by(["r.id"])
            .having("COUNT(p.id) > 1")
            .order_by("r.name")
            .limit(10)
            .offset(20);
        let stmt = builder.statement().unwrap();
        assert_eq!(
            stmt.text(),
            "SELECT r.id, r.name FROM [Robots] AS [r] \
             LEFT JOIN [RobotsParts] AS [p] ON r.id = p.robot_id \
             WHERE (r.type = :type:) AND (r.year > :year:) \
             GROUP BY r.id HAVING COUNT(p.id) > 1 \
             ORDER BY r.name LIMIT 10 OFFSET 20"
        );
        let names: Vec<&str> = builder.bind_params().names().collect();
        assert_eq!(names, vec!["type", "year"]);
    }

    #[test]
    fn test_condition_composition_nests_left() {
        let builder = Builder::new()
            .from("Robots")
            .r#where("type = :type:", [("type", "virtual")])
            .or_where("year < :year:", [("year", 2000)])
            .and_where("price > :price:", [("price", 100)]);
        assert_eq!(
            builder.conditions(),
            Some("((type = :type:) OR (year < :year:)) AND (price > :price:)")
        );
    }

    #[test]
    fn test_between_uses_hidden_binds() {
        let builder = Builder::new()
            .from("Robots")
            .between_where("price", 100, 200);
        assert_eq!(
            builder.conditions(),
            Some("price BETWEEN :ABP0: AND :ABP1:")
        );
        assert_eq!(builder.bind_params().value("ABP0"), Some(&Value::Int(100)));
        assert_eq!(builder.bind_params().value("ABP1"), Some(&Value::Int(200)));
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let builder = Builder::new()
            .from("Robots")
            .in_where("id", Vec::<i64>::new());
        let stmt = builder.statement().unwrap();
        assert_eq!(stmt.text(), "SELECT [Robots].* FROM [Robots] WHERE id <> id");
    }

    #[test]
    fn test_aliased_columns() {
        let stmt = Builder::new()
            .columns([("id", "robot_id"), ("name", "robot_name")])
            .from("Robots")
            .statement()
            .unwrap();
        assert_eq!(
            stmt.text(),
            "SELECT id AS [robot_id], name AS [robot_name] FROM [Robots]"
        );
    }

    #[test]
    fn test_multiple_sources_and_default_columns() {
        let stmt = Builder::new()
            .add_from("Robots", None)
            .add_from("Parts", Some("p"))
            .statement()
            .unwrap();
        assert_eq!(
            stmt.text(),
            "SELECT [Robots].*, [p].* FROM [Robots], [Parts] AS [p]"
        );
    }

    #[test]
    fn test_distinct_and_all() {
        let distinct = Builder::new().from("Robots").distinct(true);
        assert!(distinct.statement().unwrap().text().starts_with("SELECT DISTINCT "));
        let all = Builder::new().from("Robots").distinct(false);
        assert!(all.statement().unwrap().text().starts_with("SELECT ALL "));
    }

    #[test]
    fn test_numeric_strings_round_trip_as_counts() {
        let stmt = Builder::new()
            .from("Robots")
            .limit("10")
            .statement()
            .unwrap();
        assert!(stmt.text().ends_with("LIMIT 10"));
    }

    #[test]
    fn test_malformed_counts_are_rejected() {
        let padded = Builder::new().from("Robots").limit("07");
        assert!(matches!(
            padded.statement().unwrap_err(),
            BuildError::InvalidLimit(_)
        ));
        let negative = Builder::new().from("Robots").limit(-1);
        assert!(matches!(
            negative.statement().unwrap_err(),
            BuildError::InvalidLimit(_)
        ));
        let word = Builder::new().from("Robots").offset("twenty");
        assert!(matches!(
            word.statement().unwrap_err(),
            BuildError::InvalidOffset(_)
        ));
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let err = Builder::new().columns("id").statement().unwrap_err();
        assert!(matches!(err, BuildError::NoSource));
    }

    #[test]
    fn test_bad_field_spec_surfaces_at_render() {
        let bad = FieldSpec::Spec(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let builder = Builder::new().from("Robots").r#where([("price", bad)], ());
        assert!(matches!(
            builder.statement().unwrap_err(),
            BuildError::Condition(_)
        ));
        // The builder itself keeps accepting calls; only rendering fails.
        let builder = builder.limit(5);
        assert!(builder.statement().is_err());
    }

    #[test]
    fn test_field_conditions_render_named_binds() {
        let builder = Builder::new()
            .from("Robots")
            .r#where([("type", "virtual"), ("year", "1999")], ());
        let stmt = builder.statement().unwrap();
        assert_eq!(
            stmt.text(),
            "SELECT [Robots].* FROM [Robots] WHERE type=:type: AND year=:year:"
        );
        assert_eq!(
            builder.bind_params().value("type"),
            Some(&Value::Str("virtual".to_string()))
        );
    }

    #[test]
    fn test_for_update_suffix() {
        let stmt = Builder::new()
            .from("Robots")
            .for_update(true)
            .statement()
            .unwrap();
        assert!(stmt.text().ends_with(" FOR UPDATE"));
    }
}
