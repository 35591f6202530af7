#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use katydid::db::{Adapter, BindMap, DbError, EventNotifier, Value};

    fn adapter() -> Adapter {
        let db = Adapter::connect_in_memory().unwrap();
        db.execute(
            "CREATE TABLE robots (id INTEGER PRIMARY KEY, name TEXT, type TEXT)",
            (),
        )
        .unwrap();
        db
    }

    fn seed(db: &Adapter) {
        for (name, kind) in [("Astro", "mechanical"), ("C-3PO", "droid")] {
            db.insert(
                "robots",
                vec![name.into(), kind.into()],
                Some(vec!["name", "type"]),
            )
            .unwrap();
        }
    }

    #[test]
    fn test_crud_lifecycle() {
        let db = adapter();
        seed(&db);
        assert_eq!(db.last_insert_id(), 2);

        let updated = db
            .update(
                "robots",
                vec![("type", "upgraded".into())],
                Some("name = :who"),
                [("who", "Astro")],
            )
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(db.affected_rows(), 1);

        let kind = db
            .fetch_column("SELECT type FROM robots WHERE name = 'Astro'", ())
            .unwrap();
        assert_eq!(kind, Some(Value::Str("upgraded".to_string())));

        let deleted = db
            .delete("robots", Some("type = ?"), vec![Value::from("droid")])
            .unwrap();
        assert_eq!(deleted, 1);

        let remaining = db.fetch_column("SELECT COUNT(*) FROM robots", ()).unwrap();
        assert_eq!(remaining, Some(Value::Int(1)));
    }

    #[test]
    fn test_rollback_discards_and_commit_keeps() {
        let db = adapter();

        db.begin().unwrap();
        assert!(db.in_transaction());
        db.insert("robots", vec!["Ghost".into()], Some(vec!["name"]))
            .unwrap();
        db.rollback().unwrap();
        assert!(!db.in_transaction());
        let count = db.fetch_column("SELECT COUNT(*) FROM robots", ()).unwrap();
        assert_eq!(count, Some(Value::Int(0)));

        db.begin().unwrap();
        db.insert("robots", vec!["Kept".into()], Some(vec!["name"]))
            .unwrap();
        db.commit().unwrap();
        let count = db.fetch_column("SELECT COUNT(*) FROM robots", ()).unwrap();
        assert_eq!(count, Some(Value::Int(1)));
    }

    #[test]
    fn test_transaction_nesting_is_refused() {
        let db = adapter();
        db.begin().unwrap();
        assert!(matches!(db.begin(), Err(DbError::AlreadyInTransaction)));
        db.commit().unwrap();
        assert!(matches!(db.commit(), Err(DbError::NoActiveTransaction)));
        assert!(matches!(db.rollback(), Err(DbError::NoActiveTransaction)));
    }

    #[test]
    fn test_unconditioned_mutation_is_fatal() {
        let db = adapter();
        seed(&db);
        let err = db
            .update("robots", vec![("type", "wiped".into())], None, BindMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::DangerousOperation { operation: "UPDATE", .. }
        ));
        let err = db.delete("robots", Some(""), ()).unwrap_err();
        assert!(matches!(
            err,
            DbError::DangerousOperation { operation: "DELETE", .. }
        ));
        // Nothing was touched.
        let count = db.fetch_column("SELECT COUNT(*) FROM robots", ()).unwrap();
        assert_eq!(count, Some(Value::Int(2)));
    }

    #[test]
    fn test_statement_introspection() {
        let db = adapter();
        seed(&db);
        db.query("SELECT name FROM robots WHERE type = :type", [("type", "droid")])
            .unwrap();
        assert_eq!(db.sql_statement(), "SELECT name FROM robots WHERE type = :type");
        assert_eq!(
            db.sql_bind_params().value("type"),
            Some(&Value::Str("droid".to_string()))
        );

        // Positional binds are recorded under 1-based keys.
        db.query("SELECT name FROM robots WHERE type = ?", vec![Value::from("droid")])
            .unwrap();
        assert_eq!(
            db.sql_bind_params().value("1"),
            Some(&Value::Str("droid".to_string()))
        );
    }

    #[test]
    fn test_table_exists() {
        let db = adapter();
        assert!(db.table_exists("robots", None).unwrap());
        assert!(!db.table_exists("cyborgs", None).unwrap());
    }

    #[test]
    fn test_over_supplied_named_binds_are_ignored() {
        let db = adapter();
        seed(&db);
        let mut binds = BindMap::new();
        binds.insert("type", "droid");
        binds.insert("unused", "whatever");
        let rows = db
            .query("SELECT name FROM robots WHERE type = :type", binds)
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[derive(Default)]
    struct RecordingNotifier {
        events: RefCell<Vec<String>>,
    }

    impl EventNotifier for RecordingNotifier {
        fn before_query(&self, sql: &str, _binds: &BindMap) {
            self.events.borrow_mut().push(format!("before {}", sql));
        }
        fn after_query(&self, sql: &str) {
            self.events.borrow_mut().push(format!("after {}", sql));
        }
        fn begin_transaction(&self) {
            self.events.borrow_mut().push("begin".to_string());
        }
        fn commit_transaction(&self) {
            self.events.borrow_mut().push("commit".to_string());
        }
        fn rollback_transaction(&self) {
            self.events.borrow_mut().push("rollback".to_string());
        }
    }

    #[test]
    fn test_notifier_sees_the_whole_conversation() {
        let notifier = Rc::new(RecordingNotifier::default());
        let db = Adapter::connect_in_memory()
            .unwrap()
            .with_notifier(notifier.clone());

        db.execute("CREATE TABLE t (x INTEGER)", ()).unwrap();
        db.begin().unwrap();
        db.execute("INSERT INTO t VALUES (1)", ()).unwrap();
        db.commit().unwrap();
        db.begin().unwrap();
        db.rollback().unwrap();

        let events = notifier.events.borrow();
        assert_eq!(
            events.as_slice(),
            [
                "before CREATE TABLE t (x INTEGER)",
                "after CREATE TABLE t (x INTEGER)",
                "begin",
                "before INSERT INTO t VALUES (1)",
                "after INSERT INTO t VALUES (1)",
                "commit",
                "begin",
                "rollback",
            ]
        );
    }
}
