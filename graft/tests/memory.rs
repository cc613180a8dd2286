mod memory {
    use graft::{
        bundled, find_migration_files, load_migration_files, ColumnSpec, ColumnType, Guard, Kind,
        MemoryDatabase, Migration, MigrationLedger, RollbackTarget, Runner, SchemaError,
        SchemaObject, Target, Value,
    };
    use graft::Migrate as _;
    use std::num::NonZeroU32;

    const NOTIFIED_CIA: i64 = 2011072600000;
    const REVIEWED: i64 = 2011080200000;
    const BRANCH: i64 = 2011090500000;

    fn changesets() -> MemoryDatabase {
        let mut db = MemoryDatabase::new();
        db.create_table("changesets", &[("id", ColumnType::Integer)])
            .unwrap();
        db.insert("changesets", &[("id", Value::Integer(1))]).unwrap();
        db.insert("changesets", &[("id", Value::Integer(2))]).unwrap();
        db
    }

    fn migrations() -> Vec<Migration> {
        let location = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/migrations");
        load_migration_files(find_migration_files(location).unwrap()).unwrap()
    }

    fn versions(migrations: &[Migration]) -> Vec<i64> {
        migrations.iter().map(Migration::version).collect()
    }

    #[test]
    fn applies_bundled_migration_to_existing_rows() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();

        let report = Runner::new(&[bundled::extend_changesets_notified_cia().unwrap()])
            .run(&mut db, &mut ledger)
            .unwrap();

        assert_eq!(vec![NOTIFIED_CIA], versions(report.applied_migrations()));
        assert_eq!(
            vec![Value::Integer(0), Value::Integer(0)],
            db.select("changesets", "notified_cia").unwrap()
        );
        assert_eq!(Some(NOTIFIED_CIA), ledger.current_version());
    }

    #[test]
    fn bundled_migration_matches_its_file() {
        let bundled = bundled::extend_changesets_notified_cia().unwrap();
        let file = migrations().remove(0);
        assert_eq!(bundled, file);
        assert_eq!(bundled.checksum(), file.checksum());
        assert_eq!(&Guard::TableExists("notified_cia".into()), file.guard());
    }

    #[test]
    fn applies_migrations_in_version_order() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let mut unordered = migrations();
        unordered.reverse();

        let report = Runner::new(&unordered).run(&mut db, &mut ledger).unwrap();

        assert_eq!(
            vec![NOTIFIED_CIA, REVIEWED, BRANCH],
            versions(report.applied_migrations())
        );
        assert_eq!(
            vec!["id", "notified_cia", "reviewed", "branch"],
            db.columns("changesets").unwrap()
        );
        assert_eq!(
            vec![Value::Boolean(false), Value::Boolean(false)],
            db.select("changesets", "reviewed").unwrap()
        );
        assert_eq!(
            vec![Value::Text("master".into()), Value::Text("master".into())],
            db.select("changesets", "branch").unwrap()
        );
    }

    #[test]
    fn second_run_applies_nothing() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let runner = Runner::new(&migrations());

        runner.run(&mut db, &mut ledger).unwrap();
        let report = runner.run(&mut db, &mut ledger).unwrap();

        assert!(report.applied_migrations().is_empty());
        assert_eq!(3, ledger.entries().len());
    }

    #[test]
    fn ledger_is_persisted_on_the_connection() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        Runner::new(&migrations()).run(&mut db, &mut ledger).unwrap();

        let reloaded = MigrationLedger::load_default(&mut db).unwrap();
        assert_eq!(ledger.entries(), reloaded.entries());
        assert_eq!("graft_schema_history", reloaded.table_name());
    }

    #[test]
    fn uses_custom_ledger_table() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load(&mut db, "changeset_migrations").unwrap();
        Runner::new(&migrations()).run(&mut db, &mut ledger).unwrap();

        assert!(MigrationLedger::load_default(&mut db).unwrap().is_empty());
        let reloaded = MigrationLedger::load(&mut db, "changeset_migrations").unwrap();
        assert_eq!(Some(BRANCH), reloaded.current_version());
    }

    #[test]
    fn rejects_invalid_ledger_table_names() {
        let mut db = changesets();
        for name in ["", "graft schema", "h\"(version INTEGER); DROP TABLE changesets; --"] {
            let err = MigrationLedger::load(&mut db, name).unwrap_err();
            assert!(matches!(err.kind(), Kind::ConfigError(_)));
        }
        assert_eq!(vec!["id"], db.columns("changesets").unwrap());
    }

    #[test]
    fn reports_missing_table_with_failing_version() {
        let mut db = MemoryDatabase::new();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();

        let err = Runner::new(&migrations())
            .run(&mut db, &mut ledger)
            .unwrap_err();

        assert_eq!(NOTIFIED_CIA, err.failed_migration().unwrap().version());
        assert_eq!(
            Some(&SchemaError::MissingTable("changesets".into())),
            err.schema_error()
        );
        assert!(err.report().unwrap().applied_migrations().is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn aborts_batch_on_failure_keeping_applied_migrations() {
        let mut db = changesets();
        // a column the second migration is going to add
        db.add_column(&ColumnSpec::new("changesets", "reviewed", ColumnType::Boolean, true).unwrap())
            .unwrap();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();

        let err = Runner::new(&migrations())
            .run(&mut db, &mut ledger)
            .unwrap_err();

        assert_eq!(REVIEWED, err.failed_migration().unwrap().version());
        assert!(matches!(
            err.schema_error(),
            Some(SchemaError::DuplicateColumn { .. })
        ));
        assert_eq!(
            vec![NOTIFIED_CIA],
            versions(err.report().unwrap().applied_migrations())
        );
        assert_eq!(Some(NOTIFIED_CIA), ledger.current_version());
        assert!(!db.columns("changesets").unwrap().contains(&"branch".to_string()));
    }

    #[test]
    fn reapplying_migration_fails_with_duplicate_column() {
        let mut db = changesets();
        let migration = bundled::extend_changesets_notified_cia().unwrap();
        migration.apply(&mut db).unwrap();

        let err = migration.apply(&mut db).unwrap_err();
        assert_eq!(
            Some(&SchemaError::DuplicateColumn {
                table: "changesets".into(),
                column: "notified_cia".into()
            }),
            err.schema_error()
        );
    }

    #[test]
    fn rollback_reverts_last_migration_by_default() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let runner = Runner::new(&migrations());
        runner.run(&mut db, &mut ledger).unwrap();

        let report = runner.rollback(&mut db, &mut ledger).unwrap();

        assert_eq!(vec![BRANCH], versions(report.applied_migrations()));
        assert!(report.skipped_removals().is_empty());
        assert_eq!(Some(REVIEWED), ledger.current_version());
        assert_eq!(
            vec!["id", "notified_cia", "reviewed"],
            db.columns("changesets").unwrap()
        );
    }

    #[test]
    fn rollback_reverts_in_decreasing_version_order() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let runner = Runner::new(&migrations());
        runner.run(&mut db, &mut ledger).unwrap();

        let report = runner
            .set_rollback_target(RollbackTarget::Count(NonZeroU32::new(2).unwrap()))
            .rollback(&mut db, &mut ledger)
            .unwrap();

        assert_eq!(vec![BRANCH, REVIEWED], versions(report.applied_migrations()));
        assert_eq!(vec!["id", "notified_cia"], db.columns("changesets").unwrap());
    }

    #[test]
    fn rollback_to_version_keeps_older_migrations() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let runner = Runner::new(&migrations());
        runner.run(&mut db, &mut ledger).unwrap();

        runner
            .set_rollback_target(RollbackTarget::Version(NOTIFIED_CIA))
            .rollback(&mut db, &mut ledger)
            .unwrap();

        assert_eq!(Some(NOTIFIED_CIA), ledger.current_version());
        assert_eq!(1, ledger.entries().len());
    }

    #[test]
    fn round_trip_restores_original_columns() {
        let mut db = changesets();
        // satisfies the guard of the notified_cia migration
        db.create_table("notified_cia", &[("id", ColumnType::Integer)])
            .unwrap();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let runner = Runner::new(&migrations()).set_rollback_target(RollbackTarget::All);

        runner.run(&mut db, &mut ledger).unwrap();
        let report = runner.rollback(&mut db, &mut ledger).unwrap();

        assert_eq!(
            vec![BRANCH, REVIEWED, NOTIFIED_CIA],
            versions(report.applied_migrations())
        );
        assert!(report.skipped_removals().is_empty());
        assert_eq!(vec!["id"], db.columns("changesets").unwrap());
        assert_eq!(
            vec![Value::Integer(1), Value::Integer(2)],
            db.select("changesets", "id").unwrap()
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn rollback_keeps_column_when_guard_table_is_missing() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let runner = Runner::new(&[bundled::extend_changesets_notified_cia().unwrap()]);
        runner.run(&mut db, &mut ledger).unwrap();

        let report = runner.rollback(&mut db, &mut ledger).unwrap();

        // the guard looks for a table named notified_cia, not the column
        assert_eq!(vec![NOTIFIED_CIA], versions(report.skipped_removals()));
        assert!(db
            .exists(SchemaObject::Column {
                table: "changesets",
                column: "notified_cia"
            })
            .unwrap());
        assert!(ledger.is_empty());
        assert!(MigrationLedger::load_default(&mut db).unwrap().is_empty());
    }

    #[test]
    fn rerun_after_skipped_removal_fails_with_failing_version() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let runner = Runner::new(&[bundled::extend_changesets_notified_cia().unwrap()]);
        runner.run(&mut db, &mut ledger).unwrap();
        runner.rollback(&mut db, &mut ledger).unwrap();

        let err = runner.run(&mut db, &mut ledger).unwrap_err();

        match err.kind() {
            Kind::Failed(migration, _) => assert_eq!(NOTIFIED_CIA, migration.version()),
            _ => panic!("test failed"),
        }
        assert!(matches!(
            err.schema_error(),
            Some(SchemaError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn revert_is_safe_to_repeat_with_column_guard() {
        let mut db = changesets();
        let migration = Migration::new(
            "V1__add_notified_cia",
            ColumnSpec::new("changesets", "notified_cia", ColumnType::Integer, 0).unwrap(),
            Guard::ColumnExists,
        )
        .unwrap();
        migration.apply(&mut db).unwrap();

        assert_eq!(graft::Outcome::Removed, migration.revert(&mut db).unwrap());
        assert_eq!(graft::Outcome::Skipped, migration.revert(&mut db).unwrap());
        assert_eq!(vec!["id"], db.columns("changesets").unwrap());
    }

    #[test]
    fn unguarded_revert_fails_on_missing_column() {
        let mut db = changesets();
        let migration = Migration::new(
            "V1__add_notified_cia",
            ColumnSpec::new("changesets", "notified_cia", ColumnType::Integer, 0).unwrap(),
            Guard::Unguarded,
        )
        .unwrap();

        let err = migration.revert(&mut db).unwrap_err();
        assert!(matches!(
            err.schema_error(),
            Some(SchemaError::MissingColumn { .. })
        ));
    }

    #[test]
    fn migrates_to_target_version() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();

        let report = Runner::new(&migrations())
            .set_target(Target::Version(REVIEWED))
            .run(&mut db, &mut ledger)
            .unwrap();

        assert_eq!(vec![NOTIFIED_CIA, REVIEWED], versions(report.applied_migrations()));
        assert_eq!(Some(REVIEWED), ledger.current_version());
    }

    #[test]
    fn fake_records_migrations_without_changing_schema() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();

        let report = Runner::new(&migrations())
            .set_target(Target::Fake)
            .run(&mut db, &mut ledger)
            .unwrap();

        assert!(report.applied_migrations().is_empty());
        assert_eq!(Some(BRANCH), ledger.current_version());
        assert_eq!(vec!["id"], db.columns("changesets").unwrap());
    }

    #[test]
    fn fake_version_records_up_to_target() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();

        Runner::new(&migrations())
            .set_target(Target::FakeVersion(NOTIFIED_CIA))
            .run(&mut db, &mut ledger)
            .unwrap();

        assert_eq!(1, ledger.entries().len());
        assert!(ledger.contains(NOTIFIED_CIA));
        assert_eq!(vec!["id"], db.columns("changesets").unwrap());
    }

    #[test]
    fn run_iter_applies_one_migration_per_step() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let runner = Runner::new(&migrations());

        let mut iter = runner.run_iter(&mut db, &mut ledger);
        let first = iter.next().unwrap().unwrap();
        assert_eq!(NOTIFIED_CIA, first.version());
        let rest: Vec<i64> = iter.map(|result| result.unwrap().version()).collect();
        assert_eq!(vec![REVIEWED, BRANCH], rest);

        assert_eq!(3, ledger.entries().len());
    }

    #[test]
    fn run_iter_stops_after_failure() {
        let mut db = MemoryDatabase::new();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let runner = Runner::new(&migrations());

        let results: Vec<_> = runner.run_iter(&mut db, &mut ledger).collect();
        assert_eq!(1, results.len());
        assert!(results[0].is_err());
    }

    #[test]
    fn aborts_on_divergent_migration() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        Runner::new(&[bundled::extend_changesets_notified_cia().unwrap()])
            .run(&mut db, &mut ledger)
            .unwrap();

        let divergent = Migration::new(
            "2011072600000_extend_changesets_notified_cia",
            ColumnSpec::new("changesets", "notified_cia", ColumnType::Integer, 1).unwrap(),
            Guard::TableExists("notified_cia".into()),
        )
        .unwrap();
        let err = Runner::new(&[divergent.clone()])
            .run(&mut db, &mut ledger)
            .unwrap_err();
        match err.kind() {
            Kind::DivergentVersion(applied, migration) => {
                assert_eq!(NOTIFIED_CIA, applied.version());
                assert_eq!(&divergent, migration);
            }
            _ => panic!("test failed"),
        }

        let report = Runner::new(&[divergent])
            .set_abort_divergent(false)
            .run(&mut db, &mut ledger)
            .unwrap();
        assert!(report.applied_migrations().is_empty());
    }

    #[test]
    fn aborts_on_missing_migration() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let mut all = migrations();
        Runner::new(&all).run(&mut db, &mut ledger).unwrap();
        all.remove(1);

        let err = Runner::new(&all).run(&mut db, &mut ledger).unwrap_err();
        match err.kind() {
            Kind::MissingVersion(missing) => assert_eq!(REVIEWED, missing.version()),
            _ => panic!("test failed"),
        }

        // rolling back without its definition leaves the ledger row in place
        let report = Runner::new(&all)
            .set_abort_missing(false)
            .set_rollback_target(RollbackTarget::All)
            .rollback(&mut db, &mut ledger)
            .unwrap();
        assert_eq!(vec![BRANCH, NOTIFIED_CIA], versions(report.applied_migrations()));
        assert_eq!(Some(REVIEWED), ledger.current_version());
    }

    #[test]
    fn rollback_count_skips_missing_migrations() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let all = migrations();
        Runner::new(&all).run(&mut db, &mut ledger).unwrap();

        // the newest applied migration has no definition
        let report = Runner::new(&all[..2])
            .set_abort_missing(false)
            .set_rollback_target(RollbackTarget::Count(NonZeroU32::MIN))
            .rollback(&mut db, &mut ledger)
            .unwrap();

        assert_eq!(vec![REVIEWED], versions(report.applied_migrations()));
        let remaining: Vec<_> = ledger.entries().iter().map(|e| e.version()).collect();
        assert_eq!(vec![NOTIFIED_CIA, BRANCH], remaining);
        assert_eq!(
            vec!["id", "notified_cia", "branch"],
            db.columns("changesets").unwrap()
        );
    }

    #[test]
    fn rollback_leaves_divergent_migration_in_place() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        Runner::new(&[bundled::extend_changesets_notified_cia().unwrap()])
            .run(&mut db, &mut ledger)
            .unwrap();

        let divergent = Migration::new(
            "2011072600000_extend_changesets_notified_cia",
            ColumnSpec::new("changesets", "id", ColumnType::Integer, 0).unwrap(),
            Guard::Unguarded,
        )
        .unwrap();
        let report = Runner::new(&[divergent])
            .set_abort_divergent(false)
            .rollback(&mut db, &mut ledger)
            .unwrap();

        assert!(report.applied_migrations().is_empty());
        assert_eq!(Some(NOTIFIED_CIA), ledger.current_version());
        assert_eq!(vec!["id", "notified_cia"], db.columns("changesets").unwrap());
    }

    #[test]
    fn aborts_on_out_of_order_migration() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let all = migrations();
        Runner::new(&all[2..]).run(&mut db, &mut ledger).unwrap();

        let err = Runner::new(&all).run(&mut db, &mut ledger).unwrap_err();
        match err.kind() {
            Kind::OutOfOrder(migration) => assert_eq!(NOTIFIED_CIA, migration.version()),
            _ => panic!("test failed"),
        }

        let report = Runner::new(&all)
            .set_abort_missing(false)
            .run(&mut db, &mut ledger)
            .unwrap();
        assert!(report.applied_migrations().is_empty());
        assert_eq!(vec!["id", "branch"], db.columns("changesets").unwrap());
    }

    #[test]
    fn aborts_on_repeated_version() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let repeated = Migration::new(
            "V2011072600000__add_notified_irc",
            ColumnSpec::new("changesets", "notified_irc", ColumnType::Integer, 0).unwrap(),
            Guard::ColumnExists,
        )
        .unwrap();
        let mut all = migrations();
        all.push(repeated);

        let err = Runner::new(&all).run(&mut db, &mut ledger).unwrap_err();
        assert!(matches!(err.kind(), Kind::RepeatedVersion(_)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn reports_unapplied_migrations() {
        let mut db = changesets();
        let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
        let runner = Runner::new(&migrations()).set_target(Target::Version(NOTIFIED_CIA));
        runner.run(&mut db, &mut ledger).unwrap();

        let unapplied = runner.get_unapplied_migrations(&ledger).unwrap();
        assert_eq!(vec![REVIEWED, BRANCH], versions(&unapplied));
    }

    #[test]
    fn broken_migration_file_is_reported_with_its_path() {
        let location = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/migrations_broken");
        let err = load_migration_files(find_migration_files(location).unwrap()).unwrap_err();
        match err.kind() {
            Kind::InvalidMigrationFile(path, _) => {
                assert!(path.ends_with("V1__add_weight_to_cars.toml"))
            }
            _ => panic!("test failed"),
        }
    }
}
