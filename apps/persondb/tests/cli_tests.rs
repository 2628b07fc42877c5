//! # CLI Tests
//!
//! Drive parsed command lines through `execute` against temp stores.

use clap::Parser;
use persondb::cli::{Cli, Outcome, execute, render};
use persondb_core::PersonError;
use std::path::Path;

fn run(db: &Path, backend: &str, args: &[&str]) -> Result<Outcome, PersonError> {
    let db = db.to_string_lossy().into_owned();
    let mut argv = vec!["persondb", "--database", db.as_str(), "--backend", backend];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).expect("parse args");
    execute(&cli)
}

fn each_backend(test: impl Fn(&Path, &str)) {
    for (backend, file) in [("redb", "persons.redb"), ("file", "persons.json")] {
        let dir = tempfile::tempdir().expect("temp dir");
        test(&dir.path().join(file), backend);
    }
}

#[test]
fn init_is_idempotent() {
    each_backend(|db, backend| {
        run(db, backend, &["init"]).expect("first init");
        run(db, backend, &["init"]).expect("second init");
        assert!(db.exists());
    });
}

#[test]
fn full_lifecycle_across_invocations() {
    each_backend(|db, backend| {
        run(
            db,
            backend,
            &[
                "create",
                "--person-id",
                "p1",
                "--last-name",
                "Doe",
                "--first-name",
                "Jane",
            ],
        )
        .expect("create");

        let read = run(db, backend, &["read", "/person/p1"]).expect("read");
        assert_eq!(
            render(&read, false).expect("render"),
            "id:         /person/p1\nlast_name:  Doe\nfirst_name: Jane\n"
        );

        run(
            db,
            backend,
            &["update", "/person/p1", "--person-id", "p1", "--last-name", "Doe"],
        )
        .expect("update");
        let Outcome::State(view) = run(db, backend, &["lookup", "p1"]).expect("lookup") else {
            unreachable!("lookup returns state");
        };
        assert_eq!(view.first_name, None);

        run(db, backend, &["delete", "p1"]).expect("delete");
        let Outcome::State(view) = run(db, backend, &["read", "/person/p1"]).expect("read") else {
            unreachable!("read returns state");
        };
        assert!(!view.exists);
        assert!(view.id.is_none());
    });
}

#[test]
fn duplicate_create_points_at_import() {
    each_backend(|db, backend| {
        let create = ["create", "--person-id", "p1", "--last-name", "Doe"];
        run(db, backend, &create).expect("create");

        let err = run(db, backend, &create).expect_err("duplicate");
        assert!(matches!(err, PersonError::AlreadyExists(_)));
        assert!(err.to_string().contains("import"));

        let imported = run(db, backend, &["import", "/person/p1"]).expect("import");
        let Outcome::State(view) = imported else {
            unreachable!("import returns state");
        };
        assert_eq!(view.last_name.as_deref(), Some("Doe"));
    });
}

#[test]
fn plan_reports_replacement_for_last_name() {
    each_backend(|db, backend| {
        run(db, backend, &["create", "--person-id", "p1", "--last-name", "Doe"]).expect("create");

        let outcome = run(
            db,
            backend,
            &[
                "plan",
                "--identifier",
                "/person/p1",
                "--person-id",
                "p1",
                "--last-name",
                "Smith",
            ],
        )
        .expect("plan");

        assert_eq!(render(&outcome, false).expect("render"), "Plan: replace (last_name)\n");
    });
}

#[test]
fn malformed_identifier_is_rejected() {
    each_backend(|db, backend| {
        let err = run(db, backend, &["read", "person/p1"]).expect_err("malformed");
        assert!(matches!(err, PersonError::InvalidIdentifier(_)));
    });
}

#[test]
fn list_in_json_mode() {
    each_backend(|db, backend| {
        for id in ["b", "a"] {
            run(db, backend, &["create", "--person-id", id, "--last-name", "Doe"])
                .expect("create");
        }

        let outcome = run(db, backend, &["list"]).expect("list");
        let value: serde_json::Value =
            serde_json::from_str(&render(&outcome, true).expect("render")).expect("json");

        let ids: Vec<_> = value["persons"]
            .as_array()
            .expect("persons")
            .iter()
            .map(|p| p["person_id"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids, ["a", "b"]);
    });
}

#[test]
fn config_file_supplies_location() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("from-config.json");
    let config = dir.path().join("persondb.toml");
    std::fs::write(
        &config,
        format!(
            "database_filename = {:?}\nbackend = \"file\"\n",
            db.to_string_lossy()
        ),
    )
    .expect("write config");

    let config_arg = config.to_string_lossy().into_owned();
    let cli = Cli::try_parse_from(["persondb", "--config", config_arg.as_str(), "init"])
        .expect("parse args");
    assert_eq!(cli.provider_config().expect("resolve").database_filename, db);
    execute(&cli).expect("init");
    assert!(db.exists());
}

#[test]
fn unknown_backend_fails_to_parse() {
    assert!(Cli::try_parse_from(["persondb", "--backend", "postgres", "list"]).is_err());
}
