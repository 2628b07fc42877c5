//! # Lifecycle Tier Tests (L0-L3)
//!
//! Every tier runs against both persistent backends. If ANY tier fails on
//! either backend, the backends are not interchangeable. A few cases only
//! make sense for the snapshot file and run against it alone.
//!
//! ## Tiers
//! - L0: Identifier shape
//! - L1: Create / read / delete lifecycle
//! - L2: Drift and immutability
//! - L3: Concurrency

use persondb_core::{
    BackendKind, ExternalId, PersonError, PersonId, PersonSpec, Reconciler, ResourceState,
};
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// FIXTURES
// =============================================================================

struct Fixture {
    _dir: TempDir,
    path: PathBuf,
    backend: BackendKind,
    reconciler: Reconciler,
}

fn fixture(backend: BackendKind) -> Fixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let file = match backend {
        BackendKind::File => "persons.json",
        _ => "persons.redb",
    };
    let path = dir.path().join(file);
    let reconciler = Reconciler::configure(&path, backend).expect("configure");
    Fixture {
        _dir: dir,
        path,
        backend,
        reconciler,
    }
}

fn each_backend(test: impl Fn(Fixture)) {
    for backend in [BackendKind::Redb, BackendKind::File] {
        test(fixture(backend));
    }
}

fn jane() -> PersonSpec {
    PersonSpec::new("p1", "Doe", Some("Jane"))
}

// =============================================================================
// TIER L0: IDENTIFIER SHAPE
// =============================================================================

mod l0_identifier_shape {
    use super::*;

    /// L0.1: Create yields exactly "/person/<id>".
    #[test]
    fn create_yields_person_path() {
        each_backend(|fx| {
            let state = fx.reconciler.create(&jane()).expect("create");
            let identifier = state.identifier().expect("identifier").to_string();
            assert_eq!(identifier, "/person/p1", "backend {}", fx.backend);
        });
    }

    /// L0.2: The created identifier reads back; a foreign kind does not.
    #[test]
    fn read_accepts_person_path_only() {
        each_backend(|fx| {
            fx.reconciler.create(&jane()).expect("create");

            assert!(fx.reconciler.read("/person/p1").expect("read").is_present());
            assert!(matches!(
                fx.reconciler.read("/bad/p1"),
                Err(PersonError::InvalidIdentifier(_))
            ));
        });
    }

    /// L0.3: Import followed by read adopts an out-of-band record.
    #[test]
    fn import_then_read_adopts_record() {
        each_backend(|fx| {
            fx.reconciler.create(&jane()).expect("create");

            let imported = fx.reconciler.import("/person/p1");
            let state = fx.reconciler.read(imported.identifier()).expect("read");

            assert_eq!(state.person().map(|p| p.last_name.as_str()), Some("Doe"));
        });
    }
}

// =============================================================================
// TIER L1: LIFECYCLE
// =============================================================================

mod l1_lifecycle {
    use super::*;

    /// L1.1: A second create of the same id fails and leaves one record.
    #[test]
    fn uniqueness() {
        each_backend(|fx| {
            fx.reconciler.create(&jane()).expect("create");

            let err = fx
                .reconciler
                .create(&PersonSpec::new("p1", "Other", None))
                .expect_err("second create");

            assert!(matches!(err, PersonError::AlreadyExists(_)));
            let records = fx.reconciler.list().expect("list");
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].last_name, "Doe");
        });
    }

    /// L1.2: Create, delete, read: the identifier is cleared.
    #[test]
    fn delete_then_read() {
        each_backend(|fx| {
            let state = fx.reconciler.create(&jane()).expect("create");
            let identifier = state.identifier().expect("identifier").to_string();

            fx.reconciler
                .delete(&PersonId::new("p1"))
                .expect("delete");

            let after = fx.reconciler.read(&identifier).expect("read");
            assert_eq!(after, ResourceState::Absent);
            assert!(matches!(
                fx.reconciler.lookup("p1"),
                Err(PersonError::NotFound(_))
            ));
        });
    }

    /// L1.3: Double delete is reported, not swallowed.
    #[test]
    fn double_delete_is_not_found() {
        each_backend(|fx| {
            fx.reconciler.create(&jane()).expect("create");
            let id = PersonId::new("p1");

            fx.reconciler.delete(&id).expect("first delete");
            assert!(matches!(
                fx.reconciler.delete(&id),
                Err(PersonError::NotFound(_))
            ));
        });
    }

    /// L1.4: Data survives reopening the store.
    #[test]
    fn survives_reopen() {
        each_backend(|fx| {
            fx.reconciler.create(&jane()).expect("create");
            let Fixture {
                _dir,
                path,
                backend,
                reconciler,
            } = fx;
            drop(reconciler);

            let reopened = Reconciler::configure(&path, backend).expect("reopen");
            let state = reopened.read("/person/p1").expect("read");
            assert_eq!(
                state.person().and_then(|p| p.first_name.as_deref()),
                Some("Jane")
            );
        });
    }

    /// L1.5: Update of the mutable attribute is visible on the next read.
    #[test]
    fn update_first_name() {
        each_backend(|fx| {
            let state = fx.reconciler.create(&jane()).expect("create");
            let identifier = state.identifier().expect("identifier").clone();

            fx.reconciler
                .update(&identifier, &PersonSpec::new("p1", "Doe", None))
                .expect("update");

            let after = fx.reconciler.read_id(&identifier).expect("read");
            assert_eq!(after.person().and_then(|p| p.first_name.clone()), None);
        });
    }
}

// =============================================================================
// TIER L2: DRIFT AND IMMUTABILITY
// =============================================================================

mod l2_drift {
    use super::*;

    /// L2.1: A record removed behind the reconciler's back reads as Absent.
    #[test]
    fn out_of_band_removal_clears_identifier() {
        each_backend(|fx| {
            fx.reconciler.create(&jane()).expect("create");

            match fx.backend {
                // Edit the snapshot file directly
                BackendKind::File => std::fs::write(&fx.path, "{}\n").expect("rewrite snapshot"),
                // Go around the client straight to the table
                _ => fx
                    .reconciler
                    .client()
                    .store()
                    .delete(&PersonId::new("p1"))
                    .expect("raw delete"),
            }

            let state = fx.reconciler.read("/person/p1").expect("read");
            assert!(state.identifier().is_none());
        });
    }

    /// L2.2: Store-side edits win over declared values on read.
    #[test]
    fn store_is_authoritative_on_read() {
        each_backend(|fx| {
            fx.reconciler.create(&jane()).expect("create");
            let changed = persondb_core::PersonRecord::new(
                PersonId::new("p1"),
                "Doe",
                Some("Changed".to_string()),
            );
            fx.reconciler
                .client()
                .store()
                .update(&changed)
                .expect("raw update");

            let state = fx.reconciler.read("/person/p1").expect("read");
            assert_eq!(state.person(), Some(&changed));
        });
    }

    /// L2.3: Changing last_name is never applied in place.
    #[test]
    fn last_name_change_is_rejected() {
        each_backend(|fx| {
            let state = fx.reconciler.create(&jane()).expect("create");
            let identifier = state.identifier().expect("identifier").clone();
            let declared = PersonSpec::new("p1", "Smith", Some("Jane"));

            assert!(fx.reconciler.plan(&state, &declared).requires_replacement());
            let err = fx
                .reconciler
                .update(&identifier, &declared)
                .expect_err("immutable");

            assert!(matches!(
                err,
                PersonError::RequiresReplacement { field: "last_name" }
            ));
            let stored = fx.reconciler.read_id(&identifier).expect("read");
            assert_eq!(stored.person().map(|p| p.last_name.as_str()), Some("Doe"));
        });
    }

    /// L2.4: Update after out-of-band delete surfaces NotFound.
    #[test]
    fn update_after_removal_is_not_found() {
        each_backend(|fx| {
            fx.reconciler.create(&jane()).expect("create");
            fx.reconciler
                .client()
                .store()
                .delete(&PersonId::new("p1"))
                .expect("raw delete");

            let identifier = ExternalId::for_person(PersonId::new("p1"));
            let err = fx
                .reconciler
                .update(&identifier, &PersonSpec::new("p1", "Doe", None))
                .expect_err("gone");
            assert!(matches!(err, PersonError::NotFound(_)));
        });
    }

    /// L2.5: A store failure mid-operation is an error, never a state change.
    #[test]
    fn storage_failure_assigns_no_identifier() {
        let fx = fixture(BackendKind::File);
        fx.reconciler.create(&jane()).expect("create");
        std::fs::remove_dir_all(fx._dir.path()).expect("remove store directory");

        let create = fx.reconciler.create(&PersonSpec::new("p2", "Roe", None));
        assert!(matches!(create, Err(PersonError::StorageUnavailable(_))));

        // An unreadable store is not drift: read must not clear the identifier
        let read = fx.reconciler.read("/person/p1");
        assert!(matches!(read, Err(PersonError::StorageUnavailable(_))));
    }
}

// =============================================================================
// TIER L3: CONCURRENCY
// =============================================================================

mod l3_concurrency {
    use super::*;
    use std::sync::Barrier;

    /// L3.1: Racing creates of one id: exactly one wins.
    #[test]
    fn concurrent_create_race() {
        each_backend(|fx| {
            const RACERS: usize = 8;
            let barrier = Barrier::new(RACERS);

            let results: Vec<_> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..RACERS)
                    .map(|i| {
                        let reconciler = &fx.reconciler;
                        let barrier = &barrier;
                        scope.spawn(move || {
                            barrier.wait();
                            reconciler.create(&PersonSpec::new("p1", format!("Racer{i}"), None))
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().expect("thread"))
                    .collect()
            });

            let winners = results.iter().filter(|r| r.is_ok()).count();
            let losers = results
                .iter()
                .filter(|r| matches!(r, Err(PersonError::AlreadyExists(_))))
                .count();
            assert_eq!(winners, 1, "backend {}", fx.backend);
            assert_eq!(losers, RACERS - 1, "backend {}", fx.backend);
            assert_eq!(fx.reconciler.list().expect("list").len(), 1);
        });
    }

    /// L3.2: Concurrent creates of distinct ids all land.
    #[test]
    fn concurrent_distinct_creates() {
        each_backend(|fx| {
            std::thread::scope(|scope| {
                for i in 0..16 {
                    let reconciler = &fx.reconciler;
                    scope.spawn(move || {
                        reconciler
                            .create(&PersonSpec::new(format!("p{i}"), "Doe", None))
                            .expect("create");
                    });
                }
            });

            assert_eq!(fx.reconciler.list().expect("list").len(), 16);
        });
    }

    /// L3.3: Two reconcilers opened on one snapshot file never lose writes.
    #[test]
    fn independent_handles_on_one_file() {
        let fx = fixture(BackendKind::File);
        let other = Reconciler::configure(&fx.path, BackendKind::File).expect("second handle");

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = [("a", &fx.reconciler), ("b", &other)]
                .into_iter()
                .map(|(prefix, reconciler)| {
                    scope.spawn(move || {
                        (0..50)
                            .map(|i| {
                                reconciler.create(&PersonSpec::new(
                                    format!("{prefix}{i}"),
                                    "Doe",
                                    None,
                                ))
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().expect("thread"))
                .collect()
        });

        assert!(results.iter().all(|r| r.as_ref().is_ok_and(ResourceState::is_present)));
        assert_eq!(fx.reconciler.list().expect("list").len(), 100);
        assert_eq!(other.list().expect("list").len(), 100);
    }
}
