//! End-to-end tests for version detection and upgrade runs.

mod common;

use canzona_core::schema::detect::{self, VersionMarker};
use canzona_core::schema::{Migration, Registry, MIGRATIONS};
use canzona_core::{
    ConnectionProvider, Error, Migrator, Outcome, SchemaVersion, Upgrade, CURRENT_VERSION,
};
use common::{database_at, quiet_migrator, table_exists, temp_provider};
use rusqlite::Connection;

fn stored_version(provider: &impl ConnectionProvider) -> SchemaVersion {
    let conn = provider.acquire().unwrap();
    detect::detect_version(&conn).unwrap()
}

#[test]
fn test_new_database_is_created_at_current_version() {
    let (_dir, provider) = temp_provider();
    let migrator = Migrator::new(provider);

    assert_eq!(migrator.run().unwrap(), Outcome::Created);
    assert_eq!(stored_version(migrator.provider()), CURRENT_VERSION);
    assert!(!migrator.needs_upgrade().unwrap());
}

#[test]
fn test_up_to_date_database_is_left_alone() {
    let (_dir, provider) = temp_provider();
    let migrator = Migrator::new(provider);
    migrator.initialize_new_database().unwrap();

    assert!(!migrator.needs_upgrade().unwrap());
    assert_eq!(migrator.run().unwrap(), Outcome::UpToDate(CURRENT_VERSION));
    assert!(migrator.status().unwrap().pending.is_empty());
}

#[test]
fn test_every_starting_version_converges() {
    for start in 0..CURRENT_VERSION.get() {
        let (_dir, provider) = database_at(start, true);
        let migrator = quiet_migrator(provider);

        assert!(migrator.needs_upgrade().unwrap(), "start {start}");
        let outcome = migrator.run().unwrap();

        assert_eq!(
            outcome,
            Outcome::Upgraded(Upgrade {
                from: SchemaVersion::new(start),
                to: CURRENT_VERSION,
                applied: (CURRENT_VERSION.get() - start) as usize,
            }),
            "start {start}"
        );
        assert_eq!(stored_version(migrator.provider()), CURRENT_VERSION);
        assert!(!migrator.needs_upgrade().unwrap());
    }
}

#[test]
fn test_upgrade_from_version_one() {
    let (_dir, provider) = database_at(1, true);
    let migrator = Migrator::new(provider);

    let status = migrator.status().unwrap();
    assert_eq!(status.installed, Some(SchemaVersion::new(1)));
    let pending: Vec<u32> = status.pending.iter().map(|p| p.version.get()).collect();
    assert_eq!(pending, (2..=CURRENT_VERSION.get()).collect::<Vec<_>>());

    let upgrade = migrator.upgrade().unwrap();
    assert_eq!(upgrade.from, SchemaVersion::new(1));
    assert_eq!(upgrade.applied, pending.len());
    assert_eq!(stored_version(migrator.provider()), CURRENT_VERSION);
}

#[test]
fn test_legacy_configuration_table_is_detected() {
    let (_dir, provider) = database_at(10, true);

    {
        let conn = provider.acquire().unwrap();
        assert!(!table_exists(&conn, "Configuration"));
        assert_eq!(
            detect::read_marker(&conn).unwrap(),
            VersionMarker::Legacy(SchemaVersion::new(10))
        );
    }

    let migrator = quiet_migrator(provider);
    assert!(migrator.needs_upgrade().unwrap());
    let first = migrator.status().unwrap().pending[0].clone();
    assert_eq!(first.version, SchemaVersion::new(11));
    assert_eq!(first.name, "singular_table_names");

    migrator.upgrade().unwrap();

    let conn = migrator.provider().acquire().unwrap();
    assert!(!table_exists(&conn, "Configurations"));
    assert_eq!(
        detect::read_marker(&conn).unwrap(),
        VersionMarker::Current(CURRENT_VERSION)
    );
}

#[test]
fn test_missing_marker_is_fatal() {
    let (_dir, provider) = temp_provider();
    provider
        .acquire()
        .unwrap()
        .execute_batch("CREATE TABLE Track (TrackID INTEGER);")
        .unwrap();

    let migrator = Migrator::new(provider);
    assert!(matches!(
        migrator.run(),
        Err(Error::VersionDetection { .. })
    ));
}

#[test]
fn test_newer_database_is_rejected() {
    let (_dir, provider) = temp_provider();
    let migrator = Migrator::new(provider);
    migrator.initialize_new_database().unwrap();
    {
        let conn = migrator.provider().acquire().unwrap();
        detect::write_marker(&conn, CURRENT_VERSION.next()).unwrap();
    }

    assert!(!migrator.needs_upgrade().unwrap());
    assert!(matches!(
        migrator.run(),
        Err(Error::UnsupportedVersion { .. })
    ));
    assert_eq!(stored_version(migrator.provider()), CURRENT_VERSION.next());
}

#[test]
fn test_unregistered_versions_are_skipped() {
    let steps: Vec<Migration> = MIGRATIONS
        .iter()
        .filter(|m| m.version.get() != 5 && m.version.get() != 13)
        .copied()
        .collect();
    let registry = Registry::new(Box::leak(steps.into_boxed_slice()));

    let (_dir, provider) = database_at(0, true);
    let migrator = quiet_migrator(provider).with_registry(registry);

    let upgrade = migrator.upgrade().unwrap();
    assert_eq!(upgrade.to, CURRENT_VERSION);
    assert_eq!(upgrade.applied, CURRENT_VERSION.get() as usize - 2);
    assert_eq!(stored_version(migrator.provider()), CURRENT_VERSION);
}

fn add_column_then_fail(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("ALTER TABLE Track ADD Doomed INTEGER;")?;
    conn.execute_batch("INSERT INTO NoSuchTable VALUES (1);")
}

#[test]
fn test_failed_step_keeps_earlier_steps_and_marker() {
    static FAILING: &[Migration] = &[Migration {
        version: SchemaVersion::new(12),
        name: "doomed",
        up: add_column_then_fail,
        compact: false,
    }];
    let steps: Vec<Migration> = MIGRATIONS
        .iter()
        .filter(|m| m.version.get() == 11)
        .chain(FAILING)
        .copied()
        .collect();
    let registry = Registry::new(Box::leak(steps.into_boxed_slice()));

    let (_dir, provider) = database_at(10, false);
    let migrator = quiet_migrator(provider).with_registry(registry);

    let err = migrator.upgrade().unwrap_err();
    assert!(err.is_partial_upgrade());
    assert!(matches!(
        err,
        Error::StepExecution { version, name: "doomed", .. } if version == SchemaVersion::new(12)
    ));

    let conn = migrator.provider().acquire().unwrap();
    // Step 11 committed, the failing step rolled back, the marker is untouched.
    assert!(table_exists(&conn, "Track"));
    assert!(conn.prepare("SELECT Doomed FROM Track").is_err());
    assert_eq!(
        detect::read_marker(&conn).unwrap(),
        VersionMarker::Current(SchemaVersion::new(10))
    );
}

#[test]
fn test_rerun_after_partial_upgrade_fails() {
    // Steps create tables unguarded, so replaying a committed step errors.
    let (_dir, provider) = database_at(15, false);
    {
        let conn = provider.acquire().unwrap();
        common::set_marker(&conn, 14);
    }
    let migrator = quiet_migrator(provider);
    let err = migrator.upgrade().unwrap_err();
    assert!(matches!(
        err,
        Error::StepExecution { version, .. } if version == SchemaVersion::new(15)
    ));
}

#[test]
fn test_detection_on_missing_database_leaves_no_file() {
    let (_dir, provider) = temp_provider();
    let migrator = Migrator::new(provider);

    assert!(matches!(
        migrator.needs_upgrade(),
        Err(Error::VersionDetection { .. })
    ));
    assert!(!migrator.provider().database_exists());
    assert!(!migrator.provider().path().exists());

    assert_eq!(migrator.run().unwrap(), Outcome::Created);
    assert_eq!(stored_version(migrator.provider()), CURRENT_VERSION);
}

#[test]
fn test_failed_bootstrap_rolls_back() {
    let (_dir, provider) = temp_provider();
    provider
        .acquire()
        .unwrap()
        .execute_batch("CREATE TABLE Artist (ArtistID INTEGER);")
        .unwrap();

    let migrator = Migrator::new(provider);
    assert!(matches!(
        migrator.initialize_new_database(),
        Err(Error::Bootstrap(_))
    ));

    let conn = migrator.provider().acquire().unwrap();
    assert!(!table_exists(&conn, "Configuration"));
    assert_eq!(
        detect::read_marker(&conn).unwrap(),
        VersionMarker::NotFound
    );
}
