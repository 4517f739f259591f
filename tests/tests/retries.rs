use tests::{db::memory::SetupMemory, *};

use dbexport::{manifest::ObjectStatus, RunStatus};

async fn setup() -> SetupMemory {
    let setup = SetupMemory::google_standard_sql();
    create_singers(&setup, "T_Singers").await;
    setup.insert("T_Singers", singers(50)).await;
    create_singers(&setup, "T_Albums").await;
    setup.insert("T_Albums", singers(5)).await;
    setup
}

#[tokio::test]
async fn transient_read_failures_are_retried() {
    let setup = setup().await;
    setup.db.fail_reads("T_Singers", 2, true);

    let export = export(&setup, |config| config.rows_per_shard(10).max_attempts(5)).await;

    assert!(export.report.is_success(), "{:?}", export.report);
    // Rows of failed attempts are discarded with their file.
    assert_eq!(ids(&export.records("T_Singers")), (1..=50).collect::<Vec<_>>());
    assert!(export
        .dir_entries()
        .iter()
        .all(|entry| !entry.ends_with(".inprogress")));
}

#[tokio::test]
async fn exhausted_retries_fail_only_the_table() {
    let setup = setup().await;
    setup.db.fail_reads("T_Singers", 100, true);

    let export = export(&setup, |config| config.max_attempts(3)).await;

    assert_eq!(export.report.status, RunStatus::PartiallySucceeded);
    assert_eq!(export.status("T_Albums"), &ObjectStatus::Complete);
    assert_eq!(export.records("T_Albums").len(), 5);

    let err = export.report.failure("T_Singers").unwrap();
    assert!(err.is_shard_read(), "{err}");
    assert_eq!(err.object(), Some("T_Singers"));
    assert!(
        err.to_string()
            .starts_with("shard read failed: object=T_Singers shard=0 attempts=3"),
        "{err}"
    );
    assert!(export.manifest().files("T_Singers").is_empty());
}

#[tokio::test]
async fn permanent_read_failures_are_not_retried() {
    let setup = setup().await;
    setup.db.fail_reads("T_Singers", 1, false);

    let export = export(&setup, |config| config.max_attempts(5)).await;

    let err = export.report.failure("T_Singers").unwrap();
    assert!(err.to_string().contains("attempts=1"), "{err}");

    let ObjectStatus::Failed { reason } = export.status("T_Singers") else {
        panic!("T_Singers did not fail");
    };
    assert_eq!(reason, &err.to_string());
}

#[tokio::test]
async fn every_failed_object_fails_the_run() {
    let setup = SetupMemory::google_standard_sql();
    create_singers(&setup, "T_Singers").await;
    setup.insert("T_Singers", singers(3)).await;
    setup.db.fail_reads("T_Singers", 10, false);

    let export = export(&setup, |config| config).await;

    assert_eq!(export.report.status, RunStatus::Failed);
    // The manifest still records why.
    assert!(matches!(
        export.status("T_Singers"),
        ObjectStatus::Failed { .. }
    ));
    assert!(export.report.manifest_path.is_some());
}
