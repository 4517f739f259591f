//! Objects that change between the snapshot and the end of their export.

use tests::{db::memory::SetupMemory, *};

use dbexport::{manifest::ObjectStatus, RunStatus, TimestampBound};
use dbexport_core::schema::{Field, Object};
use std::{sync::Arc, time::Duration};

async fn setup() -> SetupMemory {
    let setup = SetupMemory::google_standard_sql();
    create_singers(&setup, "T_Singers").await;
    setup.insert("T_Singers", singers(10)).await;
    create_singers(&setup, "T_Albums").await;
    setup.insert("T_Albums", singers(3)).await;
    setup
        .db
        .create(Object::search_index(
            "SingersByName",
            "T_Singers",
            vec!["name".to_string()],
        ))
        .unwrap();
    setup
}

#[tokio::test]
async fn dropped_table_and_its_index_fail_with_drift() {
    let setup = setup().await;
    let snapshot = setup.db.latest().to_string();

    setup.db.drop_object("SingersByName").unwrap();
    setup.db.drop_object("T_Singers").unwrap();

    let export = export(&setup, |config| {
        config.snapshot(TimestampBound::Exact(snapshot))
    })
    .await;

    assert_eq!(export.report.status, RunStatus::PartiallySucceeded);
    assert_eq!(export.status("T_Albums"), &ObjectStatus::Complete);

    let table = export.report.failure("T_Singers").unwrap();
    assert!(table.is_catalog_drift(), "{table}");
    assert!(!table.is_transient());

    let index = export.report.failure("SingersByName").unwrap();
    assert!(index.is_catalog_drift(), "{index}");
    assert_eq!(index.object(), Some("SingersByName"));
}

#[tokio::test]
async fn index_with_dropped_base_table_fails_with_drift() {
    let setup = setup().await;
    let snapshot = setup.db.latest().to_string();

    // The index itself survives; only its base table is gone.
    setup.db.drop_object("T_Singers").unwrap();

    let export = export(&setup, |config| {
        config.snapshot(TimestampBound::Exact(snapshot))
    })
    .await;

    let index = export.report.failure("SingersByName").unwrap();
    assert!(index.is_catalog_drift(), "{index}");
    assert_eq!(
        index.to_string(),
        "catalog drift: object=SingersByName base table T_Singers no longer exists"
    );

    // Its schema file was committed before the check.
    assert_eq!(export.manifest().files("SingersByName").len(), 1);
}

#[tokio::test]
async fn table_redefined_during_export_fails_with_drift() {
    let setup = Arc::new(setup().await);

    let hold = setup.db.hold_reads();
    let mut snapshots = setup.db.subscribe_snapshots();

    let task = tokio::spawn({
        let setup = setup.clone();
        async move { export(&*setup, |config| config).await }
    });

    snapshots.wait_for(Option::is_some).await.unwrap();
    // Let the run read its catalog and block on the first shard read.
    tokio::time::sleep(Duration::from_millis(100)).await;

    setup.db.drop_object("T_Albums").unwrap();
    setup
        .db
        .create(Object::table(
            "T_Albums",
            vec![Field::new("id", "STRING(36)").not_null()],
            vec!["id".to_string()],
        ))
        .unwrap();

    hold.release();
    let export = task.await.unwrap();

    let err = export.report.failure("T_Albums").unwrap();
    assert!(err.is_catalog_drift(), "{err}");
    assert_eq!(export.status("T_Singers"), &ObjectStatus::Complete);
}
