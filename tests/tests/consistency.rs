//! Every shard reads the state as of the run's snapshot.

use tests::{db::memory::SetupMemory, *};

use dbexport::{RunStatus, TimestampBound};
use dbexport_core::stmt::{Key, Value};
use std::sync::Arc;

#[tokio::test]
async fn writes_after_the_snapshot_are_not_exported() {
    let setup = Arc::new(SetupMemory::google_standard_sql());
    create_singers(&*setup, "T_Singers").await;
    setup.insert("T_Singers", singers(100)).await;

    let hold = setup.db.hold_reads();
    let mut snapshots = setup.db.subscribe_snapshots();

    let task = tokio::spawn({
        let setup = setup.clone();
        async move { export(&*setup, |config| config.rows_per_shard(10)).await }
    });

    snapshots.wait_for(Option::is_some).await.unwrap();

    // Race the export: new rows, a changed row and a deleted row.
    let more = singers(150).split_off(100);
    setup.db.insert("T_Singers", more).unwrap();
    setup
        .db
        .insert("T_Singers", vec![row!(5, "renamed", 0.0)])
        .unwrap();
    setup
        .db
        .delete("T_Singers", vec![Key::from(Value::I64(1))])
        .unwrap();

    hold.release();
    let export = task.await.unwrap();

    assert!(export.report.is_success(), "{:?}", export.report);

    let records = export.records("T_Singers");
    assert_eq!(ids(&records), (1..=100).collect::<Vec<_>>());

    let fifth = records
        .iter()
        .find(|record| column(record, "id") == &apache_avro::types::Value::Long(5))
        .unwrap();
    assert_eq!(
        column(fifth, "name"),
        &apache_avro::types::Value::String("singer-5".into())
    );
}

#[tokio::test]
async fn exact_snapshot_reproduces_an_earlier_run() {
    let setup = SetupMemory::google_standard_sql();
    create_singers(&setup, "T_Singers").await;
    setup.insert("T_Singers", singers(40)).await;

    let first = export(&setup, |config| config).await;
    let token = first.report.snapshot.clone().unwrap();

    setup.insert("T_Singers", singers(60).split_off(40)).await;

    let second = export(&setup, |config| {
        config.snapshot(TimestampBound::Exact(token.clone()))
    })
    .await;

    assert!(second.report.is_success(), "{:?}", second.report);
    assert_eq!(second.report.snapshot.as_deref(), Some(&token[..]));
    assert_eq!(
        ids(&second.records("T_Singers")),
        ids(&first.records("T_Singers"))
    );

    let latest = export(&setup, |config| config).await;
    assert_eq!(latest.records("T_Singers").len(), 60);
}

#[tokio::test]
async fn unknown_snapshot_fails_the_run() {
    let setup = SetupMemory::google_standard_sql();
    create_singers(&setup, "T_Singers").await;

    let export = export(&setup, |config| {
        config.snapshot(TimestampBound::Exact("999999".to_string()))
    })
    .await;

    assert_eq!(export.report.status, RunStatus::Failed);
    let err = export.report.error.as_ref().unwrap();
    assert!(err.is_snapshot_acquisition(), "{err}");
    assert!(export.report.manifest.is_none());
    assert!(export.dir_entries().is_empty());
}
