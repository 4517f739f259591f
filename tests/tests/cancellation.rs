use tests::{db::memory::SetupMemory, *};

use dbexport::{CancellationToken, RunStatus};
use std::{sync::Arc, time::Duration};

async fn setup() -> Arc<SetupMemory> {
    let setup = SetupMemory::google_standard_sql();
    create_singers(&setup, "T_Singers").await;
    setup.insert("T_Singers", singers(100)).await;
    Arc::new(setup)
}

#[tokio::test]
async fn cancelled_run_fails_without_manifest() {
    let setup = setup().await;
    let hold = setup.db.hold_reads();
    let mut snapshots = setup.db.subscribe_snapshots();
    let cancel = CancellationToken::new();

    let task = tokio::spawn({
        let setup = setup.clone();
        let cancel = cancel.clone();
        async move { export_until(&*setup, cancel, |config| config.rows_per_shard(10)).await }
    });

    snapshots.wait_for(Option::is_some).await.unwrap();
    cancel.cancel();

    let export = task.await.unwrap();
    drop(hold);

    assert_eq!(export.report.status, RunStatus::Failed);
    let err = export.report.error.as_ref().unwrap();
    assert!(err.is_cancelled(), "{err}");
    assert!(export.report.manifest.is_none());

    // Nothing was committed and partial files are gone.
    assert!(
        export
            .dir_entries()
            .iter()
            .all(|entry| !entry.ends_with(".inprogress") && entry != "manifest.json"),
        "{:?}",
        export.dir_entries()
    );
}

#[tokio::test]
async fn deadline_fails_the_run() {
    let setup = setup().await;
    let _hold = setup.db.hold_reads();

    let export = export(&*setup, |config| {
        config.deadline(Duration::from_millis(50))
    })
    .await;

    assert_eq!(export.report.status, RunStatus::Failed);
    let err = export.report.error.as_ref().unwrap();
    assert!(err.is_timeout(), "{err}");
    assert_eq!(err.to_string(), "export timed out after 50ms");
    assert!(export.report.manifest.is_none());
    assert!(!export.dir_entries().contains(&"manifest.json".to_string()));
}
