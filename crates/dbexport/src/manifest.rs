//! The export manifest: which files each object produced.

use crate::Result;

use dbexport_avro::Written;
use dbexport_core::{Dialect, Error};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};
use uuid::Uuid;

/// File name of the manifest inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// The run's record of produced files, shared by every object task.
///
/// Recording never fails and never drops a file: an object that fails after
/// some of its shards were committed keeps those files, and its status says
/// why the set is incomplete.
#[derive(Debug, Default)]
pub struct Manifest {
    objects: Mutex<IndexMap<String, ObjectEntry>>,
}

/// The finalized manifest, as written to `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestDocument {
    pub run_id: Uuid,
    pub dialect: Dialect,
    pub snapshot: String,

    /// Objects ordered by name
    pub objects: IndexMap<String, ObjectEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// `TABLE`, `MODEL` or `SEARCH_INDEX`
    pub kind: String,

    #[serde(flatten)]
    pub status: ObjectStatus,

    /// Records across every file of the object
    pub records: u64,

    /// Files in shard order
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ObjectStatus {
    Pending,
    Complete,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub shard: usize,
    pub records: u64,
    pub bytes: u64,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object in the pending state.
    pub fn register(&self, name: &str, kind: &str) {
        self.lock().entry(name.to_string()).or_insert(ObjectEntry {
            kind: kind.to_string(),
            status: ObjectStatus::Pending,
            records: 0,
            files: vec![],
        });
    }

    /// Records a committed shard file of `object`.
    pub fn record_file(&self, object: &str, shard: usize, written: &Written) {
        let mut objects = self.lock();
        let entry = objects
            .entry(object.to_string())
            .or_insert_with(|| ObjectEntry {
                kind: String::new(),
                status: ObjectStatus::Pending,
                records: 0,
                files: vec![],
            });

        entry.records += written.records;
        entry.files.push(FileEntry {
            name: written.file_name.clone(),
            shard,
            records: written.records,
            bytes: written.bytes,
        });
    }

    pub fn complete(&self, object: &str) {
        self.set_status(object, ObjectStatus::Complete);
    }

    pub fn fail(&self, object: &str, error: &Error) {
        self.set_status(
            object,
            ObjectStatus::Failed {
                reason: error.to_string(),
            },
        );
    }

    /// The status of `object`, if registered.
    pub fn status(&self, object: &str) -> Option<ObjectStatus> {
        self.lock().get(object).map(|entry| entry.status.clone())
    }

    /// Produces the final listing: objects by name, files by shard.
    pub fn finish(&self, run_id: Uuid, dialect: Dialect, snapshot: &str) -> ManifestDocument {
        let mut objects = self.lock().clone();

        objects.sort_keys();
        for entry in objects.values_mut() {
            entry.files.sort_by_key(|file| file.shard);
        }

        ManifestDocument {
            run_id,
            dialect,
            snapshot: snapshot.to_string(),
            objects,
        }
    }

    fn set_status(&self, object: &str, status: ObjectStatus) {
        if let Some(entry) = self.lock().get_mut(object) {
            entry.status = status;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexMap<String, ObjectEntry>> {
        // Entries are updated in single statements, so a panic while holding
        // the lock cannot leave one half written.
        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ManifestDocument {
    /// Writes the document to `<dir>/manifest.json`, replacing it atomically.
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        let temp = dir.join(format!(".{MANIFEST_FILE}.inprogress"));

        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &path).await?;

        Ok(path)
    }

    /// Reads a manifest written by [`write_to`](Self::write_to).
    pub async fn read_from(dir: &Path) -> Result<ManifestDocument> {
        let json = tokio::fs::read(dir.join(MANIFEST_FILE)).await?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Names of the files of `object`, in shard order.
    pub fn files(&self, object: &str) -> Vec<&str> {
        self.objects
            .get(object)
            .map(|entry| entry.files.iter().map(|file| &file.name[..]).collect())
            .unwrap_or_default()
    }
}
