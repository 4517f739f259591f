use crate::manifest::ManifestDocument;

use dbexport_core::Error;
use std::{fmt, path::PathBuf};
use uuid::Uuid;

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every object was exported.
    Succeeded,

    /// Some objects failed; the others were exported.
    PartiallySucceeded,

    /// The run as a whole failed, or every object did.
    Failed,
}

/// An object that could not be exported, and why.
#[derive(Debug, Clone)]
pub struct ObjectFailure {
    pub object: String,
    pub error: Error,
}

#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,

    /// The consistency token every read used, once acquired.
    pub snapshot: Option<String>,

    /// Set when the run itself failed (snapshot, catalog, deadline,
    /// cancellation). No manifest is written in that case.
    pub error: Option<Error>,

    /// Every failed object, in manifest order.
    pub failures: Vec<ObjectFailure>,

    pub manifest: Option<ManifestDocument>,

    /// Where the manifest was written.
    pub manifest_path: Option<PathBuf>,
}

impl RunReport {
    pub(crate) fn failed(run_id: Uuid, snapshot: Option<String>, error: Error) -> Self {
        Self {
            run_id,
            status: RunStatus::Failed,
            snapshot,
            error: Some(error),
            failures: vec![],
            manifest: None,
            manifest_path: None,
        }
    }

    pub(crate) fn status_for(objects: usize, failed: usize) -> RunStatus {
        match failed {
            0 => RunStatus::Succeeded,
            failed if failed == objects => RunStatus::Failed,
            _ => RunStatus::PartiallySucceeded,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    /// The failure of `object`, if it failed.
    pub fn failure(&self, object: &str) -> Option<&Error> {
        self.failures
            .iter()
            .find(|failure| failure.object == object)
            .map(|failure| &failure.error)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::PartiallySucceeded => "partially succeeded",
            RunStatus::Failed => "failed",
        })
    }
}
