//! Read gating and fault injection.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::sync::watch;

#[derive(Debug)]
pub(crate) struct Faults {
    /// Number of outstanding [`ReadHold`]s
    held: Arc<watch::Sender<usize>>,

    failures: Mutex<HashMap<String, Failure>>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Failure {
    remaining: u32,
    pub(crate) transient: bool,
}

/// Keeps shard reads blocked while alive.
#[derive(Debug)]
#[must_use = "reads resume as soon as the hold is dropped"]
pub struct ReadHold {
    held: Arc<watch::Sender<usize>>,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            held: Arc::new(watch::channel(0).0),
            failures: Mutex::default(),
        }
    }
}

impl Faults {
    pub(crate) fn hold(&self) -> ReadHold {
        self.held.send_modify(|held| *held += 1);
        ReadHold {
            held: self.held.clone(),
        }
    }

    /// Waits until no hold is outstanding.
    pub(crate) async fn wait_released(&self) {
        let mut rx = self.held.subscribe();
        // The sender lives as long as `self`, so this only ends on release.
        let _ = rx.wait_for(|held| *held == 0).await;
    }

    pub(crate) fn fail(&self, table: &str, count: u32, transient: bool) {
        self.failures().insert(
            table.to_string(),
            Failure {
                remaining: count,
                transient,
            },
        );
    }

    /// Consumes one injected failure of `table`, if any is left.
    pub(crate) fn take_failure(&self, table: &str) -> Option<Failure> {
        let mut failures = self.failures();
        let failure = failures.get_mut(table)?;

        if failure.remaining == 0 {
            failures.remove(table);
            return None;
        }

        failure.remaining -= 1;
        Some(*failure)
    }

    fn failures(&self) -> std::sync::MutexGuard<'_, HashMap<String, Failure>> {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ReadHold {
    pub fn release(self) {}
}

impl Drop for ReadHold {
    fn drop(&mut self) {
        self.held.send_modify(|held| *held -= 1);
    }
}
