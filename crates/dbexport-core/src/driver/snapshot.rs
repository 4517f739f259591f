use serde::{Deserialize, Serialize};
use std::{any::Any, fmt, sync::Arc};

/// Which point in time a run reads at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampBound {
    /// The latest committed state when the run starts.
    #[default]
    Strong,

    /// A consistency token previously handed out by the same database
    /// (a commit sequence, an exported snapshot id, ...).
    Exact(String),
}

/// The run's read view.
///
/// Cloning is cheap; every clone shares the same token and keeps the
/// driver's guard (an open transaction, a pinned version) alive.
#[derive(Clone)]
pub struct Snapshot {
    token: Arc<str>,
    guard: Option<Arc<dyn Any + Send + Sync>>,
}

impl Snapshot {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into().into(),
            guard: None,
        }
    }

    /// A snapshot that stays valid only while `guard` is alive.
    pub fn with_guard(token: impl Into<String>, guard: impl Any + Send + Sync) -> Self {
        Self {
            token: token.into().into(),
            guard: Some(Arc::new(guard)),
        }
    }

    /// The driver-specific consistency token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("token", &self.token)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}
