use crate::Setup;

use std::sync::{Arc, Once};

/// Runs a test on its own runtime and cleans the setup up afterwards, even
/// when the test panics.
pub struct ExportTest<S: Setup> {
    runtime: tokio::runtime::Runtime,
    setup: Arc<S>,
}

impl<S: Setup> ExportTest<S> {
    /// Create a new ExportTest with a current-thread runtime.
    pub fn new(setup: S) -> Self {
        init_logging();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create Tokio runtime");

        Self {
            runtime,
            setup: Arc::new(setup),
        }
    }

    pub fn run_test<F, Fut>(&mut self, test_fn: F)
    where
        F: FnOnce(Arc<S>) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        self.runtime.block_on(test_fn(self.setup.clone()));
    }
}

impl<S: Setup> Drop for ExportTest<S> {
    fn drop(&mut self) {
        let setup = self.setup.clone();
        self.runtime.block_on(async move {
            let _ = setup.cleanup().await;
        });
    }
}

fn init_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
