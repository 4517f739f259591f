//! Retries with exponential backoff and jitter.

use crate::{ExportConfig, Result};

use dbexport_core::Error;
use rand::Rng;
use std::{future::Future, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The last error of an operation that will not be retried again.
#[derive(Debug)]
pub(super) struct Exhausted {
    pub(super) error: Error,

    /// Attempts made, including the failed one
    pub(super) attempts: u32,
}

impl Exhausted {
    pub(super) fn into_error(self) -> Error {
        self.error
    }
}

/// Retry delays: doubling from `initial` up to `max`, each stretched by up
/// to half again at random.
#[derive(Debug)]
pub(super) struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub(super) fn new(initial: Duration, max: Duration) -> Self {
        Self { next: initial, max }
    }

    pub(super) fn next_delay(&mut self) -> Duration {
        let base = self.next.min(self.max);
        self.next = (self.next * 2).min(self.max);

        let jitter = rand::thread_rng().gen_range(0.0..=0.5);
        base.mul_f64(1.0 + jitter)
    }
}

/// Runs `op` until it succeeds, fails permanently, or has been attempted
/// `max_attempts` times. `op` receives the attempt number, starting at 1.
pub(super) async fn retry<T, F, Fut>(
    config: &ExportConfig,
    cancel: &CancellationToken,
    mut op: F,
) -> std::result::Result<T, Exhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut backoff = Backoff::new(config.initial_backoff, config.max_backoff);
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let error = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !error.is_transient() || attempt >= max_attempts {
            return Err(Exhausted {
                error,
                attempts: attempt,
            });
        }

        let delay = backoff.next_delay();
        debug!(attempt, ?delay, %error, "transient failure; retrying");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(Exhausted {
                    error: Error::cancelled(),
                    attempts: attempt,
                })
            }
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }
}
