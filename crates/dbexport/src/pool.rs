//! Session pooling for shard reads.

use crate::Result;

use dbexport_core::{
    driver::{Capability, Connection, Driver},
    err, Error,
};
use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

/// A pool of database sessions, bounded by the run's concurrency limit and
/// by the driver's own session limit.
#[derive(Debug)]
pub struct Pool {
    inner: deadpool::managed::Pool<Manager>,
    driver: Arc<dyn Driver>,
}

impl Pool {
    pub fn new(driver: Arc<dyn Driver>, max_size: usize) -> Result<Self> {
        let max_size = match driver.max_connections() {
            Some(max_connections) => max_size.min(max_connections),
            None => max_size,
        };

        let inner = deadpool::managed::Pool::builder(Manager {
            driver: driver.clone(),
        })
        .max_size(max_size.max(1))
        .build()
        .map_err(|e| err!("failed to build connection pool: {e}"))?;

        Ok(Self { inner, driver })
    }

    /// Retrieves a session, opening one if none is idle.
    pub async fn get(&self) -> Result<PoolConnection> {
        let connection = self.inner.get().await.map_err(|e| match e {
            deadpool::managed::PoolError::Backend(e) => e,
            e => err!("connection pool: {e}"),
        })?;
        Ok(PoolConnection { inner: connection })
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn capability(&self) -> &'static Capability {
        self.driver.capability()
    }
}

#[derive(Debug)]
struct Manager {
    driver: Arc<dyn Driver>,
}

impl deadpool::managed::Manager for Manager {
    type Type = Box<dyn Connection>;
    type Error = Error;

    async fn create(&self) -> core::result::Result<Self::Type, Self::Error> {
        self.driver.connect().await
    }

    async fn recycle(
        &self,
        _obj: &mut Self::Type,
        _metrics: &deadpool::managed::Metrics,
    ) -> deadpool::managed::RecycleResult<Self::Error> {
        Ok(())
    }
}

/// A session retrieved from a [`Pool`].
///
/// When dropped, the session is returned to the pool for reuse.
pub struct PoolConnection {
    inner: deadpool::managed::Object<Manager>,
}

impl PoolConnection {
    /// Closes the session instead of returning it to the pool. Used after a
    /// transient failure, which may have left the session unusable.
    pub fn discard(self) {
        drop(deadpool::managed::Object::take(self.inner));
    }
}

impl Deref for PoolConnection {
    type Target = Box<dyn Connection>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PoolConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
