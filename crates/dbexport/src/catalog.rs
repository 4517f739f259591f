//! The schema catalog reader.

use crate::{Pool, Result};

use dbexport_core::{
    driver::{
        operation::{DescribeObject, ReadCatalog},
        Snapshot,
    },
    schema::{Catalog, Object, ObjectKind},
    Error,
};

/// Reads object definitions for one run.
///
/// [`read`](Self::read) observes the run's snapshot, so the catalog matches
/// the rows. [`verify`](Self::verify) observes the latest state, to detect an
/// object that changed or disappeared while it was being exported.
#[derive(Debug)]
pub struct CatalogReader<'a> {
    pool: &'a Pool,
    snapshot: &'a Snapshot,
}

impl<'a> CatalogReader<'a> {
    pub fn new(pool: &'a Pool, snapshot: &'a Snapshot) -> Self {
        Self { pool, snapshot }
    }

    /// Enumerates every exportable object as of the snapshot.
    pub async fn read(&self) -> Result<Catalog> {
        let mut connection = self.pool.get().await?;
        let catalog = connection
            .exec(self.snapshot, ReadCatalog {}.into())
            .await?
            .into_catalog()?;

        let capability = self.pool.capability();
        if catalog.dialect != capability.dialect {
            dbexport_core::bail!(
                "driver returned a {} catalog for a {} database",
                catalog.dialect,
                capability.dialect
            );
        }

        Ok(catalog)
    }

    /// Fails with a catalog drift error if `object` no longer matches the
    /// database.
    ///
    /// A search index also drifts when its base table is gone.
    pub async fn verify(&self, object: &Object) -> Result<()> {
        let current = self.describe(&object.name).await?;

        match current {
            None => {
                return Err(Error::catalog_drift(
                    &object.name,
                    format!("{} no longer exists", object.kind_name().to_lowercase()),
                ))
            }
            Some(current) if current != *object => {
                return Err(Error::catalog_drift(
                    &object.name,
                    "definition changed during export",
                ))
            }
            Some(_) => {}
        }

        if let ObjectKind::SearchIndex { table, .. } = &object.kind {
            if self.describe(table).await?.is_none() {
                return Err(Error::catalog_drift(
                    &object.name,
                    format!("base table {table} no longer exists"),
                ));
            }
        }

        Ok(())
    }

    async fn describe(&self, name: &str) -> Result<Option<Object>> {
        let mut connection = self.pool.get().await?;
        connection
            .exec(
                self.snapshot,
                DescribeObject {
                    name: name.to_string(),
                }
                .into(),
            )
            .await?
            .into_object()
    }
}
