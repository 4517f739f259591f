//! Consistent snapshot export of a relational database to Avro files.
//!
//! An [`Exporter`] reads every table, model and search index of a database
//! at a single point in time and writes one or more Avro object container
//! files per object, plus a `manifest.json` listing them.

pub mod catalog;
pub use catalog::CatalogReader;

pub mod config;
pub use config::ExportConfig;

mod connect;
pub use connect::connect;

mod export;
pub use export::Exporter;

pub mod manifest;
pub use manifest::Manifest;

pub mod plan;

mod pool;
pub use pool::{Pool, PoolConnection};

pub mod report;
pub use report::{ObjectFailure, RunReport, RunStatus};

pub use dbexport_avro::Codec;
pub use dbexport_core::{
    driver::{Driver, Snapshot, TimestampBound},
    Error, Result,
};
pub use tokio_util::sync::CancellationToken;
