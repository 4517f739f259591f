use crate::Result;

use dbexport_core::{driver::Driver, Error};
use std::sync::Arc;
use url::Url;

/// Opens the driver for a connection URL.
///
/// The URL scheme selects the driver; each driver is behind a cargo feature.
pub async fn connect(url: &str) -> Result<Arc<dyn Driver>> {
    let url = Url::parse(url)?;

    match url.scheme() {
        "postgresql" | "postgres" => connect_postgresql(&url).await,
        scheme => Err(Error::invalid_connection_url(format!(
            "unsupported database; scheme={scheme}; url={url}"
        ))),
    }
}

#[cfg(feature = "postgresql")]
async fn connect_postgresql(url: &Url) -> Result<Arc<dyn Driver>> {
    let driver = dbexport_driver_postgresql::PostgreSQL::from_url(url.as_str())?;
    Ok(Arc::new(driver))
}

#[cfg(not(feature = "postgresql"))]
async fn connect_postgresql(_url: &Url) -> Result<Arc<dyn Driver>> {
    Err(Error::invalid_connection_url(
        "`postgresql` feature not enabled",
    ))
}
