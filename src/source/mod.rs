//! Raw table sources and the cache in front of them.
//!
//! The store only talks to the [`TableSource`] and [`TableCache`] ports;
//! concrete implementations are picked at startup from configuration.

mod cache;
mod directory;
mod sheets;

pub use cache::*;
pub use directory::*;
pub use sheets::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::RawTable;

/// The data source could not deliver the requested tables.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unauthorized: {0}")]
    Auth(String),

    #[error("Table not found: {0}")]
    MissingTable(String),

    #[error("Fetch timed out after {0} seconds")]
    Timeout(u64),

    #[error("Data source error: {0}")]
    Service(String),

    #[error("Malformed table data: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplier of raw tables, e.g. a spreadsheet service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Fetch the named tables. Returns exactly one table per name, in order.
    async fn fetch_tables(&self, names: &[String]) -> Result<Vec<RawTable>, SourceError>;
}

/// Cache of previously fetched tables, keyed by table name.
pub trait TableCache: Send + Sync {
    fn get(&self, name: &str) -> anyhow::Result<Option<RawTable>>;
    fn put(&self, name: &str, table: &RawTable) -> anyhow::Result<()>;
    fn invalidate(&self, names: &[String]) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;
}
