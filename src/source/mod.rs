//! Abandoned-cart record sources
//!
//! The analytical store producing abandoned carts lives outside this crate.
//! A [`CartSource`] hands over its rows, fully materialized, before a sync
//! run starts.

pub mod file;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::models::InputRecord;

pub use file::FileSource;

/// Producer of abandoned-cart records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Fetch every record for this run, in source order
    async fn fetch(&self) -> Result<Vec<InputRecord>, SourceError>;
}

/// In-memory source
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<InputRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<InputRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl CartSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Vec<InputRecord>, SourceError> {
        Ok(self.records.clone())
    }
}
