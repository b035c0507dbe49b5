use async_trait::async_trait;

pub use catalog_core::{CatalogDocument, PublishedExtension};

use crate::error::Result;

pub mod fs;

/// Storage backend for the local catalog mirror
#[async_trait]
pub trait Registry: Send + Sync {
    /// The full catalog document, in wire format
    async fn document(&self) -> Result<CatalogDocument>;

    /// A single published extension by its `publisher.extension` id
    async fn get(&self, id: &str) -> Result<PublishedExtension>;
}
