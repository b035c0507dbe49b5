use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{Error, Result};
use crate::registry::{CatalogDocument, PublishedExtension, Registry};

/// Registry backed by a single catalog JSON file
///
/// The file is read on every request, so edits are served without a restart.
pub struct FilesystemRegistry {
    path: PathBuf,
}

impl FilesystemRegistry {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn read_document(&self) -> Result<CatalogDocument> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|_| Error::NotFound(self.path.display().to_string()))?;
        let document: CatalogDocument = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} extension(s) from {}",
            document.extensions.len(),
            self.path.display()
        );
        Ok(document)
    }
}

#[async_trait]
impl Registry for FilesystemRegistry {
    async fn document(&self) -> Result<CatalogDocument> {
        self.read_document().await
    }

    async fn get(&self, id: &str) -> Result<PublishedExtension> {
        let document = self.read_document().await?;
        document
            .find(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}
