//! CA certificates trusted for outbound catalog requests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Source of certificate authorities, one PEM-encoded certificate per entry.
#[async_trait]
pub trait Certificates: Send + Sync {
    async fn get_all_certificates(&self) -> Vec<String>;
}

#[async_trait]
impl Certificates for Vec<String> {
    async fn get_all_certificates(&self) -> Vec<String> {
        self.clone()
    }
}

/// Certificates read from PEM files and directories.
///
/// Paths are read on every call so bundles can be rotated without a restart.
pub struct PemCertificates {
    paths: Vec<PathBuf>,
}

impl PemCertificates {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    async fn read_path(path: &Path, out: &mut Vec<String>) {
        let is_dir = fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false);
        if !is_dir {
            Self::read_file(path, out).await;
            return;
        }

        let mut files = Vec::new();
        match fs::read_dir(path).await {
            Ok(mut entries) => {
                while let Ok(Some(entry)) = entries.next_entry().await {
                    if matches!(entry.file_type().await, Ok(t) if t.is_file()) {
                        files.push(entry.path());
                    }
                }
            }
            Err(e) => {
                warn!("Skipping certificate directory {}: {}", path.display(), e);
                return;
            }
        }
        files.sort();
        for file in files {
            Self::read_file(&file, out).await;
        }
    }

    async fn read_file(path: &Path, out: &mut Vec<String>) {
        let content = match fs::read(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping certificate file {}: {}", path.display(), e);
                return;
            }
        };
        match split_pem_bundle(&content) {
            Ok(found) => {
                debug!("Loaded {} certificate(s) from {}", found.len(), path.display());
                out.extend(found);
            }
            Err(e) => warn!("Skipping certificate file {}: {}", path.display(), e),
        }
    }
}

#[async_trait]
impl Certificates for PemCertificates {
    async fn get_all_certificates(&self) -> Vec<String> {
        let mut certs = Vec::new();
        for path in &self.paths {
            Self::read_path(path, &mut certs).await;
        }
        certs
    }
}

/// Splits a PEM bundle into individual certificates, re-encoded one per entry.
///
/// Blocks with another tag (private keys, CRLs) are dropped.
pub fn split_pem_bundle(content: &[u8]) -> Result<Vec<String>, pem::PemError> {
    Ok(pem::parse_many(content)?
        .iter()
        .filter(|block| block.tag() == CERTIFICATE_TAG)
        .map(pem::encode)
        .collect())
}
