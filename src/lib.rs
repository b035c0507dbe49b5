//! Client and local mirror for the Podman Desktop extensions catalog.
//!
//! [`ExtensionsCatalog`] fetches the remote catalog through the configured
//! proxy and CA certificates and maps it into [`CatalogExtension`] values.
//! The [`api`] module serves a catalog file over HTTP for offline use.
//!
//! # Example
//!
//! ```ignore
//! use extensions_catalog::{Config, ExtensionsCatalog};
//!
//! let config = Config::default();
//! let catalog = ExtensionsCatalog::from_config(&config);
//! for ext in catalog.get_fetchable_extensions().await {
//!     println!("{} {}", ext.extension_id, ext.link);
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod certificates;
pub mod config;
pub mod error;
pub mod proxy;
pub mod registry;

pub use catalog::{
    CatalogSettings, ExtensionsCatalog, HttpOptions, ProxyAgents, DEFAULT_EXTENSIONS_URL,
};
pub use catalog_core::{CatalogExtension, CatalogVersion, FetchableExtension};
pub use certificates::{Certificates, PemCertificates};
pub use config::{Config, ConfigurationRegistry};
pub use error::{Error, Result};
pub use proxy::{Proxy, ProxySettings, ProxyState};
pub use registry::fs::FilesystemRegistry;
pub use registry::Registry;
