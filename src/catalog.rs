//! Remote extensions catalog client.
//!
//! Fetches the catalog document, honoring proxy and CA certificate settings,
//! and maps it into [`CatalogExtension`] values.

use std::sync::Arc;
use std::time::Duration;

use catalog_core::{CatalogDocument, CatalogExtension, FetchableExtension, PublishedExtension};
use reqwest::Url;
use tracing::{debug, error, info, warn};

use crate::certificates::{Certificates, PemCertificates};
use crate::config::{Config, ConfigurationRegistry, REGISTRY_URL_KEY};
use crate::error::{Error, Result};
use crate::proxy::Proxy;

pub const DEFAULT_EXTENSIONS_URL: &str = "https://registry.podman-desktop.io/api/extensions.json";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed settings of a catalog client.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// Used when the configuration has no `extensions.registryUrl`.
    pub default_url: String,
    /// Bound on the whole request, body included.
    pub timeout: Duration,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            default_url: DEFAULT_EXTENSIONS_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Proxy endpoints per protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAgents {
    pub http: Option<Url>,
    pub https: Option<Url>,
    pub no_proxy: Option<String>,
}

/// Options used to build the HTTP client for one catalog request.
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    /// Present only when the proxy is enabled.
    pub agent: Option<ProxyAgents>,
    /// PEM certificates trusted in addition to the system roots.
    pub certificate_authority: Vec<String>,
}

impl HttpOptions {
    pub fn build_client(&self, timeout: Duration) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("extensions-catalog/", env!("CARGO_PKG_VERSION")));

        let mut routed = false;
        if let Some(agent) = &self.agent {
            let no_proxy = agent
                .no_proxy
                .as_deref()
                .and_then(reqwest::NoProxy::from_string);
            if let Some(url) = &agent.http {
                let proxy = reqwest::Proxy::http(url.as_str())?.no_proxy(no_proxy.clone());
                builder = builder.proxy(proxy);
                routed = true;
            }
            if let Some(url) = &agent.https {
                let proxy = reqwest::Proxy::https(url.as_str())?.no_proxy(no_proxy);
                builder = builder.proxy(proxy);
                routed = true;
            }
        }
        // Proxy settings come from configuration only, never the process environment
        if !routed {
            builder = builder.no_proxy();
        }

        for pem in &self.certificate_authority {
            match reqwest::Certificate::from_pem(pem.as_bytes()) {
                Ok(cert) => builder = builder.add_root_certificate(cert),
                Err(e) => warn!("Ignoring invalid CA certificate: {}", e),
            }
        }

        Ok(builder.build()?)
    }
}

/// Client for the remote extensions catalog.
pub struct ExtensionsCatalog {
    settings: CatalogSettings,
    proxy: Arc<Proxy>,
    certificates: Arc<dyn Certificates>,
    configuration: Arc<dyn ConfigurationRegistry>,
}

impl ExtensionsCatalog {
    pub fn new(
        settings: CatalogSettings,
        proxy: Arc<Proxy>,
        certificates: Arc<dyn Certificates>,
        configuration: Arc<dyn ConfigurationRegistry>,
    ) -> Self {
        Self {
            settings,
            proxy,
            certificates,
            configuration,
        }
    }

    /// Wire a catalog client from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CatalogSettings {
                default_url: DEFAULT_EXTENSIONS_URL.to_string(),
                timeout: config.timeout(),
            },
            Arc::new(Proxy::from_config(&config.proxy)),
            Arc::new(PemCertificates::new(config.certificates.clone())),
            Arc::new(config.clone()),
        )
    }

    pub fn proxy(&self) -> &Arc<Proxy> {
        &self.proxy
    }

    /// The configured override if set and non-blank, else the default URL.
    pub fn catalog_url(&self) -> String {
        self.configuration
            .get_value(REGISTRY_URL_KEY)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.settings.default_url.clone())
    }

    pub async fn http_options(&self) -> Result<HttpOptions> {
        let state = self.proxy.state();

        let agent = if state.enabled {
            Some(ProxyAgents {
                http: state.settings.http().map(parse_proxy_url).transpose()?,
                https: state.settings.https().map(parse_proxy_url).transpose()?,
                no_proxy: state.settings.no_proxy.clone(),
            })
        } else {
            None
        };

        Ok(HttpOptions {
            agent,
            certificate_authority: self.certificates.get_all_certificates().await,
        })
    }

    /// Fetch and map the catalog, surfacing any failure.
    ///
    /// Entries that cannot be mapped are skipped with a warning.
    pub async fn fetch_extensions(&self) -> Result<Vec<CatalogExtension>> {
        let url = self.catalog_url();
        let client = self.http_options().await?.build_client(self.settings.timeout)?;

        debug!("Fetching extensions catalog from {}", url);
        let response = client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        let document: CatalogDocument = serde_json::from_slice(&body)?;
        let extensions = map_extensions(document.extensions);

        info!("Fetched {} extension(s) from {}", extensions.len(), url);
        Ok(extensions)
    }

    /// Fetch the catalog, degrading any failure to an empty list.
    pub async fn get_extensions(&self) -> Vec<CatalogExtension> {
        match self.fetch_extensions().await {
            Ok(extensions) => extensions,
            Err(e) => {
                error!("Unable to fetch the available extensions: {}", e);
                Vec::new()
            }
        }
    }

    /// Installable `(id, link)` pairs, linking each extension's latest version.
    pub async fn get_fetchable_extensions(&self) -> Vec<FetchableExtension> {
        self.get_extensions()
            .await
            .iter()
            .filter_map(CatalogExtension::to_fetchable)
            .collect()
    }

    /// Like [`Self::get_fetchable_extensions`], but errors propagate and,
    /// when `host` is given, each link targets the newest compatible version.
    pub async fn fetch_fetchable_extensions(
        &self,
        host: Option<&semver::Version>,
    ) -> Result<Vec<FetchableExtension>> {
        let extensions = self.fetch_extensions().await?;
        Ok(extensions
            .iter()
            .filter_map(|ext| {
                let version = match host {
                    Some(host) => ext.latest_compatible_version(host),
                    None => ext.latest_version(),
                }?;
                Some(FetchableExtension {
                    extension_id: ext.id.clone(),
                    link: version.oci_uri.clone(),
                })
            })
            .collect())
    }
}

fn parse_proxy_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

fn map_extensions(published: Vec<PublishedExtension>) -> Vec<CatalogExtension> {
    published
        .into_iter()
        .filter_map(|p| match CatalogExtension::try_from(p) {
            Ok(ext) => Some(ext),
            Err(e) => {
                warn!("Skipping catalog entry: {}", e);
                None
            }
        })
        .collect()
}
