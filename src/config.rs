use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration key overriding the catalog URL.
pub const REGISTRY_URL_KEY: &str = "extensions.registryUrl";

/// Read-only key/value access to user configuration.
pub trait ConfigurationRegistry: Send + Sync {
    /// Returns the value stored under a dotted key, if any.
    fn get_value(&self, key: &str) -> Option<String>;
}

impl ConfigurationRegistry for HashMap<String, String> {
    fn get_value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Extension catalog settings
    #[serde(default)]
    pub extensions: ExtensionsConfig,
    /// Catalog request timeout in milliseconds (default: 5000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Outbound proxy settings
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Extra CA certificate files or directories (PEM)
    #[serde(default)]
    pub certificates: Vec<PathBuf>,
    /// Mirror bind address (default: "127.0.0.1")
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Mirror port number (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Mirror storage configuration
    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionsConfig {
    /// Overrides the default catalog URL
    #[serde(default)]
    pub registry_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub http_proxy: Option<String>,
    #[serde(default)]
    pub https_proxy: Option<String>,
    /// Used for both protocols when the per-protocol value is absent
    #[serde(default)]
    pub proxy: Option<String>,
    /// Comma-separated hosts that bypass the proxy
    #[serde(default)]
    pub no_proxy: Option<String>,
}

/// Mirror storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegistryConfig {
    Filesystem { path: PathBuf },
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig::Filesystem {
            path: PathBuf::from("./extensions.json"),
        }
    }
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: ExtensionsConfig::default(),
            timeout_ms: default_timeout_ms(),
            proxy: ProxyConfig::default(),
            certificates: Vec::new(),
            bind: default_bind(),
            port: default_port(),
            registry: RegistryConfig::default(),
        }
    }
}

/// Command-line overrides applied on top of file and environment settings
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub registry_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub catalog_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file, environment, and CLI arguments
    pub fn load(config_path: Option<&PathBuf>, overrides: &Overrides) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else if let Ok(content) = std::fs::read_to_string("catalog.toml") {
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(overrides);

        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("CATALOG_REGISTRY_URL") {
            self.extensions.registry_url = Some(url);
        }
        if let Some(timeout) = var("CATALOG_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.timeout_ms = t;
            }
        }
        if let Some(bind) = var("CATALOG_BIND") {
            self.bind = bind;
        }
        if let Some(port) = var("CATALOG_PORT") {
            if let Ok(p) = port.parse() {
                self.port = p;
            }
        }
        if let Some(path) = var("CATALOG_PATH") {
            self.registry = RegistryConfig::Filesystem {
                path: PathBuf::from(path),
            };
        }

        // Conventional proxy variables enable the proxy when present
        if let Some(p) = var("HTTP_PROXY").or_else(|| var("http_proxy")) {
            self.proxy.http_proxy = Some(p);
            self.proxy.enabled = true;
        }
        if let Some(p) = var("HTTPS_PROXY").or_else(|| var("https_proxy")) {
            self.proxy.https_proxy = Some(p);
            self.proxy.enabled = true;
        }
        if let Some(p) = var("NO_PROXY").or_else(|| var("no_proxy")) {
            self.proxy.no_proxy = Some(p);
        }
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.registry_url {
            self.extensions.registry_url = Some(url.clone());
        }
        if let Some(timeout) = overrides.timeout_ms {
            self.timeout_ms = timeout;
        }
        if let Some(bind) = &overrides.bind {
            self.bind = bind.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(path) = &overrides.catalog_path {
            self.registry = RegistryConfig::Filesystem { path: path.clone() };
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

impl ConfigurationRegistry for Config {
    fn get_value(&self, key: &str) -> Option<String> {
        match key {
            REGISTRY_URL_KEY => self.extensions.registry_url.clone(),
            _ => None,
        }
    }
}
