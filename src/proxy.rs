//! Outbound proxy settings with change notifications.

use tokio::sync::watch;
use tracing::debug;

use crate::config::ProxyConfig;

/// Proxy URLs. Per-protocol values take precedence over `proxy`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub proxy: Option<String>,
    pub no_proxy: Option<String>,
}

impl ProxySettings {
    /// URL to use for plain HTTP requests.
    pub fn http(&self) -> Option<&str> {
        non_empty(self.http_proxy.as_deref()).or_else(|| non_empty(self.proxy.as_deref()))
    }

    /// URL to use for HTTPS requests.
    pub fn https(&self) -> Option<&str> {
        non_empty(self.https_proxy.as_deref()).or_else(|| non_empty(self.proxy.as_deref()))
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Snapshot published to subscribers on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyState {
    pub enabled: bool,
    pub settings: ProxySettings,
}

/// Shared proxy state.
pub struct Proxy {
    tx: watch::Sender<ProxyState>,
}

impl Proxy {
    pub fn new(state: ProxyState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx }
    }

    /// A proxy that is switched off.
    pub fn disabled() -> Self {
        Self::new(ProxyState::default())
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(ProxyState {
            enabled: config.enabled,
            settings: ProxySettings {
                http_proxy: config.http_proxy.clone(),
                https_proxy: config.https_proxy.clone(),
                proxy: config.proxy.clone(),
                no_proxy: config.no_proxy.clone(),
            },
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.borrow().enabled
    }

    pub fn settings(&self) -> ProxySettings {
        self.tx.borrow().settings.clone()
    }

    pub fn state(&self) -> ProxyState {
        self.tx.borrow().clone()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.tx.send_modify(|s| s.enabled = enabled);
        debug!("Proxy {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn set_settings(&self, settings: ProxySettings) {
        debug!(?settings, "Proxy settings updated");
        self.tx.send_modify(|s| s.settings = settings);
    }

    /// Receives every subsequent update.
    pub fn subscribe(&self) -> watch::Receiver<ProxyState> {
        self.tx.subscribe()
    }
}

impl Default for Proxy {
    fn default() -> Self {
        Self::disabled()
    }
}
