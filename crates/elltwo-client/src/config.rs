use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Default liveness-check interval.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(5000);

/// Editing client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket base URL of the remote store (e.g., ws://127.0.0.1:8500)
    pub server: Url,
    /// Document path relative to the store's root
    pub document: String,
    /// How often the keeper checks the channel and reconnects if closed
    pub reconnect_interval: Duration,
    /// Send `fetch` on every reconnect instead of only before the first load
    pub refetch_on_reconnect: bool,
    /// Treat Cmd as the primary modifier in key scripts
    pub platform_mac: bool,
}

impl ClientConfig {
    pub fn new(server: Url, document: impl Into<String>) -> Self {
        Self {
            server,
            document: document.into(),
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            refetch_on_reconnect: false,
            platform_mac: false,
        }
    }

    /// Parse the server URL, rejecting anything that is not a WebSocket URL.
    pub fn parse_server(raw: &str) -> Result<Url, ConfigError> {
        let url = Url::parse(raw).map_err(|e| ConfigError::UrlParse {
            url: raw.to_string(),
            message: e.to_string(),
        })?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(ConfigError::Scheme {
                scheme: other.to_string(),
            }),
        }
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn with_refetch_on_reconnect(mut self, refetch: bool) -> Self {
        self.refetch_on_reconnect = refetch;
        self
    }

    pub fn with_platform_mac(mut self, mac: bool) -> Self {
        self.platform_mac = mac;
        self
    }

    /// The document's edit channel: `<server>/elledit/<document>`.
    pub fn endpoint(&self) -> Url {
        let document = self.document.trim_start_matches('/');
        let mut url = self.server.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}/elledit/{document}"));
        url
    }
}
