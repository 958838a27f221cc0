// ! Client builder for plugin clients
// !
// ! Provides the serde-backed client configuration and a builder that wires
// ! transport, dispatcher, session encryption and cache into a client for one
// ! plugin kind.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::client::cache::{CacheConfig, MetricCache};
use crate::client::dispatcher::Dispatcher;
use crate::client::plugin_client::{
    CollectorClient, PluginClient, PluginKind, ProcessorClient, PublisherClient,
};
use crate::core::error::{PluginError, PluginResult};
use crate::crypto::{Encrypter, PluginPublicKey};
use crate::transport::traits::Transport;

fn default_timeout_ms() -> u64 {
    10_000
}

/// Configuration for one plugin client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Plugin base URL
    pub url: String,
    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Encrypt payloads with a session key
    #[serde(default)]
    pub secure: bool,
    /// Plugin public key, base64; required when `secure` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Metric cache bounds
    #[serde(default)]
    pub cache: CacheConfig,
}

impl ClientConfig {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            timeout_ms: default_timeout_ms(),
            secure: false,
            public_key: None,
            cache: CacheConfig::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Builder for creating plugin clients
pub struct PluginClientBuilder {
    url: String,
    timeout: Duration,
    secure: bool,
    public_key: Option<PluginPublicKey>,
    cache_config: CacheConfig,
    shared_cache: Option<Arc<MetricCache>>,
    transport: Option<Box<dyn Transport>>,
}

impl PluginClientBuilder {
    /// Start a builder for the plugin listening at `url`
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_millis(default_timeout_ms()),
            secure: false,
            public_key: None,
            cache_config: CacheConfig::default(),
            shared_cache: None,
            transport: None,
        }
    }

    /// Start a builder from a configuration value
    pub fn from_config(config: &ClientConfig) -> PluginResult<Self> {
        let mut builder = Self::new(config.url.clone())
            .with_timeout(config.timeout())
            .secure(config.secure)
            .with_cache_config(config.cache.clone());
        if let Some(encoded) = &config.public_key {
            builder = builder.with_public_key(PluginPublicKey::from_base64(encoded)?);
        }
        Ok(builder)
    }

    /// Set the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the plugin's public key
    pub fn with_public_key(mut self, public_key: PluginPublicKey) -> Self {
        self.public_key = Some(public_key);
        self
    }

    /// Enable or disable payload encryption
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Bound the client's own cache
    pub fn with_cache_config(mut self, cache_config: CacheConfig) -> Self {
        self.cache_config = cache_config;
        self
    }

    /// Use a cache shared with other clients instead of a private one
    pub fn with_shared_cache(mut self, cache: Arc<MetricCache>) -> Self {
        self.shared_cache = Some(cache);
        self
    }

    /// Use a custom transport instead of HTTP
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn build_collector(self) -> PluginResult<CollectorClient> {
        self.build(PluginKind::Collector).map(CollectorClient::new)
    }

    pub fn build_processor(self) -> PluginResult<ProcessorClient> {
        self.build(PluginKind::Processor).map(ProcessorClient::new)
    }

    pub fn build_publisher(self) -> PluginResult<PublisherClient> {
        self.build(PluginKind::Publisher).map(PublisherClient::new)
    }

    fn build(self, kind: PluginKind) -> PluginResult<PluginClient> {
        url::Url::parse(&self.url)?;

        // the session key exists before any call can be made
        let encrypter = if self.secure {
            let public_key = self.public_key.ok_or_else(|| {
                PluginError::config("secure mode requires the plugin's public key")
            })?;
            Some(Encrypter::generate(public_key)?)
        } else {
            None
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&self.url, self.timeout)?,
        };
        let cache = self
            .shared_cache
            .unwrap_or_else(|| Arc::new(MetricCache::new(&self.cache_config)));

        Ok(PluginClient::new(
            kind,
            self.url,
            Dispatcher::new(transport, self.timeout),
            encrypter,
            cache,
        ))
    }
}

#[cfg(feature = "http")]
fn default_transport(url: &str, timeout: Duration) -> PluginResult<Box<dyn Transport>> {
    use crate::transport::{HttpClientTransport, TransportConfig};

    let config = TransportConfig {
        timeout_ms: timeout.as_millis().try_into().unwrap_or(u64::MAX),
        ..Default::default()
    };
    Ok(Box::new(HttpClientTransport::with_config(url, config)?))
}

#[cfg(not(feature = "http"))]
fn default_transport(_url: &str, _timeout: Duration) -> PluginResult<Box<dyn Transport>> {
    Err(PluginError::config(
        "no transport configured and the http feature is disabled",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::plugin_client::PluginSession;
    use crate::client::session::SessionState;
    use crate::crypto::PluginKeyPair;
    use crate::transport::mock::MockTransport;

    #[test]
    fn test_client_config_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"url": "http://127.0.0.1:8181"}"#).unwrap();
        assert_eq!(config, ClientConfig::new("http://127.0.0.1:8181"));
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(!config.secure);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let result = PluginClientBuilder::new("::not a url::")
            .with_transport(MockTransport::acknowledging())
            .build_collector();
        assert!(matches!(result, Err(PluginError::Config(_))));
    }

    #[test]
    fn test_secure_without_public_key_is_config_error() {
        let result = PluginClientBuilder::new("http://127.0.0.1:8181")
            .secure(true)
            .with_transport(MockTransport::acknowledging())
            .build_processor();
        assert!(matches!(result, Err(PluginError::Config(_))));
    }

    #[tokio::test]
    async fn test_secure_build_generates_key_before_any_call() {
        let plugin = PluginKeyPair::generate();
        let transport = MockTransport::acknowledging();
        let recorder = transport.recorder();
        let client = PluginClientBuilder::new("http://127.0.0.1:8181")
            .secure(true)
            .with_public_key(plugin.public_key())
            .with_transport(transport)
            .build_publisher()
            .unwrap();

        let encrypter = client.encrypter().unwrap();
        assert_eq!(encrypter.public_key(), &plugin.public_key());
        assert_eq!(client.session_state().await, SessionState::Unkeyed);
        assert_eq!(client.kind(), PluginKind::Publisher);
        assert!(recorder.lock().is_empty());
    }

    #[tokio::test]
    async fn test_from_config_decodes_public_key() {
        let plugin = PluginKeyPair::generate();
        let config = ClientConfig {
            secure: true,
            public_key: Some(plugin.public_key().to_base64()),
            timeout_ms: 250,
            ..ClientConfig::new("http://127.0.0.1:8181")
        };

        let client = PluginClientBuilder::from_config(&config)
            .unwrap()
            .with_transport(MockTransport::acknowledging())
            .build_collector()
            .unwrap();
        assert!(client.encrypter().is_some());
        assert_eq!(client.url(), "http://127.0.0.1:8181");
    }

    #[test]
    fn test_from_config_rejects_bad_public_key() {
        let config = ClientConfig {
            public_key: Some("not base64!".to_string()),
            ..ClientConfig::new("http://127.0.0.1:8181")
        };
        assert!(matches!(
            PluginClientBuilder::from_config(&config),
            Err(PluginError::Config(_))
        ));
    }

    #[test]
    fn test_shared_cache_is_shared() {
        let cache = Arc::new(MetricCache::unbounded());
        let a = PluginClientBuilder::new("http://127.0.0.1:8181")
            .with_shared_cache(Arc::clone(&cache))
            .with_transport(MockTransport::acknowledging())
            .build_collector()
            .unwrap();
        let b = PluginClientBuilder::new("http://127.0.0.1:8282")
            .with_shared_cache(Arc::clone(&cache))
            .with_transport(MockTransport::acknowledging())
            .build_collector()
            .unwrap();

        assert!(Arc::ptr_eq(a.cache(), b.cache()));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_builds_default_http_transport() {
        let client = PluginClientBuilder::new("http://127.0.0.1:8181")
            .with_timeout(Duration::from_millis(500))
            .build_collector();
        assert!(client.is_ok());
    }
}
