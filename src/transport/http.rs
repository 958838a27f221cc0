// ! HTTP transport implementation
// !
// ! Module posts call envelopes as `application/json` to the plugin's base
// ! URL and decodes the response envelope from the body.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

use crate::core::error::{PluginError, PluginResult};
use crate::core::logging::ErrorContext;
use crate::protocol::types::{CallRequest, CallResponse};
use crate::transport::traits::{Transport, TransportConfig};

/// HTTP transport for plugin clients
#[derive(Debug, Clone)]
pub struct HttpClientTransport {
    client: Client,
    url: String,
    config: TransportConfig,
}

impl HttpClientTransport {
    /// Create a new HTTP transport with the default configuration
    ///
    /// # Arguments
    /// * `url` - Base URL of the plugin process
    pub fn new<S: AsRef<str>>(url: S) -> PluginResult<Self> {
        Self::with_config(url, TransportConfig::default())
    }

    /// Create a new HTTP transport with custom configuration
    ///
    /// # Arguments
    /// * `url` - Base URL of the plugin process
    /// * `config` - Transport configuration
    pub fn with_config<S: AsRef<str>>(url: S, config: TransportConfig) -> PluginResult<Self> {
        let url = url::Url::parse(url.as_ref())?.to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (key, value) in &config.headers {
            if let (Ok(name), Ok(value)) = (
                key.parse::<HeaderName>(),
                value.parse::<HeaderValue>(),
            ) {
                headers.insert(name, value);
            }
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers);
        if let Some(connect_timeout_ms) = config.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(connect_timeout_ms));
        }

        let client = builder
            .build()
            .map_err(|e| PluginError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            config,
        })
    }

    /// Base URL requests are posted to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Active configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpClientTransport {
    async fn send_request(&self, request: &CallRequest) -> PluginResult<CallResponse> {
        let body = serde_json::to_vec(request)
            .map_err(|e| PluginError::encoding(format!("Request serialization failed: {e}")))?;

        let response = self
            .client
            .post(&self.url)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PluginError::timeout(format!("HTTP request timeout: {e}"))
                } else {
                    PluginError::network(format!("HTTP request failed: {e}"))
                }
            })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(PluginError::network(format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        serde_json::from_slice::<CallResponse>(&bytes).map_err(|e| {
            let error = PluginError::decoding(format!("Response decoding failed: {e}"));
            error.log_with_context(
                &ErrorContext::new("http_send_request")
                    .with_method(&request.method)
                    .with_url(&self.url)
                    .with_call_id(request.id)
                    .with_extra("status_code", status.as_u16())
                    .with_extra("response", String::from_utf8_lossy(&bytes).into_owned()),
            );
            error
        })
    }

    fn connection_info(&self) -> String {
        format!("HTTP transport to {}", self.url)
    }
}
