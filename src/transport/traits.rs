// ! Transport layer traits and abstractions
// !
// ! Module defines the single request/response exchange the call dispatcher
// ! performs against a plugin process.

use crate::core::error::PluginResult;
use crate::protocol::types::{CallRequest, CallResponse};
use async_trait::async_trait;
use std::collections::HashMap;

/// Request/response channel to one plugin process
///
/// Implementations perform exactly one exchange per call and never retry.
/// Each request must be answered by its own response before the next one is
/// issued; the dispatcher guarantees it never overlaps calls on one client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request envelope and wait for the response envelope
    ///
    /// # Arguments
    /// * `request` - The envelope to send
    ///
    /// # Returns
    /// Result containing the decoded response envelope or a
    /// `Network`/`Timeout`/`Decoding` error
    async fn send_request(&self, request: &CallRequest) -> PluginResult<CallResponse>;

    /// Get connection information for debugging
    fn connection_info(&self) -> String {
        "Unknown transport".to_string()
    }
}

/// Transport configuration options
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-exchange timeout in milliseconds
    pub timeout_ms: u64,
    /// Connection establishment timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,
    /// Extra headers for HTTP-based transports
    pub headers: HashMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            connect_timeout_ms: Some(5_000),
            headers: HashMap::new(),
        }
    }
}
