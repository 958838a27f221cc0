// ! Error types for the plugin client
// !
// ! Module defines every failure the client can surface, grouped by the layer
// ! that produces it: session encryption, codec, transport, collection and
// ! the remote plugin itself.

use thiserror::Error;

/// The main error type for plugin client operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    /// Session key could not be generated
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Encrypting the session key or a payload failed
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// A payload could not be opened with the session key
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Typed value could not be serialized
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// Bytes could not be turned back into a typed value
    #[error("Decoding failed: {0}")]
    Decoding(String),

    /// Request/response exchange with the plugin failed
    #[error("Network error: {0}")]
    Network(String),

    /// Exchange exceeded the configured timeout
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Response envelope answered a different call
    #[error("Response id {actual} does not match request id {expected}")]
    ResponseMismatch {
        /// Id sent with the request
        expected: u64,
        /// Id echoed by the plugin
        actual: u64,
    },

    /// A call that must return data returned none
    #[error("Invalid response: {0}")]
    EmptyResult(String),

    /// The plugin reported a failure in the envelope error field
    #[error("{0}")]
    Remote(String),

    /// Secure mode requested but the session key was never delivered
    #[error("Secure channel not established: {0}")]
    ChannelNotEstablished(String),

    /// Namespace with no segments or an empty segment
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    /// Client configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for PluginError {
    fn from(err: serde_json::Error) -> Self {
        PluginError::Decoding(err.to_string())
    }
}

impl From<url::ParseError> for PluginError {
    fn from(err: url::ParseError) -> Self {
        PluginError::Config(format!("invalid plugin url: {err}"))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for PluginError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PluginError::Timeout(err.to_string())
        } else if err.is_decode() {
            PluginError::Decoding(err.to_string())
        } else {
            PluginError::Network(err.to_string())
        }
    }
}

/// Result type alias for plugin client operations
pub type PluginResult<T> = Result<T, PluginError>;

impl PluginError {
    /// Create a new encoding error
    pub fn encoding<S: Into<String>>(message: S) -> Self {
        Self::Encoding(message.into())
    }

    /// Create a new decoding error
    pub fn decoding<S: Into<String>>(message: S) -> Self {
        Self::Decoding(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new remote error from the envelope error text
    pub fn remote<S: Into<String>>(message: S) -> Self {
        Self::Remote(message.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Check if the caller may reasonably retry the failed call
    pub fn is_recoverable(&self) -> bool {
        match self {
            PluginError::Network(_) | PluginError::Timeout(_) => true,
            PluginError::KeyGeneration(_)
            | PluginError::Encryption(_)
            | PluginError::Decryption(_)
            | PluginError::Encoding(_)
            | PluginError::Decoding(_)
            | PluginError::ResponseMismatch { .. }
            | PluginError::EmptyResult(_)
            | PluginError::Remote(_)
            | PluginError::ChannelNotEstablished(_)
            | PluginError::InvalidNamespace(_)
            | PluginError::Config(_) => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            PluginError::KeyGeneration(_)
            | PluginError::Encryption(_)
            | PluginError::Decryption(_) => "encryption",
            PluginError::Encoding(_) | PluginError::Decoding(_) => "codec",
            PluginError::Network(_) => "network",
            PluginError::Timeout(_) => "timeout",
            PluginError::ResponseMismatch { .. } => "protocol",
            PluginError::EmptyResult(_) => "collection",
            PluginError::Remote(_) => "remote",
            PluginError::ChannelNotEstablished(_) => "session",
            PluginError::InvalidNamespace(_) | PluginError::Config(_) => "validation",
        }
    }
}
