// ! Structured logging for the plugin client
// !
// ! Module provides structured error logging with categorization and
// ! context preservation on top of `tracing`.

use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{Level, error, info, span, warn};

use crate::core::error::PluginError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLogLevel {
    /// Errors that break the call and point at a local or protocol fault
    Error,
    /// Recoverable conditions, usually the plugin being slow or unreachable
    Warning,
    /// Failures attributable to the caller or reported by the plugin itself
    Info,
}

impl From<&PluginError> for ErrorLogLevel {
    fn from(error: &PluginError) -> Self {
        match error {
            PluginError::KeyGeneration(_)
            | PluginError::Encryption(_)
            | PluginError::Decryption(_)
            | PluginError::Encoding(_)
            | PluginError::Decoding(_)
            | PluginError::ResponseMismatch { .. }
            | PluginError::EmptyResult(_) => ErrorLogLevel::Error,

            PluginError::Network(_) | PluginError::Timeout(_) => ErrorLogLevel::Warning,

            PluginError::Remote(_)
            | PluginError::ChannelNotEstablished(_)
            | PluginError::InvalidNamespace(_)
            | PluginError::Config(_) => ErrorLogLevel::Info,
        }
    }
}

/// Extended error context for logging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Operation being performed when error occurred
    pub operation: String,
    /// RPC method if applicable
    pub method: Option<String>,
    /// Plugin endpoint
    pub url: Option<String>,
    /// Call id of the failed exchange
    pub call_id: Option<u64>,
    /// Additional context data
    pub extra: HashMap<String, Value>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            operation: "unknown".to_string(),
            method: None,
            url: None,
            call_id: None,
            extra: HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Default::default()
        }
    }

    /// Set method name
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Set plugin endpoint
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set call id
    pub fn with_call_id(mut self, id: u64) -> Self {
        self.call_id = Some(id);
        self
    }

    /// Add extra context data
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Error logger writing to the `plugin_client_errors` target
pub struct ErrorLogger;

impl ErrorLogger {
    /// Log an error with full context
    pub fn log_error(error: &PluginError, context: &ErrorContext) {
        let category = error.category();
        let recoverable = error.is_recoverable();

        let log_data = json!({
            "error_category": category,
            "error_recoverable": recoverable,
            "error_message": error.to_string(),
            "operation": context.operation,
            "method": context.method,
            "url": context.url,
            "call_id": context.call_id,
            "extra_context": context.extra,
        });
        let log_data = serde_json::to_string(&log_data).unwrap_or_default();

        match ErrorLogLevel::from(error) {
            ErrorLogLevel::Error => {
                error!(
                    target: "plugin_client_errors",
                    error_category = category,
                    error_recoverable = recoverable,
                    operation = context.operation.as_str(),
                    "Plugin call error: {} - {}",
                    error,
                    log_data
                );
            }
            ErrorLogLevel::Warning => {
                warn!(
                    target: "plugin_client_errors",
                    error_category = category,
                    error_recoverable = recoverable,
                    operation = context.operation.as_str(),
                    "Plugin call warning: {} - {}",
                    error,
                    log_data
                );
            }
            ErrorLogLevel::Info => {
                info!(
                    target: "plugin_client_errors",
                    error_category = category,
                    error_recoverable = recoverable,
                    operation = context.operation.as_str(),
                    "Plugin call failed: {} - {}",
                    error,
                    log_data
                );
            }
        }
    }

    /// Create a logging span for an operation
    pub fn create_operation_span(context: &ErrorContext) -> tracing::Span {
        span!(
            Level::DEBUG,
            "plugin_call",
            operation = context.operation.as_str(),
            method = context.method.as_deref(),
            url = context.url.as_deref(),
        )
    }
}

impl PluginError {
    /// Log this error with structured context
    pub fn log_with_context(&self, context: &ErrorContext) {
        ErrorLogger::log_error(self, context);
    }
}
