//! Core abstractions for the plugin client
//!
//! This module contains the error taxonomy shared by every layer and the
//! structured logging helpers used to report failures.

pub mod error;
pub mod logging;

// Re-export commonly used items
pub use error::{PluginError, PluginResult};
pub use logging::{ErrorContext, ErrorLogLevel, ErrorLogger};
