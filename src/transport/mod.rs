//! Transport layer implementations
//!
//! This module provides the transport trait used by the call dispatcher and
//! the HTTP implementation that talks to plugin processes.

pub mod traits;

#[cfg(feature = "http")]
pub mod http;

#[cfg(test)]
pub(crate) mod mock;

// Re-export commonly used types
pub use traits::{Transport, TransportConfig};

#[cfg(feature = "http")]
pub use http::HttpClientTransport;
