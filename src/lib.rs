// Copyright (c) 2025 Pulse Contributors
// SPDX-License-Identifier: MIT

//! # Pulse plugin client
//!
//! Client side of the RPC protocol the Pulse control plane speaks with its
//! out-of-process plugins: metric collectors, content processors and
//! publishers.
//!
//! ## Features
//!
//! - **Session encryption**: an X25519-sealed ChaCha20-Poly1305 session key,
//!   generated before the first call and delivered with `set_key`
//! - **Call dispatch**: JSON envelopes over HTTP with sequential call ids and
//!   a per-call timeout
//! - **Read-through metric cache**: cached namespaces never hit the plugin;
//!   optional LRU capacity and time-to-live
//! - **Typed errors**: one [`PluginError`] taxonomy across every layer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pulse_plugin_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> PluginResult<()> {
//!     let collector = PluginClientBuilder::new("http://127.0.0.1:8181")
//!         .with_timeout(std::time::Duration::from_secs(5))
//!         .build_collector()?;
//!
//!     collector.ping().await?;
//!     let request = [PluginMetricType::new("cpu/0/load".parse()?)];
//!     for metric in collector.collect_metrics(&request).await? {
//!         println!("{} = {}", metric.namespace, metric.data);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`core`]: Error taxonomy and structured error logging
//! - [`crypto`]: Session key generation, sealing and payload wrapping
//! - [`protocol`]: Call envelopes, method catalog, data model and codec
//! - [`transport`]: Transport trait and the HTTP transport
//! - [`client`]: Dispatcher, cache, session state and plugin clients

pub mod client;
pub mod core;
pub mod crypto;
pub mod protocol;
pub mod transport;

// Re-export commonly used types for convenience
pub use core::error::{PluginError, PluginResult};

/// Prelude module for convenient imports
///
/// Use `use pulse_plugin_client::prelude::*;` to import everything you need.
pub mod prelude {
    pub use crate::core::error::{PluginError, PluginResult};

    pub use crate::crypto::{Encrypter, PluginKeyPair, PluginPublicKey};

    pub use crate::protocol::cpolicy::{ConfigPolicy, PolicyNode, Rule};
    pub use crate::protocol::metric::{
        ConfigMap, ConfigValue, ConfigValueKind, Metric, Namespace, PluginMetricType,
    };

    pub use crate::client::{
        CacheConfig, ClientConfig, CollectorClient, ContentProcessor, ContentPublisher,
        MetricCache, MetricCollector, PluginClientBuilder, PluginKind, PluginSession,
        ProcessorClient, PublisherClient, SessionState,
    };

    pub use crate::transport::Transport;
    #[cfg(feature = "http")]
    pub use crate::transport::HttpClientTransport;

    pub use async_trait::async_trait;
}
