//! Plugin client implementation
//!
//! This module provides the call dispatcher, the metric cache, the session
//! state machine and the capability-scoped clients for collector, processor
//! and publisher plugins.

pub mod builder;
pub mod cache;
pub mod dispatcher;
pub mod plugin_client;
pub mod session;

// Re-export the client types and builder
pub use builder::{ClientConfig, PluginClientBuilder};
pub use cache::{CacheConfig, CacheStats, MetricCache};
pub use dispatcher::Dispatcher;
pub use plugin_client::{
    CollectorClient, ContentProcessor, ContentPublisher, MetricCollector, PluginClient,
    PluginKind, PluginSession, ProcessorClient, PublisherClient,
};
pub use session::{Session, SessionState};
