//! Plugin RPC protocol
//!
//! This module contains the call envelopes, the method catalog, the metric
//! and config-policy data model, the argument/reply payloads and the codec
//! that turns them into (optionally encrypted) bytes.

pub mod codec;
pub mod cpolicy;
pub mod messages;
pub mod methods;
pub mod metric;
pub mod types;

// Re-export commonly used types
pub use codec::JsonCodec;
pub use cpolicy::{ConfigPolicy, PolicyNode, Rule};
pub use messages::*;
pub use metric::{
    ConfigMap, ConfigValue, ConfigValueKind, Metric, NAMESPACE_SEPARATOR, Namespace,
    PluginMetricType,
};
pub use types::{CallRequest, CallResponse};
