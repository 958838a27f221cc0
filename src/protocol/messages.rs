// ! Argument and reply payloads
// !
// ! One struct per encoded argument or reply carried by the method catalog.

use serde::{Deserialize, Serialize};

use crate::protocol::cpolicy::ConfigPolicy;
use crate::protocol::metric::{ConfigMap, Metric, PluginMetricType};
use crate::protocol::types::base64_bytes;

/// Argument of `SessionState.SetKey`: the sealed session key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetKeyArgs {
    #[serde(with = "base64_bytes")]
    pub key: Vec<u8>,
}

/// Argument of `SessionState.Kill`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillArgs {
    pub reason: String,
}

/// Argument of `Collector.CollectMetrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectMetricsArgs {
    pub plugin_metric_types: Vec<PluginMetricType>,
}

/// Reply of `Collector.CollectMetrics`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectMetricsReply {
    #[serde(default)]
    pub plugin_metrics: Vec<Metric>,
}

/// Reply of `Collector.GetMetricTypes`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetMetricTypesReply {
    #[serde(default)]
    pub plugin_metric_types: Vec<PluginMetricType>,
}

/// Reply of `SessionState.GetConfigPolicy`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetConfigPolicyReply {
    pub policy: ConfigPolicy,
}

/// Argument of `Processor.Process`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorArgs {
    pub content_type: String,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    #[serde(default)]
    pub config: ConfigMap,
}

/// Reply of `Processor.Process`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorReply {
    pub content_type: String,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
}

/// Argument of `Publisher.Publish`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishArgs {
    pub content_type: String,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    #[serde(default)]
    pub config: ConfigMap,
}
