// ! Metric data model
// !
// ! Namespaces, typed configuration values, collected metrics and the
// ! request-side metric types sent to collectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::error::{PluginError, PluginResult};

/// Separator used to join namespace segments into a cache key
pub const NAMESPACE_SEPARATOR: &str = "/";

/// Ordered, non-empty sequence of non-empty path segments identifying a metric
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Namespace(Vec<String>);

impl Namespace {
    /// Build a namespace, rejecting empty input and empty segments
    pub fn new<I, S>(segments: I) -> PluginResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(PluginError::InvalidNamespace(
                "namespace has no segments".to_string(),
            ));
        }
        if let Some(position) = segments.iter().position(|s| s.is_empty()) {
            return Err(PluginError::InvalidNamespace(format!(
                "segment {position} of {segments:?} is empty"
            )));
        }
        Ok(Self(segments))
    }

    /// Segments in order
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Joined form, the unique cache key for this namespace
    pub fn key(&self) -> String {
        self.0.join(NAMESPACE_SEPARATOR)
    }
}

impl TryFrom<Vec<String>> for Namespace {
    type Error = PluginError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<Namespace> for Vec<String> {
    fn from(namespace: Namespace) -> Self {
        namespace.0
    }
}

impl FromStr for Namespace {
    type Err = PluginError;

    /// Parse a joined key such as `cpu/0/load`; one leading separator is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix(NAMESPACE_SEPARATOR).unwrap_or(s);
        Self::new(trimmed.split(NAMESPACE_SEPARATOR))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Scalar type accepted for a configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigValueKind {
    Bool,
    Integer,
    Float,
    String,
}

/// Typed configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl ConfigValue {
    /// Scalar type of this value
    pub fn kind(&self) -> ConfigValueKind {
        match self {
            ConfigValue::Bool(_) => ConfigValueKind::Bool,
            ConfigValue::Integer(_) => ConfigValueKind::Integer,
            ConfigValue::Float(_) => ConfigValueKind::Float,
            ConfigValue::String(_) => ConfigValueKind::String,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

/// Configuration attached to a metric or a processing/publishing call
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A collected metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Identity of the metric
    pub namespace: Namespace,
    /// Configuration the metric was collected with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigMap>,
    /// Collected value
    #[serde(default)]
    pub data: Value,
    /// Host or component the value came from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// Collection time
    pub timestamp: DateTime<Utc>,
    /// Metric version advertised by the plugin
    #[serde(default)]
    pub version: u32,
}

impl Metric {
    /// Create a metric collected now
    pub fn new(namespace: Namespace, data: impl Into<Value>) -> Self {
        Self {
            namespace,
            config: None,
            data: data.into(),
            source: String::new(),
            timestamp: Utc::now(),
            version: 0,
        }
    }

    /// Attach configuration
    pub fn with_config(mut self, config: ConfigMap) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the collection time
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Cache key of this metric
    pub fn key(&self) -> String {
        self.namespace.key()
    }
}

/// Request-side metric type: what to collect and with which configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMetricType {
    pub namespace: Namespace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigMap>,
    #[serde(default)]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_advertised_time: Option<DateTime<Utc>>,
}

impl PluginMetricType {
    /// Request a namespace without configuration
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            config: None,
            version: 0,
            last_advertised_time: None,
        }
    }

    /// Attach configuration
    pub fn with_config(mut self, config: ConfigMap) -> Self {
        self.config = Some(config);
        self
    }

    /// Cache key of the requested namespace
    pub fn key(&self) -> String {
        self.namespace.key()
    }
}

impl From<&Metric> for PluginMetricType {
    fn from(metric: &Metric) -> Self {
        Self {
            namespace: metric.namespace.clone(),
            config: metric.config.clone(),
            version: metric.version,
            last_advertised_time: None,
        }
    }
}
