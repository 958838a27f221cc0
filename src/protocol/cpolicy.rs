// ! Config policy returned by plugins
// !
// ! A policy lists, per metric namespace, which configuration keys the plugin
// ! accepts and of which type. The client only decodes and returns it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::protocol::metric::{ConfigValue, ConfigValueKind, Namespace};

/// One accepted configuration key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Configuration key
    pub key: String,
    /// Expected scalar type
    #[serde(rename = "type")]
    pub kind: ConfigValueKind,
    /// Whether the key must be supplied
    #[serde(default)]
    pub required: bool,
    /// Value used when the key is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ConfigValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl Rule {
    pub fn new(key: impl Into<String>, kind: ConfigValueKind) -> Self {
        Self {
            key: key.into(),
            kind,
            required: false,
            default: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<ConfigValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }
}

/// Rules for one namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyNode {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl PolicyNode {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Rule for a key, if declared
    pub fn rule(&self, key: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.key == key)
    }
}

/// Plugin-declared configuration policy keyed by joined namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigPolicy {
    #[serde(default)]
    pub nodes: BTreeMap<String, PolicyNode>,
}

impl ConfigPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the rules for a namespace, replacing any previous node
    pub fn add(&mut self, namespace: &Namespace, node: PolicyNode) {
        self.nodes.insert(namespace.key(), node);
    }

    /// Rules for a namespace
    pub fn get(&self, namespace: &Namespace) -> Option<&PolicyNode> {
        self.nodes.get(&namespace.key())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
