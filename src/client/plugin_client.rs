// ! Plugin clients
// !
// ! Module provides the shared client core and the three capability-scoped
// ! clients (collector, processor, publisher) built on top of it. Every
// ! operation encodes its arguments, dispatches one fixed method and decodes
// ! the typed reply.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::client::cache::MetricCache;
use crate::client::dispatcher::Dispatcher;
use crate::client::session::{Session, SessionState};
use crate::core::error::{PluginError, PluginResult};
use crate::core::logging::ErrorContext;
use crate::crypto::Encrypter;
use crate::protocol::codec::JsonCodec;
use crate::protocol::cpolicy::ConfigPolicy;
use crate::protocol::messages::*;
use crate::protocol::methods;
use crate::protocol::metric::{ConfigMap, Metric, PluginMetricType};
use crate::protocol::types::CallResponse;

/// Role a plugin process plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    Collector,
    Processor,
    Publisher,
}

impl PluginKind {
    /// Capitalized type name, e.g. `"Collector"`
    pub fn type_name(&self) -> &'static str {
        match self {
            PluginKind::Collector => "Collector",
            PluginKind::Processor => "Processor",
            PluginKind::Publisher => "Publisher",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PluginKind::Collector => "collector",
            PluginKind::Processor => "processor",
            PluginKind::Publisher => "publisher",
        };
        f.write_str(name)
    }
}

/// Client core shared by every plugin kind
#[derive(Debug)]
pub struct PluginClient {
    kind: PluginKind,
    url: String,
    dispatcher: Dispatcher,
    codec: JsonCodec,
    session: Session,
    cache: Arc<MetricCache>,
}

impl PluginClient {
    pub(crate) fn new(
        kind: PluginKind,
        url: String,
        dispatcher: Dispatcher,
        encrypter: Option<Encrypter>,
        cache: Arc<MetricCache>,
    ) -> Self {
        let codec = match &encrypter {
            Some(encrypter) => JsonCodec::with_encrypter(encrypter.clone()),
            None => JsonCodec::new(),
        };
        let session = Session::new(encrypter);
        debug!(
            kind = %kind,
            transport = %dispatcher.connection_info(),
            timeout_ms = dispatcher.timeout().as_millis() as u64,
            secure = session.is_secure(),
            "Plugin client created"
        );
        Self {
            kind,
            url,
            dispatcher,
            codec,
            session,
            cache,
        }
    }

    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    /// Base URL of the plugin process
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Session encrypter, present in secure mode
    pub fn encrypter(&self) -> Option<&Encrypter> {
        self.session.encrypter()
    }

    pub fn cache(&self) -> &Arc<MetricCache> {
        &self.cache
    }

    pub async fn session_state(&self) -> SessionState {
        self.session.state().await
    }

    /// Id the next call will carry
    pub async fn next_call_id(&self) -> u64 {
        self.dispatcher.current_id().await
    }

    /// Liveness check
    pub async fn ping(&self) -> PluginResult<()> {
        let response = self.dispatcher.call(methods::SESSION_PING, vec![]).await?;
        check_remote(&response)
    }

    /// Deliver the session key to the plugin
    ///
    /// The key is sealed under the plugin's public key and sent unwrapped,
    /// since the plugin cannot decrypt payloads before it holds the key.
    /// Calling this again re-sends the same key.
    pub async fn set_key(&self) -> PluginResult<()> {
        let args = SetKeyArgs {
            key: self.session.sealed_key()?,
        };
        let param =
            serde_json::to_value(&args).map_err(|e| PluginError::encoding(e.to_string()))?;

        let response = self
            .dispatcher
            .call(methods::SESSION_SET_KEY, vec![param])
            .await?;
        check_remote(&response)?;

        self.session.mark_keyed().await;
        Ok(())
    }

    /// Ask the plugin process to shut down
    pub async fn kill(&self, reason: &str) -> PluginResult<()> {
        self.session.ensure_established(methods::SESSION_KILL).await?;
        let param = self.codec.encode_param(&KillArgs {
            reason: reason.to_string(),
        })?;

        let response = self
            .dispatcher
            .call(methods::SESSION_KILL, vec![param])
            .await?;
        check_remote(&response)
    }

    /// Fetch the plugin's configuration policy
    pub async fn get_config_policy(&self) -> PluginResult<ConfigPolicy> {
        let method = methods::SESSION_GET_CONFIG_POLICY;
        self.session.ensure_established(method).await?;

        let response = match self.dispatcher.call(method, vec![]).await {
            Ok(response) => response,
            Err(error) => {
                error.log_with_context(
                    &ErrorContext::new("get_config_policy")
                        .with_method(method)
                        .with_url(&self.url),
                );
                return Err(error);
            }
        };
        check_remote(&response)?;

        if response.result.is_empty() {
            return Err(PluginError::decoding(
                "GetConfigPolicy returned neither a policy nor an error",
            ));
        }
        let reply: GetConfigPolicyReply = self.decode_reply(method, &response)?;
        Ok(reply.policy)
    }

    /// Collect metrics, consulting the cache first
    ///
    /// Cached namespaces are served locally and only the remainder is
    /// requested from the plugin in one call. Results follow request order;
    /// returned metrics matching no request slot come last, and slots the
    /// plugin did not answer are omitted.
    pub async fn collect_metrics(
        &self,
        metric_types: &[PluginMetricType],
    ) -> PluginResult<Vec<Metric>> {
        let method = methods::COLLECTOR_COLLECT_METRICS;
        self.session.ensure_established(method).await?;

        let keys: Vec<String> = metric_types.iter().map(PluginMetricType::key).collect();
        let mut slots: Vec<Option<Metric>> = Vec::with_capacity(metric_types.len());
        let mut to_fetch = Vec::new();
        for (metric_type, key) in metric_types.iter().zip(&keys) {
            match self.cache.get(key) {
                Some(metric) => {
                    debug!(key = %key, "Metric served from cache");
                    slots.push(Some(metric));
                }
                None => {
                    slots.push(None);
                    to_fetch.push(metric_type.clone());
                }
            }
        }

        if to_fetch.is_empty() {
            return Ok(slots.into_iter().flatten().collect());
        }
        debug!(
            cached = metric_types.len() - to_fetch.len(),
            fetching = to_fetch.len(),
            "Requesting metrics from plugin"
        );

        let args = CollectMetricsArgs {
            plugin_metric_types: to_fetch,
        };
        let param = self.codec.encode_param(&args)?;
        let response = self.dispatcher.call(method, vec![param.clone()]).await?;
        check_remote(&response)?;

        if response.result.is_empty() {
            let error = PluginError::EmptyResult(format!("{method} returned no metrics"));
            error.log_with_context(
                &ErrorContext::new("collect_metrics")
                    .with_method(method)
                    .with_url(&self.url)
                    .with_call_id(response.id)
                    .with_extra("request", param)
                    .with_extra(
                        "requested",
                        args.plugin_metric_types
                            .iter()
                            .map(PluginMetricType::key)
                            .collect::<Vec<_>>(),
                    )
                    .with_extra(
                        "response",
                        serde_json::to_value(&response).unwrap_or(Value::Null),
                    ),
            );
            return Err(error);
        }

        let reply: CollectMetricsReply = self.decode_reply(method, &response)?;
        let mut unmatched = Vec::new();
        for metric in reply.plugin_metrics {
            let key = metric.key();
            self.cache.put(key.clone(), metric.clone());
            let slot = slots
                .iter()
                .zip(&keys)
                .position(|(slot, slot_key)| slot.is_none() && *slot_key == key);
            match slot {
                Some(index) => slots[index] = Some(metric),
                None => unmatched.push(metric),
            }
        }

        Ok(slots.into_iter().flatten().chain(unmatched).collect())
    }

    /// List the metric types the plugin can collect
    pub async fn get_metric_types(&self) -> PluginResult<Vec<PluginMetricType>> {
        let method = methods::COLLECTOR_GET_METRIC_TYPES;
        self.session.ensure_established(method).await?;

        let response = self.dispatcher.call(method, vec![]).await?;
        check_remote(&response)?;
        let reply: GetMetricTypesReply = self.decode_reply(method, &response)?;
        Ok(reply.plugin_metric_types)
    }

    /// Transform content; returns the new content type and content
    pub async fn process(
        &self,
        content_type: &str,
        content: &[u8],
        config: &ConfigMap,
    ) -> PluginResult<(String, Vec<u8>)> {
        let method = methods::PROCESSOR_PROCESS;
        self.session.ensure_established(method).await?;

        let param = self.codec.encode_param(&ProcessorArgs {
            content_type: content_type.to_string(),
            content: content.to_vec(),
            config: config.clone(),
        })?;
        let response = self.dispatcher.call(method, vec![param]).await?;
        check_remote(&response)?;
        let reply: ProcessorReply = self.decode_reply(method, &response)?;
        Ok((reply.content_type, reply.content))
    }

    /// Hand content to the plugin for publishing
    pub async fn publish(
        &self,
        content_type: &str,
        content: &[u8],
        config: &ConfigMap,
    ) -> PluginResult<()> {
        let method = methods::PUBLISHER_PUBLISH;
        self.session.ensure_established(method).await?;

        let param = self.codec.encode_param(&PublishArgs {
            content_type: content_type.to_string(),
            content: content.to_vec(),
            config: config.clone(),
        })?;
        let response = self.dispatcher.call(method, vec![param]).await?;
        check_remote(&response)
    }

    fn decode_reply<T: DeserializeOwned>(
        &self,
        method: &str,
        response: &CallResponse,
    ) -> PluginResult<T> {
        self.codec.decode(&response.result).inspect_err(|error| {
            error.log_with_context(
                &ErrorContext::new("decode_reply")
                    .with_method(method)
                    .with_url(&self.url)
                    .with_call_id(response.id),
            );
        })
    }
}

/// Surface a non-empty envelope error as `Remote`
fn check_remote(response: &CallResponse) -> PluginResult<()> {
    if response.is_error() {
        Err(PluginError::remote(response.error.clone()))
    } else {
        Ok(())
    }
}

/// Operations every plugin kind answers
#[async_trait]
pub trait PluginSession: Send + Sync {
    /// Shared client core
    fn client(&self) -> &PluginClient;

    fn kind(&self) -> PluginKind {
        self.client().kind()
    }

    async fn ping(&self) -> PluginResult<()> {
        self.client().ping().await
    }

    async fn set_key(&self) -> PluginResult<()> {
        self.client().set_key().await
    }

    async fn kill(&self, reason: &str) -> PluginResult<()> {
        self.client().kill(reason).await
    }

    async fn get_config_policy(&self) -> PluginResult<ConfigPolicy> {
        self.client().get_config_policy().await
    }
}

/// Capability of collector plugins
#[async_trait]
pub trait MetricCollector: PluginSession {
    async fn collect_metrics(
        &self,
        metric_types: &[PluginMetricType],
    ) -> PluginResult<Vec<Metric>> {
        self.client().collect_metrics(metric_types).await
    }

    async fn get_metric_types(&self) -> PluginResult<Vec<PluginMetricType>> {
        self.client().get_metric_types().await
    }
}

/// Capability of processor plugins
#[async_trait]
pub trait ContentProcessor: PluginSession {
    async fn process(
        &self,
        content_type: &str,
        content: &[u8],
        config: &ConfigMap,
    ) -> PluginResult<(String, Vec<u8>)> {
        self.client().process(content_type, content, config).await
    }
}

/// Capability of publisher plugins
#[async_trait]
pub trait ContentPublisher: PluginSession {
    async fn publish(
        &self,
        content_type: &str,
        content: &[u8],
        config: &ConfigMap,
    ) -> PluginResult<()> {
        self.client().publish(content_type, content, config).await
    }
}

macro_rules! plugin_client_type {
    ($(#[$doc:meta])* $name:ident, $capability:ident) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name {
            inner: PluginClient,
        }

        impl $name {
            pub(crate) fn new(inner: PluginClient) -> Self {
                Self { inner }
            }

            /// Session encrypter, present in secure mode
            pub fn encrypter(&self) -> Option<&Encrypter> {
                self.inner.encrypter()
            }

            pub fn cache(&self) -> &Arc<MetricCache> {
                self.inner.cache()
            }

            pub fn url(&self) -> &str {
                self.inner.url()
            }

            pub async fn session_state(&self) -> SessionState {
                self.inner.session_state().await
            }
        }

        impl PluginSession for $name {
            fn client(&self) -> &PluginClient {
                &self.inner
            }
        }

        impl $capability for $name {}
    };
}

plugin_client_type!(
    /// Client for a collector plugin
    CollectorClient,
    MetricCollector
);
plugin_client_type!(
    /// Client for a processor plugin
    ProcessorClient,
    ContentProcessor
);
plugin_client_type!(
    /// Client for a publisher plugin
    PublisherClient,
    ContentPublisher
);
