// ! In-process transport for unit tests
// !
// ! Answers every request through a handler closure and records what was sent.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::core::error::PluginResult;
use crate::protocol::types::{CallRequest, CallResponse};
use crate::transport::traits::Transport;

type Handler = Box<dyn Fn(&CallRequest) -> PluginResult<CallResponse> + Send + Sync>;

pub(crate) struct MockTransport {
    handler: Handler,
    requests: Arc<Mutex<Vec<CallRequest>>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: Fn(&CallRequest) -> PluginResult<CallResponse> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Plugin that acknowledges every call with an empty result
    pub(crate) fn acknowledging() -> Self {
        Self::new(|request| Ok(CallResponse::success(request.id, Vec::new())))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared log of every request the transport received
    pub(crate) fn recorder(&self) -> Arc<Mutex<Vec<CallRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_request(&self, request: &CallRequest) -> PluginResult<CallResponse> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(request)
    }

    fn connection_info(&self) -> String {
        "mock://plugin".to_string()
    }
}
