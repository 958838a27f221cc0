// ! Call dispatcher
// !
// ! Module frames method calls into request envelopes, performs one bounded
// ! exchange per call and advances the call id only when the exchange
// ! succeeded.

use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{Instrument, debug};

use crate::core::error::{PluginError, PluginResult};
use crate::core::logging::{ErrorContext, ErrorLogger};
use crate::protocol::types::{CallRequest, CallResponse};
use crate::transport::traits::Transport;

/// Issues calls against one plugin process
///
/// The id lock is held for the whole exchange, so a client never has more
/// than one call in flight and responses pair with requests in order.
pub struct Dispatcher {
    transport: Box<dyn Transport>,
    timeout: Duration,
    /// Id of the next call
    next_id: Mutex<u64>,
}

impl Dispatcher {
    /// Create a dispatcher over a transport with a per-call timeout
    pub fn new(transport: Box<dyn Transport>, timeout: Duration) -> Self {
        Self {
            transport,
            timeout,
            next_id: Mutex::new(0),
        }
    }

    /// Id the next call will carry
    pub async fn current_id(&self) -> u64 {
        *self.next_id.lock().await
    }

    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Description of the underlying transport
    pub fn connection_info(&self) -> String {
        self.transport.connection_info()
    }

    /// Send `method` with `params` and return the response envelope
    ///
    /// The envelope's `error` field is not interpreted here.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> PluginResult<CallResponse> {
        let mut next_id = self.next_id.lock().await;
        let request = CallRequest::new(method, *next_id, params);

        let span = ErrorLogger::create_operation_span(
            &ErrorContext::new("call")
                .with_method(method)
                .with_call_id(request.id),
        );
        let exchange = self.transport.send_request(&request).instrument(span);

        let outcome = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(outcome) => outcome,
            Err(_) => Err(PluginError::timeout(format!(
                "{method} did not complete within {}ms",
                self.timeout.as_millis()
            ))),
        };

        let response = match outcome {
            Ok(response) if response.id == request.id => response,
            Ok(response) => {
                let error = PluginError::ResponseMismatch {
                    expected: request.id,
                    actual: response.id,
                };
                self.log_failure(&error, &request);
                return Err(error);
            }
            Err(error) => {
                self.log_failure(&error, &request);
                return Err(error);
            }
        };

        *next_id += 1;
        debug!(method, id = request.id, next_id = *next_id, "Call completed");
        Ok(response)
    }

    fn log_failure(&self, error: &PluginError, request: &CallRequest) {
        let body = serde_json::to_value(request).unwrap_or(Value::Null);
        error.log_with_context(
            &ErrorContext::new("dispatch")
                .with_method(&request.method)
                .with_url(self.transport.connection_info())
                .with_call_id(request.id)
                .with_extra("request", body),
        );
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("transport", &self.transport.connection_info())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
