// Copyright (c) 2025 Pulse Contributors
// SPDX-License-Identifier: MIT

// ! Shared helpers for integration tests
// !
// ! A wiremock responder that emulates a plugin process, plus helpers to
// ! decode what the client sent and encode what the plugin answers.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;
use pulse_plugin_client::crypto::{Encrypter, PluginKeyPair};
use pulse_plugin_client::protocol::{CallRequest, CallResponse, SetKeyArgs, methods};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

/// Emulated plugin process answering calls through a handler
pub struct PluginEmulator<F> {
    handler: F,
}

impl<F> PluginEmulator<F>
where
    F: Fn(&CallRequest) -> CallResponse + Send + Sync + 'static,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F> Respond for PluginEmulator<F>
where
    F: Fn(&CallRequest) -> CallResponse + Send + Sync + 'static,
{
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let call: CallRequest =
            serde_json::from_slice(&request.body).expect("client sent a malformed envelope");
        ResponseTemplate::new(200).set_body_json((self.handler)(&call))
    }
}

/// Plugin-side session: opens the sealed key from `SetKey` and then
/// decrypts arguments and encrypts replies with it
#[derive(Clone)]
pub struct PluginSide {
    pub keys: Arc<PluginKeyPair>,
    pub session: Arc<Mutex<Option<Encrypter>>>,
}

impl PluginSide {
    pub fn new() -> Self {
        Self {
            keys: Arc::new(PluginKeyPair::generate()),
            session: Arc::new(Mutex::new(None)),
        }
    }

    /// Accept a `SetKey` call; returns the acknowledgement
    pub fn accept_key(&self, call: &CallRequest) -> CallResponse {
        assert_eq!(call.method, methods::SESSION_SET_KEY);
        let args: SetKeyArgs = serde_json::from_value(call.params[0].clone())
            .expect("SetKey carries a key object");
        let key = self
            .keys
            .decrypt_key(&args.key)
            .expect("sealed key opens with the plugin key pair");
        *self.session.lock() = Some(Encrypter::new(self.keys.public_key(), key));
        CallResponse::success(call.id, Vec::new())
    }

    pub fn encrypter(&self) -> Option<Encrypter> {
        self.session.lock().clone()
    }
}

/// Decode the single encoded argument of a call
pub fn decode_param<T: DeserializeOwned>(call: &CallRequest, encrypter: Option<&Encrypter>) -> T {
    let Some(Value::String(param)) = call.params.first() else {
        panic!("{} carries no encoded param", call.method);
    };
    let bytes = STANDARD.decode(param).expect("param is base64");
    let bytes = match encrypter {
        Some(encrypter) => encrypter.unwrap(&bytes).expect("param decrypts"),
        None => bytes,
    };
    serde_json::from_slice(&bytes).expect("param is JSON")
}

/// Successful response carrying `value`, encrypted when an encrypter is given
pub fn reply<T: Serialize>(
    call: &CallRequest,
    value: &T,
    encrypter: Option<&Encrypter>,
) -> CallResponse {
    let bytes = serde_json::to_vec(value).expect("reply serializes");
    let bytes = match encrypter {
        Some(encrypter) => encrypter.wrap(&bytes).expect("reply encrypts"),
        None => bytes,
    };
    CallResponse::success(call.id, bytes)
}

/// Envelopes the mock server received, in order
pub async fn received_calls(server: &MockServer) -> Vec<CallRequest> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("envelope is JSON"))
        .collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
