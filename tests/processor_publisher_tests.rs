// Copyright (c) 2025 Pulse Contributors
// SPDX-License-Identifier: MIT

// ! Processor and publisher clients over HTTP

#![cfg(feature = "http")]

mod common;

use common::{PluginEmulator, decode_param, received_calls, reply};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use pulse_plugin_client::prelude::*;
use pulse_plugin_client::protocol::{
    CallResponse, KillArgs, ProcessorArgs, ProcessorReply, PublishArgs, methods,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer};

fn config() -> ConfigMap {
    let mut config = ConfigMap::new();
    config.insert("file".to_string(), ConfigValue::from("/tmp/out.log"));
    config.insert("compress".to_string(), ConfigValue::from(true));
    config
}

#[tokio::test]
async fn test_process_returns_transformed_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": methods::PROCESSOR_PROCESS})))
        .respond_with(PluginEmulator::new(|call| {
            let args: ProcessorArgs = decode_param(call, None);
            let upper = String::from_utf8_lossy(&args.content).to_uppercase();
            reply(
                call,
                &ProcessorReply {
                    content_type: "pulse.text".to_string(),
                    content: upper.into_bytes(),
                },
                None,
            )
        }))
        .expect(1)
        .mount(&server)
        .await;

    let processor = PluginClientBuilder::new(server.uri())
        .build_processor()
        .unwrap();
    assert_eq!(processor.kind(), PluginKind::Processor);

    let (content_type, content) = processor
        .process("pulse.json", b"load high", &config())
        .await
        .unwrap();

    assert_eq!(content_type, "pulse.text");
    assert_eq!(content, b"LOAD HIGH".to_vec());

    let calls = received_calls(&server).await;
    let args: ProcessorArgs = decode_param(&calls[0], None);
    assert_eq!(args.content_type, "pulse.json");
    assert_eq!(args.config, config());
}

#[tokio::test]
async fn test_publish_sends_content_and_config() {
    let server = MockServer::start().await;
    let published: Arc<Mutex<Vec<PublishArgs>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&published);
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": methods::PUBLISHER_PUBLISH})))
        .respond_with(PluginEmulator::new(move |call| {
            sink.lock().push(decode_param(call, None));
            CallResponse::success(call.id, Vec::new())
        }))
        .expect(2)
        .mount(&server)
        .await;

    let publisher = PluginClientBuilder::new(server.uri())
        .build_publisher()
        .unwrap();
    publisher
        .publish("pulse.json", br#"[{"v":1}]"#, &config())
        .await
        .unwrap();
    publisher
        .publish("pulse.json", &[0xff, 0x00, 0x7f], &ConfigMap::new())
        .await
        .unwrap();

    let published = published.lock();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].content, br#"[{"v":1}]"#.to_vec());
    assert_eq!(published[0].config, config());
    assert_eq!(published[1].content, vec![0xff, 0x00, 0x7f]);
}

#[tokio::test]
async fn test_publish_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(PluginEmulator::new(|call| {
            CallResponse::failure(call.id, "sink unavailable")
        }))
        .mount(&server)
        .await;

    let publisher = PluginClientBuilder::new(server.uri())
        .build_publisher()
        .unwrap();
    let error = publisher
        .publish("pulse.json", b"[]", &ConfigMap::new())
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "sink unavailable");
    assert_eq!(error.category(), "remote");
    assert!(!error.is_recoverable());
}

#[tokio::test]
async fn test_kill_and_ping_share_one_id_sequence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": methods::SESSION_PING, "params": []})))
        .respond_with(PluginEmulator::new(|call| {
            CallResponse::success(call.id, Vec::new())
        }))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": methods::SESSION_KILL})))
        .respond_with(PluginEmulator::new(|call| {
            CallResponse::success(call.id, Vec::new())
        }))
        .expect(1)
        .mount(&server)
        .await;

    let processor = PluginClientBuilder::new(server.uri())
        .build_processor()
        .unwrap();
    processor.ping().await.unwrap();
    processor.kill("control plane shutting down").await.unwrap();

    let calls = received_calls(&server).await;
    assert_eq!(calls.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 1]);
    let args: KillArgs = decode_param(&calls[1], None);
    assert_eq!(args.reason, "control plane shutting down");
}

#[tokio::test]
async fn test_slow_plugin_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_json(json!({"id": 0, "result": null, "error": ""}))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let publisher = PluginClientBuilder::new(server.uri())
        .with_timeout(std::time::Duration::from_millis(50))
        .build_publisher()
        .unwrap();
    let error = publisher.ping().await.unwrap_err();

    assert!(matches!(error, PluginError::Timeout(_)));
    assert!(error.is_recoverable());
}
