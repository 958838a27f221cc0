// ! Payload codec
// !
// ! Serializes typed arguments and replies to JSON bytes. When an encrypter
// ! is attached, encoding serializes then wraps and decoding unwraps then
// ! deserializes.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::error::{PluginError, PluginResult};
use crate::crypto::Encrypter;
use crate::protocol::types::base64_bytes;

/// JSON payload codec with optional session encryption
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    encrypter: Option<Encrypter>,
}

impl JsonCodec {
    /// Plaintext codec
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec that wraps every payload with the given encrypter
    pub fn with_encrypter(encrypter: Encrypter) -> Self {
        Self {
            encrypter: Some(encrypter),
        }
    }

    /// Attached encrypter, if any
    pub fn encrypter(&self) -> Option<&Encrypter> {
        self.encrypter.as_ref()
    }

    /// Serialize a value, wrapping it when encryption is configured
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> PluginResult<Vec<u8>> {
        let bytes = serde_json::to_vec(value).map_err(|e| PluginError::encoding(e.to_string()))?;
        match &self.encrypter {
            Some(encrypter) => encrypter.wrap(&bytes),
            None => Ok(bytes),
        }
    }

    /// Encode a value into the single `params` element of a request
    pub fn encode_param<T: Serialize + ?Sized>(&self, value: &T) -> PluginResult<Value> {
        Ok(Value::String(base64_bytes::encode(&self.encode(value)?)))
    }

    /// Deserialize a payload, unwrapping it first when encryption is configured
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> PluginResult<T> {
        if bytes.is_empty() {
            return Err(PluginError::decoding("empty payload"));
        }
        let plaintext;
        let bytes = match &self.encrypter {
            Some(encrypter) => {
                plaintext = encrypter.unwrap(bytes)?;
                plaintext.as_slice()
            }
            None => bytes,
        };
        serde_json::from_slice(bytes).map_err(|e| PluginError::decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PluginKeyPair;
    use crate::protocol::cpolicy::{ConfigPolicy, PolicyNode, Rule};
    use crate::protocol::messages::{
        CollectMetricsArgs, CollectMetricsReply, GetConfigPolicyReply, GetMetricTypesReply,
        KillArgs, ProcessorArgs, ProcessorReply, PublishArgs, SetKeyArgs,
    };
    use crate::protocol::metric::{
        ConfigMap, ConfigValue, ConfigValueKind, Metric, Namespace, PluginMetricType,
    };
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn collect_args() -> CollectMetricsArgs {
        CollectMetricsArgs {
            plugin_metric_types: vec![PluginMetricType::new(
                Namespace::new(["cpu", "0", "load"]).unwrap(),
            )],
        }
    }

    #[test]
    fn test_plaintext_encode_is_json() {
        let codec = JsonCodec::new();
        let bytes = codec
            .encode(&KillArgs {
                reason: "restart".to_string(),
            })
            .unwrap();
        assert_eq!(bytes, br#"{"reason":"restart"}"#.to_vec());
    }

    fn assert_round_trip<T>(codec: &JsonCodec, value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let decoded: T = codec.decode(&codec.encode(value).unwrap()).unwrap();
        assert_eq!(&decoded, value);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let plugin = PluginKeyPair::generate();
        let secure = JsonCodec::with_encrypter(Encrypter::generate(plugin.public_key()).unwrap());
        assert!(secure.encrypter().is_some());
        assert!(JsonCodec::new().encrypter().is_none());

        let namespace = Namespace::new(["cpu", "0", "load"]).unwrap();
        let mut config = ConfigMap::new();
        config.insert("interval".to_string(), ConfigValue::from(1.5));
        config.insert("enabled".to_string(), ConfigValue::from(true));
        config.insert("retries".to_string(), ConfigValue::from(3i64));
        config.insert("host".to_string(), ConfigValue::from("db-01"));

        let collected_at = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        let metric = Metric::new(namespace.clone(), json!({"load": 0.75, "cores": 8}))
            .with_config(config.clone())
            .with_source("node-7")
            .with_timestamp(collected_at);

        let mut policy = ConfigPolicy::new();
        policy.add(
            &namespace,
            PolicyNode::new(vec![
                Rule::new("interval", ConfigValueKind::Float)
                    .required()
                    .with_default(0.25)
                    .with_range(0.0, 100.0),
                Rule::new("host", ConfigValueKind::String),
            ]),
        );

        for codec in [JsonCodec::new(), secure] {
            assert_round_trip(&codec, &SetKeyArgs { key: vec![7; 80] });
            assert_round_trip(&codec, &KillArgs {
                reason: "control plane exiting".to_string(),
            });
            assert_round_trip(&codec, &collect_args());
            assert_round_trip(&codec, &CollectMetricsReply {
                plugin_metrics: vec![metric.clone()],
            });
            assert_round_trip(&codec, &GetMetricTypesReply {
                plugin_metric_types: vec![
                    PluginMetricType::new(namespace.clone()).with_config(config.clone()),
                ],
            });
            assert_round_trip(&codec, &GetConfigPolicyReply {
                policy: policy.clone(),
            });
            assert_round_trip(&codec, &ProcessorArgs {
                content_type: "pulse.json".to_string(),
                content: b"[1,2,3]".to_vec(),
                config: config.clone(),
            });
            assert_round_trip(&codec, &ProcessorReply {
                content_type: "pulse.gob".to_string(),
                content: vec![0, 1, 2, 255],
            });
            assert_round_trip(&codec, &PublishArgs {
                content_type: "pulse.json".to_string(),
                content: vec![0xff, 0x00, 0x7f],
                config: config.clone(),
            });
        }
    }

    #[test]
    fn test_encrypted_payload_is_not_plaintext() {
        let plugin = PluginKeyPair::generate();
        let codec = JsonCodec::with_encrypter(Encrypter::generate(plugin.public_key()).unwrap());
        let bytes = codec.encode(&collect_args()).unwrap();
        assert!(serde_json::from_slice::<CollectMetricsArgs>(&bytes).is_err());
    }

    #[test]
    fn test_decode_with_wrong_key_fails() {
        let plugin = PluginKeyPair::generate();
        let a = JsonCodec::with_encrypter(Encrypter::generate(plugin.public_key()).unwrap());
        let b = JsonCodec::with_encrypter(Encrypter::generate(plugin.public_key()).unwrap());
        let bytes = a.encode(&collect_args()).unwrap();
        assert!(matches!(
            b.decode::<CollectMetricsArgs>(&bytes),
            Err(PluginError::Decryption(_))
        ));
    }

    #[test]
    fn test_decode_empty_payload_fails() {
        let codec = JsonCodec::new();
        assert!(matches!(
            codec.decode::<ProcessorReply>(&[]),
            Err(PluginError::Decoding(_))
        ));
    }

    #[test]
    fn test_encode_param_is_base64_of_payload() {
        let codec = JsonCodec::new();
        let args = KillArgs {
            reason: "bye".to_string(),
        };
        let Value::String(param) = codec.encode_param(&args).unwrap() else {
            panic!("param must be a string");
        };
        assert_eq!(STANDARD.decode(param).unwrap(), codec.encode(&args).unwrap());
    }
}
