// ! Call envelope types
// !
// ! Request and response envelopes exchanged with a plugin process, plus the
// ! serde helper that carries byte payloads as base64 strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request envelope: `{"method": "Service.Method", "id": N, "params": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallRequest {
    /// Method name in `Service.Method` form
    pub method: String,
    /// Call id, unique per client instance
    pub id: u64,
    /// Zero or one encoded argument
    #[serde(default)]
    pub params: Vec<Value>,
}

impl CallRequest {
    /// Create a new request envelope
    pub fn new(method: impl Into<String>, id: u64, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            id,
            params,
        }
    }
}

/// Response envelope: `{"id": N, "result": "<base64>", "error": "..."}`
///
/// A missing or null `result`/`error` reads as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CallResponse {
    /// Id echoed by the plugin
    pub id: u64,
    /// Encoded reply payload, empty when the call has no result
    #[serde(default, with = "base64_bytes")]
    pub result: Vec<u8>,
    /// Failure text reported by the plugin, empty on success
    #[serde(default, deserialize_with = "null_as_empty")]
    pub error: String,
}

impl CallResponse {
    /// Successful response carrying an encoded payload
    pub fn success(id: u64, result: Vec<u8>) -> Self {
        Self {
            id,
            result,
            error: String::new(),
        }
    }

    /// Failed response carrying the plugin's error text
    pub fn failure(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            result: Vec::new(),
            error: error.into(),
        }
    }

    /// Whether the plugin reported an error
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Byte payloads travel as base64 strings; a JSON array of octets or null is
/// also accepted on input.
pub mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Encoded(String),
        Octets(Vec<u8>),
    }

    /// Serialize bytes as a base64 string
    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    /// Deserialize bytes from a base64 string, an octet array or null
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(Vec::new()),
            Some(Repr::Octets(bytes)) => Ok(bytes),
            Some(Repr::Encoded(text)) => STANDARD
                .decode(text.as_bytes())
                .map_err(serde::de::Error::custom),
        }
    }

    /// Encode bytes the same way the wire format does
    pub fn encode(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }
}
