use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Incoming call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub id: u64,
    #[serde(default)]
    pub params: Value,
}

/// Reply to a call. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub sig: Signature,
}

impl Response {
    pub fn success(id: u64, result: Value, sig: Signature) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
            sig,
        }
    }

    pub fn failure(id: u64, error: impl ToString, sig: Signature) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.to_string()),
            sig,
        }
    }
}

/// Server identification returned with every reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub author: String,
    pub version: String,
}

impl Signature {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            author: "memstore".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
