//! Response envelope returned to callers.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

fn default_true() -> bool {
    true
}

/// Field-level error reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Pagination metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMeta {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub total: Option<u64>,
    pub total_pages: Option<u64>,
    pub has_next: Option<bool>,
    pub has_prev: Option<bool>,
}

/// Standard API envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ApiError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ApiMeta>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data,
            message: None,
            success: true,
            errors: None,
            meta: None,
        }
    }
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Decode a 2xx body. Bodies that are not an envelope become its `data`.
    pub fn from_body(body: Value) -> Result<Self, serde_json::Error> {
        let is_envelope = body
            .as_object()
            .is_some_and(|o| o.contains_key("data") && o.contains_key("success"));

        if is_envelope {
            serde_json::from_value(body)
        } else {
            Ok(Self::ok(serde_json::from_value(body)?))
        }
    }
}
