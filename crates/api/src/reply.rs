//! Response shapes shared across resource modules.

use serde::{Deserialize, Serialize};
use weknora_core::ErrorEnvelope;

/// `{success, data?, message?}` reply used by the account endpoints.
///
/// Calls returning this type never fail: a rejected request becomes
/// `success: false` carrying the envelope's message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiReply<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiReply<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

impl<T> From<ErrorEnvelope> for ApiReply<T> {
    fn from(err: ErrorEnvelope) -> Self {
        Self::failed(err.message())
    }
}

/// `{code, msg}` acknowledgement returned by user-management endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMessage {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}
