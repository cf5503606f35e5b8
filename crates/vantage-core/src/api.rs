//! Backend response envelopes
//!
//! Every backend response is wrapped as `{code, data, msg}`; only code 200
//! carries usable data.

use serde::{Deserialize, Serialize};

use vantage_session::MenuEntry;

use crate::error::CoreError;
use crate::Result;

pub const SUCCESS_CODE: i32 = 200;

const NETWORK_ERROR: &str = "Network error, please try again later";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i32,
    pub data: Option<T>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_result(self) -> Result<T> {
        let message = self.msg.unwrap_or_else(|| NETWORK_ERROR.to_string());

        if self.code != SUCCESS_CODE {
            return Err(CoreError::Api {
                code: self.code,
                message,
            });
        }

        self.data.ok_or(CoreError::Api {
            code: self.code,
            message,
        })
    }
}

/// Payload of the permission-menu endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuResponse {
    pub menu_list: Vec<MenuEntry>,
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl MenuResponse {
    /// Decode a raw permission-menu response body
    pub fn from_body(body: &str) -> Result<Self> {
        let envelope: ApiEnvelope<MenuResponse> = serde_json::from_str(body)?;
        envelope.into_result()
    }
}
