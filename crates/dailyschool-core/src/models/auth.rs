//! Wire types for the remote auth API and the in-memory session identity.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Response body shared by every endpoint of the remote API.
///
/// Payloads live under `data`; `status` and `message` are informational and
/// their shape varies between endpoints, so they are kept loosely typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiEnvelope {
    /// Decode `data` into `T`, returning `None` when it is absent or has a
    /// different shape.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.data
            .as_ref()
            .and_then(|data| serde_json::from_value(data.clone()).ok())
    }

    /// Server-provided message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// `data` payload of a sign-in response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(rename = "accessToken", default)]
    pub access_token: Option<String>,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: Option<String>,
}

impl TokenPayload {
    /// Both tokens, if both are present and non-empty.
    pub fn into_pair(self) -> Option<(String, String)> {
        match (self.access_token, self.refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Some((access, refresh))
            }
            _ => None,
        }
    }
}

/// `data` payload of a refresh response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshPayload {
    #[serde(rename = "accessToken", default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
    pub name: String,
}

impl SessionUser {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }

    /// Label used in greetings, e.g. "Alice (alice@school.kr)".
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.email.clone()
        } else {
            format!("{} ({})", self.name, self.email)
        }
    }
}
