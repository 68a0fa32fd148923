// SPDX-License-Identifier: MIT

//! Identity service wire messages.
//!
//! Closed tagged-variant types per message kind, each carrying only its
//! required fields. Validation is exhaustive matching during
//! deserialization: an unknown `message_type` or `user_type`, or a
//! missing mandatory field, fails the parse and the request is dropped
//! before any handler sees it.

use serde::{Deserialize, Serialize};

use crate::models::{ExternalIdentity, ProviderKey};

pub const PROTOCOL_VERSION: &str = "1.0";
pub const STATUS_OK: &str = "ok";

/// Inbound request. A `version` field in the envelope is accepted and
/// ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum Request {
    Ping,
    GetUser {
        #[serde(flatten)]
        key: ProviderKey,
    },
    AddUser {
        #[serde(flatten)]
        identity: ExternalIdentity,
    },
}

/// Outbound reply body; wrapped in [`Envelope`] on the wire.
#[derive(Debug, Serialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum Reply {
    Pong {
        status: &'static str,
    },
    GetUserResponse {
        status: &'static str,
        user_id: Option<String>,
    },
    AddUserResponse {
        status: &'static str,
        user_id: String,
    },
}

/// Every reply carries the protocol version.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub version: &'static str,
    #[serde(flatten)]
    pub reply: Reply,
}

impl Envelope {
    pub fn new(reply: Reply) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            reply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ping_ignores_version() {
        let request: Request =
            serde_json::from_value(json!({"version": "1.0", "message_type": "ping"})).unwrap();
        assert!(matches!(request, Request::Ping));
    }

    #[test]
    fn test_parse_get_user_google() {
        let request: Request = serde_json::from_value(json!({
            "message_type": "get_user",
            "user_type": "google",
            "email": "u@h.com"
        }))
        .unwrap();
        match request {
            Request::GetUser { key } => assert_eq!(
                key,
                ProviderKey::Google {
                    email: "u@h.com".to_string()
                }
            ),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_missing_user_type_rejected() {
        let result: Result<Request, _> =
            serde_json::from_value(json!({"message_type": "get_user"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_user_type_rejected() {
        let result: Result<Request, _> = serde_json::from_value(json!({
            "message_type": "get_user",
            "user_type": "myspace",
            "email": "u@h.com"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_message_type_rejected() {
        let result: Result<Request, _> =
            serde_json::from_value(json!({"message_type": "delete_user"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_mandatory_field_rejected() {
        let result: Result<Request, _> = serde_json::from_value(json!({
            "message_type": "get_user",
            "user_type": "google"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_pong_envelope_shape() {
        let encoded =
            serde_json::to_value(Envelope::new(Reply::Pong { status: STATUS_OK })).unwrap();
        assert_eq!(
            encoded,
            json!({"version": "1.0", "message_type": "pong", "status": "ok"})
        );
    }

    #[test]
    fn test_null_user_id_is_explicit() {
        let encoded = serde_json::to_value(Envelope::new(Reply::GetUserResponse {
            status: STATUS_OK,
            user_id: None,
        }))
        .unwrap();
        assert!(encoded.get("user_id").is_some());
        assert!(encoded["user_id"].is_null());
    }
}
