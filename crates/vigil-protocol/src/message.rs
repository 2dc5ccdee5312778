//! Outbound frames produced by the agent.

use serde::Serialize;

use crate::snapshot::HostSnapshot;

/// A frame sent from the agent to its controller.
///
/// Serializes as a JSON object tagged by `type`. Variants without a
/// payload carry no `data` key at all.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Periodic liveness probe.
    Hello,
    /// Reply to a controller-initiated `hello`.
    Hi,
    /// Credential presentation in reply to an `auth` request.
    Auth { data: AuthPayload },
    /// Host metrics, on request or from the report timer.
    Info { data: HostSnapshot },
}

/// Payload of an outbound `auth` frame.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthPayload {
    /// Present only when the agent runs on the controller's own server.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Pairing key issued by the controller.
    pub key: String,
}

impl AuthPayload {
    /// Payload for an ordinary host install.
    pub fn host(key: impl Into<String>) -> Self {
        Self {
            role: None,
            key: key.into(),
        }
    }

    /// Payload for an agent colocated with the controller.
    pub fn server(key: impl Into<String>) -> Self {
        Self {
            role: Some("server".to_string()),
            key: key.into(),
        }
    }
}
