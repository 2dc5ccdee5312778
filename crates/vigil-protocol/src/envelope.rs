//! Inbound frame decoding and classification.
//!
//! The controller is free to send any JSON object tagged by `type`, so
//! inbound traffic is decoded into a loose [`Envelope`] first. A frame
//! carrying both `status` and `message` is an acknowledgement of something
//! the agent sent earlier; a frame with no `status` at all is a command
//! dispatched by its `type`; a `status` on its own is neither, and is never
//! answered.

use std::fmt;

use serde::Deserialize;

use crate::error::ProtocolError;

const STATUS_SUCCESS: &str = "success";

/// One decoded inbound frame, before classification.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Discriminator shared with outbound frames.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Opaque payload, kept verbatim for unknown kinds.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound<'a> {
    /// Controller acknowledged an earlier frame of ours.
    Ack(Ack<'a>),
    /// Controller wants something from us.
    Command(Command<'a>),
    /// A `status` with no `message`. Neither acknowledgement nor command,
    /// and never answered.
    StatusOnly { kind: &'a str, status: &'a str },
}

/// Acknowledgement fields carried by a status envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack<'a> {
    pub kind: &'a str,
    pub status: &'a str,
    pub message: &'a str,
}

impl Ack<'_> {
    pub fn succeeded(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

impl fmt::Display for Ack<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.status, self.message)
    }
}

/// Requests the agent knows how to answer, plus a catch-all.
#[derive(Debug, Clone, PartialEq)]
pub enum Command<'a> {
    /// Reply with `hi`.
    Hello,
    /// Present the pairing key.
    Auth,
    /// Report a full host snapshot.
    Info,
    /// Anything this agent version does not understand.
    Unknown {
        kind: &'a str,
        data: Option<&'a serde_json::Value>,
    },
}

impl Envelope {
    /// Decodes one text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// True for the `auth` success acknowledgement that carries the right to
    /// persist credentials.
    pub fn is_auth_success(&self) -> bool {
        self.kind == "auth" && self.status.as_deref() == Some(STATUS_SUCCESS)
    }

    /// Splits the frame into acknowledgement, bare status, or command.
    ///
    /// An acknowledgement needs both `status` and `message`. Command
    /// dispatch only applies when `status` is absent; a `status` on its own
    /// classifies as [`Inbound::StatusOnly`] and draws no reply.
    pub fn classify(&self) -> Inbound<'_> {
        match (self.status.as_deref(), self.message.as_deref()) {
            (Some(status), Some(message)) => Inbound::Ack(Ack {
                kind: &self.kind,
                status,
                message,
            }),
            (Some(status), None) => Inbound::StatusOnly {
                kind: &self.kind,
                status,
            },
            (None, _) => Inbound::Command(match self.kind.as_str() {
                "hello" => Command::Hello,
                "auth" => Command::Auth,
                "info" => Command::Info,
                _ => Command::Unknown {
                    kind: &self.kind,
                    data: self.data.as_ref(),
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_with_no_status_is_a_command() {
        let env = Envelope::parse(r#"{"type":"hello"}"#).unwrap();
        assert!(matches!(env.classify(), Inbound::Command(Command::Hello)));
    }

    #[test]
    fn test_status_and_message_classify_as_ack() {
        let env =
            Envelope::parse(r#"{"type":"auth","status":"success","message":"Authenticated"}"#)
                .unwrap();
        match env.classify() {
            Inbound::Ack(ack) => {
                assert_eq!(ack.kind, "auth");
                assert_eq!(ack.message, "Authenticated");
                assert!(ack.succeeded());
            }
            other => panic!("expected ack, got {other:?}"),
        }
    }

    #[test]
    fn test_status_without_message_is_neither_ack_nor_command() {
        let env = Envelope::parse(r#"{"type":"hello","status":"pending"}"#).unwrap();
        assert!(matches!(
            env.classify(),
            Inbound::StatusOnly {
                kind: "hello",
                status: "pending"
            }
        ));
    }

    #[test]
    fn test_message_without_status_is_a_command() {
        let env = Envelope::parse(r#"{"type":"hello","message":"ping"}"#).unwrap();
        assert!(matches!(env.classify(), Inbound::Command(Command::Hello)));
    }

    #[test]
    fn test_ack_display_quotes_all_three_fields() {
        let ack = Ack {
            kind: "info",
            status: "success",
            message: "Reported",
        };
        assert_eq!(ack.to_string(), "info success: Reported");
    }

    #[test]
    fn test_failed_ack_does_not_report_success() {
        let env = Envelope::parse(r#"{"type":"info","status":"failed","message":"No such host"}"#)
            .unwrap();
        match env.classify() {
            Inbound::Ack(ack) => assert!(!ack.succeeded()),
            other => panic!("expected ack, got {other:?}"),
        }
    }

    #[test]
    fn test_auth_success_grants_persist() {
        let env =
            Envelope::parse(r#"{"type":"auth","status":"success","message":"ok"}"#).unwrap();
        assert!(env.is_auth_success());
    }

    #[test]
    fn test_auth_failure_does_not_grant_persist() {
        let env =
            Envelope::parse(r#"{"type":"auth","status":"failed","message":"Bad key"}"#).unwrap();
        assert!(!env.is_auth_success());
    }

    #[test]
    fn test_unknown_kind_keeps_its_payload() {
        let env = Envelope::parse(r#"{"type":"restart","data":{"delay":5}}"#).unwrap();
        match env.classify() {
            Inbound::Command(Command::Unknown { kind, data }) => {
                assert_eq!(kind, "restart");
                assert_eq!(data.unwrap()["delay"], 5);
            }
            other => panic!("expected unknown command, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_text_is_a_decode_error() {
        let err = Envelope::parse("{nope").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_missing_type_is_a_decode_error() {
        assert!(Envelope::parse(r#"{"status":"success"}"#).is_err());
    }
}
