//! Small shared types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the controller connection.
///
/// The supervisor owns the current state; every transition is logged so an
/// operator can follow the session from the agent side alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and none being attempted.
    Disconnected,
    /// First dial of the process lifetime.
    Connecting,
    /// Channel is up, waiting for the controller to accept our key.
    Authenticating,
    /// Authenticated and serving traffic.
    Active,
    /// Connection lost, running the retry schedule.
    Reconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Authenticating => write!(f, "authenticating"),
            ConnectionState::Active => write!(f, "active"),
            ConnectionState::Reconnecting => write!(f, "reconnecting"),
        }
    }
}

/// Which auth flavor this install presents to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Ordinary monitored host.
    #[default]
    Host,
    /// Agent colocated with the controller itself.
    Server,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRole::Host => write!(f, "host"),
            AgentRole::Server => write!(f, "server"),
        }
    }
}
