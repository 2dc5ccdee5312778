//! Agent configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils;
use crate::types::AgentRole;

/// Agent-side configuration, loaded from `agent.toml`.
///
/// Every field has a default, so a missing or partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Auth flavor this install presents.
    pub role: AgentRole,

    /// Seconds between liveness probes.
    #[serde(with = "serde_utils::duration_secs")]
    pub heartbeat_interval: Duration,

    /// Seconds between unsolicited usage reports once authenticated.
    #[serde(with = "serde_utils::duration_secs")]
    pub report_interval: Duration,

    /// Retry schedule for a lost connection.
    pub reconnect: ReconnectConfig,

    /// Directory holding the credential lock file.
    pub state_dir: PathBuf,

    /// Mirror logs into daily files under this directory when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            role: AgentRole::Host,
            heartbeat_interval: Duration::from_secs(20),
            report_interval: Duration::from_secs(60),
            reconnect: ReconnectConfig::default(),
            state_dir: super::default_state_dir(),
            log_dir: None,
        }
    }
}

/// Retry schedule for re-establishing a lost connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Consecutive dial failures tolerated before the agent gives up.
    pub max_attempts: u32,

    /// Fixed pause before each dial.
    #[serde(with = "serde_utils::duration_secs")]
    pub backoff: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}
