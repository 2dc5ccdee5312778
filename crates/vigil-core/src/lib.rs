//! Shared configuration, credential, and state types for the Vigil agent.

pub mod config;
pub mod credentials;
pub mod error;
pub mod types;

pub use config::{AgentConfig, ReconnectConfig};
pub use credentials::{CredentialStore, Credentials};
pub use error::{ConfigError, CredentialError};
pub use types::{AgentRole, ConnectionState};
