//! Agent state management

use tokio::sync::Mutex;

use vigil_core::{AgentConfig, AgentRole, ConnectionState, CredentialStore, Credentials};
use vigil_protocol::AuthPayload;

use crate::metrics::MetricsProvider;

/// Shared state for the agent daemon, threaded through dispatch and the
/// background timers behind one `Arc`.
pub struct AgentState {
    /// Configuration
    pub config: AgentConfig,
    /// Controller endpoint and pairing key in use
    pub credentials: Credentials,
    /// Persistence for the credentials
    pub store: CredentialStore,
    /// Host metrics source
    pub metrics: MetricsProvider,
    /// Current connection lifecycle state
    connection: Mutex<ConnectionState>,
}

impl AgentState {
    /// Create new agent state, starting disconnected.
    pub fn new(
        config: AgentConfig,
        credentials: Credentials,
        store: CredentialStore,
        metrics: MetricsProvider,
    ) -> Self {
        Self {
            config,
            credentials,
            store,
            metrics,
            connection: Mutex::new(ConnectionState::Disconnected),
        }
    }

    /// Current lifecycle state.
    pub async fn connection(&self) -> ConnectionState {
        *self.connection.lock().await
    }

    /// Moves the lifecycle to `next`, logging the transition.
    pub async fn set_connection(&self, next: ConnectionState) {
        let mut connection = self.connection.lock().await;
        if *connection != next {
            tracing::info!("Connection state: {} -> {}", *connection, next);
            *connection = next;
        }
    }

    /// Auth reply payload for this install's role.
    pub fn auth_payload(&self) -> AuthPayload {
        match self.config.role {
            AgentRole::Host => AuthPayload::host(self.credentials.key.clone()),
            AgentRole::Server => AuthPayload::server(self.credentials.key.clone()),
        }
    }
}
