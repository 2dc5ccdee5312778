//! Inbound frame dispatch.
//!
//! One dispatcher serves one established connection. It drains the reader,
//! classifies each frame, and answers requests through the shared sink. The
//! usage reporter belongs to the dispatcher: it starts on the first `info`
//! success acknowledgement and dies with the connection.

use std::sync::Arc;

use vigil_core::ConnectionState;
use vigil_protocol::{Ack, Command, Envelope, Inbound, Message};

use crate::conn::{ChannelError, ChannelReader, FrameSink};
use crate::state::AgentState;
use crate::tasks::{self, TaskHandle};

/// Per-connection frame dispatcher.
pub struct Dispatcher {
    state: Arc<AgentState>,
    sink: Arc<dyn FrameSink>,
    reporter: Option<TaskHandle>,
}

impl Dispatcher {
    pub fn new(state: Arc<AgentState>, sink: Arc<dyn FrameSink>) -> Self {
        Self {
            state,
            sink,
            reporter: None,
        }
    }

    /// Serves the connection until the reader fails, returning the reason.
    pub async fn run(&mut self, reader: &mut ChannelReader) -> String {
        let reason = loop {
            match reader.next_frame().await {
                Ok(text) => self.handle_frame(&text).await,
                Err(ChannelError::Closed) => break "Channel closed".to_string(),
                Err(e) => break format!("Transport error: {}", e),
            }
        };
        self.shutdown().await;
        reason
    }

    /// Stops the reporter if one is running. A fresh acknowledgement on the
    /// next connection starts a new one.
    pub async fn shutdown(&mut self) {
        if let Some(reporter) = self.reporter.take() {
            reporter.stop().await;
        }
    }

    async fn handle_frame(&mut self, text: &str) {
        tracing::debug!("Received frame: {}", text);

        let envelope = match Envelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Skipping malformed frame: {}", e);
                return;
            }
        };

        if envelope.is_auth_success() {
            self.state.set_connection(ConnectionState::Active).await;
            self.persist_credentials();
        }

        match envelope.classify() {
            Inbound::Ack(ack) => self.handle_ack(ack),
            Inbound::Command(command) => self.handle_command(command).await,
            Inbound::StatusOnly { kind, status } => {
                tracing::debug!("Ignoring bare status frame {} {}", kind, status);
            }
        }
    }

    fn handle_ack(&mut self, ack: Ack<'_>) {
        if ack.succeeded() {
            tracing::info!("Controller acknowledged {}", ack);
            if ack.kind == "info" {
                self.start_reporter();
            }
        } else {
            tracing::warn!("Controller reported {}", ack);
        }
    }

    async fn handle_command(&mut self, command: Command<'_>) {
        let reply = match command {
            Command::Hello => Message::Hi,
            Command::Auth => Message::Auth {
                data: self.state.auth_payload(),
            },
            Command::Info => Message::Info {
                data: self.state.metrics.inventory_snapshot().await,
            },
            Command::Unknown { kind, data } => {
                match data {
                    Some(data) => {
                        tracing::warn!("Ignoring unknown message type '{}': {}", kind, data)
                    }
                    None => tracing::warn!("Ignoring unknown message type '{}'", kind),
                }
                return;
            }
        };

        if let Err(e) = self.sink.send(&reply).await {
            tracing::error!("Failed to send reply: {}", e);
        }
    }

    fn start_reporter(&mut self) {
        if self.reporter.is_some() {
            return;
        }
        tracing::info!(
            "Starting usage reporter (every {:?})",
            self.state.config.report_interval
        );
        self.reporter = Some(tasks::spawn_reporter(
            Arc::clone(&self.state),
            Arc::clone(&self.sink),
        ));
    }

    fn persist_credentials(&self) {
        match self.state.store.save_once(&self.state.credentials) {
            Ok(true) => {
                tracing::info!("Credentials saved to {:?}", self.state.store.path());
            }
            Ok(false) => {}
            Err(e) => tracing::error!("Failed to save credentials: {}", e),
        }
    }
}
