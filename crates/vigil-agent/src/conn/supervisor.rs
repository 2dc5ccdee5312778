//! Connection lifecycle: first dial, session loop, bounded reconnect.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use vigil_core::{ConnectionState, ReconnectConfig};

use crate::dispatch::Dispatcher;
use crate::state::AgentState;
use crate::tasks;

use super::channel::{self, Channel, ChannelError, ChannelReader, FrameSink};

/// Errors that end the agent run.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// First dial of the process failed
    #[error("Initial connection failed: {0}")]
    InitialConnect(#[source] ChannelError),

    /// Retry schedule ran out during a reconnect episode
    #[error("Gave up after {attempts} consecutive reconnect failures")]
    RetriesExhausted { attempts: u32 },
}

/// Owns the connection lifecycle from first dial to final failure.
pub struct Supervisor {
    state: Arc<AgentState>,
}

impl Supervisor {
    pub fn new(state: Arc<AgentState>) -> Self {
        Self { state }
    }

    /// Runs the agent until the retry schedule is exhausted.
    ///
    /// The first dial is fatal on failure so a bad endpoint surfaces
    /// immediately; connection drops after that go through the bounded
    /// reconnect schedule.
    pub async fn run(&self) -> Result<(), SupervisorError> {
        let endpoint = self.state.credentials.endpoint.clone();

        self.state.set_connection(ConnectionState::Connecting).await;
        let mut session = channel::connect(&endpoint)
            .await
            .map_err(SupervisorError::InitialConnect)?;
        tracing::info!("Connected to controller at {}", endpoint);

        loop {
            let (channel, mut reader) = session;
            self.state
                .set_connection(ConnectionState::Authenticating)
                .await;

            let sink: Arc<dyn FrameSink> = Arc::new(channel);
            let heartbeat =
                tasks::spawn_heartbeat(self.state.config.heartbeat_interval, Arc::clone(&sink));

            let mut dispatcher = Dispatcher::new(Arc::clone(&self.state), Arc::clone(&sink));
            let reason = dispatcher.run(&mut reader).await;
            tracing::warn!("Disconnected: {}", reason);

            heartbeat.stop().await;
            self.state.set_connection(ConnectionState::Disconnected).await;
            self.state.set_connection(ConnectionState::Reconnecting).await;

            session = self.reconnect(&endpoint).await?;
            tracing::info!("Reconnected to controller at {}", endpoint);
        }
    }

    async fn reconnect(&self, endpoint: &str) -> Result<(Channel, ChannelReader), SupervisorError> {
        run_episode(&self.state.config.reconnect, || async move {
            self.state.set_connection(ConnectionState::Connecting).await;
            channel::connect(endpoint).await
        })
        .await
    }
}

/// One reconnect episode over an arbitrary dial function.
///
/// Sleeps the fixed backoff before every dial. Tolerates `max_attempts`
/// consecutive failures; one more ends the episode.
async fn run_episode<T, E, F, Fut>(
    config: &ReconnectConfig,
    mut dial: F,
) -> Result<T, SupervisorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut failures = 0;
    loop {
        tokio::time::sleep(config.backoff).await;
        match dial().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                failures += 1;
                if failures > config.max_attempts {
                    return Err(SupervisorError::RetriesExhausted { attempts: failures });
                }
                tracing::warn!(
                    "Reconnect attempt {}/{} failed: {}",
                    failures,
                    config.max_attempts,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn config(max_attempts: u32) -> ReconnectConfig {
        ReconnectConfig {
            max_attempts,
            backoff: Duration::from_secs(5),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_episode_recovers_within_the_budget() {
        let dials = AtomicU32::new(0);
        let result = run_episode(&config(3), || {
            let n = dials.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err("connection refused")
                } else {
                    Ok(n + 1)
                }
            }
        })
        .await;

        // Three failures tolerated, the fourth dial lands.
        assert_eq!(result.unwrap(), 4);
        assert_eq!(dials.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_episode_gives_up_past_the_budget() {
        let dials = AtomicU32::new(0);
        let result: Result<(), _> = run_episode(&config(3), || {
            dials.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("connection refused") }
        })
        .await;

        assert!(matches!(
            result,
            Err(SupervisorError::RetriesExhausted { attempts: 4 })
        ));
        assert_eq!(dials.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_resets_between_episodes() {
        let dials = AtomicU32::new(0);
        // Each episode of four dials fails three times, then lands.
        let dial = || {
            let n = dials.fetch_add(1, Ordering::SeqCst);
            async move {
                if n % 4 < 3 {
                    Err("connection refused")
                } else {
                    Ok(n)
                }
            }
        };

        assert_eq!(run_episode(&config(3), dial).await.unwrap(), 3);
        assert_eq!(run_episode(&config(3), dial).await.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_runs_before_every_dial() {
        let start = tokio::time::Instant::now();
        let times: Mutex<Vec<Duration>> = Mutex::new(Vec::new());

        let result: Result<(), _> = run_episode(&config(2), || {
            times.lock().unwrap().push(start.elapsed());
            async { Err::<(), _>("connection refused") }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(
            *times.lock().unwrap(),
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(15),
            ]
        );
    }
}
