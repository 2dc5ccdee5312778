//! Background timers and their handles.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use vigil_protocol::Message;

use crate::conn::FrameSink;
use crate::state::AgentState;

/// Handle to a spawned background task.
///
/// Dropping the handle does not stop the task; call [`TaskHandle::stop`] to
/// cancel it and wait for it to finish.
pub struct TaskHandle {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl TaskHandle {
    fn new(handle: JoinHandle<()>, cancel: CancellationToken) -> Self {
        Self { handle, cancel }
    }

    /// Cancels the task and waits briefly for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = tokio::time::timeout(Duration::from_millis(500), self.handle).await;
    }
}

/// Spawns the liveness probe, sending `hello` on a fixed interval.
///
/// The first probe fires one full interval after spawn. Send failures are
/// logged and swallowed; the reader notices a dead connection soon enough.
pub fn spawn_heartbeat(interval: Duration, sink: Arc<dyn FrameSink>) -> TaskHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let handle = tokio::spawn(async move {
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = sink.send(&Message::Hello).await {
                        tracing::warn!("Failed to send heartbeat: {}", e);
                    }
                }
            }
        }
        tracing::debug!("Heartbeat task exiting");
    });

    TaskHandle::new(handle, cancel)
}

/// Spawns the usage reporter, sending an `info` snapshot on a fixed interval.
pub fn spawn_reporter(state: Arc<AgentState>, sink: Arc<dyn FrameSink>) -> TaskHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let handle = tokio::spawn(async move {
        let period = state.config.report_interval;
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let snapshot = state.metrics.usage_snapshot().await;
                    if let Err(e) = sink.send(&Message::Info { data: snapshot }).await {
                        tracing::warn!("Failed to send usage report: {}", e);
                    }
                }
            }
        }
        tracing::debug!("Reporter task exiting");
    });

    TaskHandle::new(handle, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::ChannelError;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Message>>,
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn send(&self, message: &Message) -> Result<(), ChannelError> {
            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }

    impl RecordingSink {
        async fn count(&self, pred: fn(&Message) -> bool) -> usize {
            self.sent.lock().await.iter().filter(|m| pred(m)).count()
        }
    }

    // The paused clock auto-advances whenever every task is parked on a
    // timer, so sleeping here takes no wall time.
    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_sends_hello_each_interval() {
        let sink = Arc::new(RecordingSink::default());
        let heartbeat = spawn_heartbeat(Duration::from_secs(20), sink.clone());

        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(sink.count(|m| matches!(m, Message::Hello)).await, 3);
        heartbeat.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_heartbeat_goes_quiet() {
        let sink = Arc::new(RecordingSink::default());
        let heartbeat = spawn_heartbeat(Duration::from_secs(20), sink.clone());

        tokio::time::sleep(Duration::from_secs(21)).await;
        heartbeat.stop().await;

        let before = sink.count(|m| matches!(m, Message::Hello)).await;
        assert_eq!(before, 1);

        tokio::time::sleep(Duration::from_secs(200)).await;
        assert_eq!(sink.count(|m| matches!(m, Message::Hello)).await, before);
    }
}
