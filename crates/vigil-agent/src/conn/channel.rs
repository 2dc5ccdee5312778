//! WebSocket transport to the controller.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use vigil_protocol::Message;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Transport errors on the controller channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Dial or socket I/O failure
    #[error("WebSocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// Peer closed the connection
    #[error("Connection closed by controller")]
    Closed,

    /// Outbound frame could not be serialized
    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Anything that can carry an outbound frame to the controller.
///
/// The dispatcher and the periodic tasks only see this trait, so they can be
/// exercised without a live socket.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn send(&self, message: &Message) -> Result<(), ChannelError>;
}

/// Write half of an established controller connection.
///
/// Shared between tasks as `Arc<dyn FrameSink>`; a mutex serializes
/// concurrent writers.
pub struct Channel {
    writer: Mutex<WsSink>,
}

/// Read half of an established controller connection.
pub struct ChannelReader {
    reader: WsStream,
}

/// Dials the controller and splits the socket into its two halves.
pub async fn connect(endpoint: &str) -> Result<(Channel, ChannelReader), ChannelError> {
    tracing::debug!("Dialing {}", endpoint);
    let (stream, _response) = connect_async(endpoint).await?;
    let (writer, reader) = stream.split();
    Ok((
        Channel {
            writer: Mutex::new(writer),
        },
        ChannelReader { reader },
    ))
}

#[async_trait]
impl FrameSink for Channel {
    async fn send(&self, message: &Message) -> Result<(), ChannelError> {
        let text = serde_json::to_string(message)?;
        let mut writer = self.writer.lock().await;
        writer.send(WsMessage::Text(text)).await?;
        Ok(())
    }
}

impl ChannelReader {
    /// Waits for the next text frame.
    ///
    /// Non-text traffic is skipped. Returns [`ChannelError::Closed`] once the
    /// peer is gone, whether by close frame or by dropping the socket.
    pub async fn next_frame(&mut self) -> Result<String, ChannelError> {
        use tokio_tungstenite::tungstenite::Error as WsError;

        loop {
            match self.reader.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(text),
                Some(Ok(WsMessage::Close(_))) | None => return Err(ChannelError::Closed),
                Some(Ok(_)) => continue,
                Some(Err(WsError::ConnectionClosed)) | Some(Err(WsError::AlreadyClosed)) => {
                    return Err(ChannelError::Closed)
                }
                Some(Err(e)) => return Err(ChannelError::Transport(e)),
            }
        }
    }
}
