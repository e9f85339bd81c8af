//! WebSocket connection and reconnect loop.
//!
//! Connects to the hub, forwards [`ClientCommand`]s as frames, and reports
//! received broadcasts and connection changes as [`ClientEvent`]s. Dropped
//! connections are retried according to a [`ReconnectPolicy`].

use futures::{SinkExt, StreamExt};
use relay_core::frames::{Envelope, InboundFrame};
use relay_core::message::Message as ChatMessage;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::backoff::ReconnectPolicy;
use crate::error::ClientError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Instructions from the user interface to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// Send a frame to the hub.
    Send(InboundFrame),
    /// Close the connection and stop.
    Quit,
}

/// Notifications from the session to the user interface.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Connected,
    Disconnected,
    Message(ChatMessage),
}

/// How a single connection ended.
enum SessionEnd {
    /// The user asked to stop, or the event consumer went away.
    Quit,
    /// The connection dropped and may be retried.
    Dropped,
}

/// Run the client until the user quits or reconnecting is exhausted.
///
/// Frames sent while disconnected are dropped with a warning. A closed
/// `commands` channel counts as [`ClientCommand::Quit`].
pub async fn run(
    url: &str,
    policy: ReconnectPolicy,
    mut commands: mpsc::Receiver<ClientCommand>,
    events: mpsc::Sender<ClientEvent>,
) -> Result<(), ClientError> {
    let mut attempt = 0;

    loop {
        tracing::info!(url = %url, attempt, "Connecting to chat hub");

        match connect_async(url).await {
            Ok((ws_stream, _response)) => {
                tracing::info!("WebSocket connected");
                attempt = 0;
                if events.send(ClientEvent::Connected).await.is_err() {
                    return Ok(());
                }

                match run_session(ws_stream, &mut commands, &events).await {
                    SessionEnd::Quit => return Ok(()),
                    SessionEnd::Dropped => {
                        tracing::warn!("WebSocket session ended");
                        if events.send(ClientEvent::Disconnected).await.is_err() {
                            return Ok(());
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "WebSocket connection failed");
            }
        }

        let Some(delay) = policy.delay_for(attempt) else {
            tracing::error!(attempts = attempt, "Reconnect attempts exhausted");
            return Err(ClientError::ReconnectExhausted { attempts: attempt });
        };
        attempt += 1;

        tracing::info!(delay_ms = delay.as_millis() as u64, attempt, "Reconnecting");
        if wait_or_quit(delay, &mut commands).await {
            return Ok(());
        }
    }
}

/// Sleep for `delay` while draining commands. Returns `true` on quit.
async fn wait_or_quit(
    delay: std::time::Duration,
    commands: &mut mpsc::Receiver<ClientCommand>,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            () = &mut sleep => return false,
            command = commands.recv() => match command {
                Some(ClientCommand::Send(_)) => {
                    tracing::warn!("Not connected, dropping outgoing frame");
                }
                Some(ClientCommand::Quit) | None => return true,
            },
        }
    }
}

/// Drive one connection: forward commands and surface broadcasts.
async fn run_session(
    ws_stream: WsStream,
    commands: &mut mpsc::Receiver<ClientCommand>,
    events: &mpsc::Sender<ClientEvent>,
) -> SessionEnd {
    let (mut sink, mut stream) = ws_stream.split();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(ClientCommand::Send(frame)) => {
                    let json = match serde_json::to_string(&frame) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to encode frame");
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(json)).await {
                        tracing::error!(error = %e, "Failed to send frame");
                        return SessionEnd::Dropped;
                    }
                }
                Some(ClientCommand::Quit) | None => {
                    if let Err(e) = sink.close().await {
                        tracing::debug!(error = %e, "Error while closing WebSocket");
                    }
                    return SessionEnd::Quit;
                }
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let Some(message) = decode_envelope(&text) else {
                        continue;
                    };
                    if events.send(ClientEvent::Message(message)).await.is_err() {
                        return SessionEnd::Quit;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "Hub closed WebSocket");
                    return SessionEnd::Dropped;
                }
                Some(Ok(_)) => {
                    // Ping/Pong are answered by tungstenite; binary is unused.
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "WebSocket receive error");
                    return SessionEnd::Dropped;
                }
                None => {
                    tracing::info!("WebSocket stream exhausted");
                    return SessionEnd::Dropped;
                }
            },
        }
    }
}

/// Parse a broadcast envelope. Malformed envelopes are ignored.
fn decode_envelope(text: &str) -> Option<ChatMessage> {
    match serde_json::from_str::<Envelope>(text) {
        Ok(envelope) => Some(envelope.into()),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed envelope");
            None
        }
    }
}
