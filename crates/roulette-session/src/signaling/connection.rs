//! Background task owning the relay WebSocket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use super::types::{ChannelState, SignalingCommand, SignalingEvent};
use crate::protocol::SignalEnvelope;
use crate::ws;

const DEFAULT_PEER_LEFT_MESSAGE: &str = "Your peer has left the room.";

/// Connect, then pump commands out and relay events in until either side
/// closes. Runs once; the channel is never reconnected.
pub(crate) async fn connection_task(
    url: String,
    connect_timeout: Duration,
    state_tx: watch::Sender<ChannelState>,
    event_tx: mpsc::Sender<SignalingEvent>,
    mut command_rx: mpsc::UnboundedReceiver<SignalingCommand>,
) {
    info!(url = %url, "Connecting to signaling relay");

    let connect = ws::connect(&url, connect_timeout);
    tokio::pin!(connect);

    let stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok(stream) => break stream,
                Err(message) => {
                    error!(error = %message, "Signaling relay connection failed");
                    let _ = event_tx.send(SignalingEvent::ChannelError { message }).await;
                    finish(&state_tx, &event_tx).await;
                    return;
                }
            },
            cmd = command_rx.recv() => match cmd {
                Some(SignalingCommand::Send(envelope)) => {
                    debug!(event = envelope.event_name(), "Dropping envelope sent before open");
                }
                Some(SignalingCommand::Close) | None => {
                    info!("Signaling channel closed while connecting");
                    finish(&state_tx, &event_tx).await;
                    return;
                }
            },
        }
    };

    state_tx.send_replace(ChannelState::Open);
    info!("Signaling channel open");

    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            cmd = command_rx.recv() => match cmd {
                Some(SignalingCommand::Send(envelope)) => {
                    let json = match serde_json::to_string(&envelope) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(error = %e, "Failed to serialize envelope");
                            continue;
                        }
                    };
                    if let Err(e) = write.send(WsMessage::Text(json.into())).await {
                        warn!(error = %e, "Signaling send failed");
                        break;
                    }
                }
                Some(SignalingCommand::Close) | None => {
                    let _ = write.send(WsMessage::Close(None)).await;
                    info!("Signaling channel closed");
                    break;
                }
            },
            frame = read.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => handle_text(&text, &event_tx).await,
                Some(Ok(WsMessage::Close(_))) | None => {
                    info!("Signaling relay closed connection");
                    break;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Signaling WebSocket error");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    finish(&state_tx, &event_tx).await;
}

async fn finish(state_tx: &watch::Sender<ChannelState>, event_tx: &mpsc::Sender<SignalingEvent>) {
    state_tx.send_replace(ChannelState::Closed);
    let _ = event_tx.send(SignalingEvent::Closed).await;
}

/// Translate one relay frame into an event. Malformed frames are dropped.
async fn handle_text(text: &str, event_tx: &mpsc::Sender<SignalingEvent>) {
    let envelope = match serde_json::from_str::<SignalEnvelope>(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, text = %text, "Malformed envelope from signaling relay");
            return;
        }
    };

    let event = match envelope {
        SignalEnvelope::Signal {
            room_code,
            from,
            data,
            ..
        } => SignalingEvent::Signal {
            from,
            room_code,
            data,
        },
        SignalEnvelope::Verified { room_code, role } => {
            SignalingEvent::Verified { room_code, role }
        }
        SignalEnvelope::PeerDisconnected { message } => SignalingEvent::PeerDisconnected {
            message: message.unwrap_or_else(|| DEFAULT_PEER_LEFT_MESSAGE.to_string()),
        },
        SignalEnvelope::Error { message } => {
            let message = message.unwrap_or_else(|| "unspecified relay error".to_string());
            warn!(message = %message, "Signaling relay reported an error");
            SignalingEvent::ChannelError { message }
        }
        SignalEnvelope::Join { .. } => {
            debug!("Ignoring join envelope from relay");
            return;
        }
    };

    let _ = event_tx.send(event).await;
}
