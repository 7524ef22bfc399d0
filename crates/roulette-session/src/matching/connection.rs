//! Background task listening for match notifications.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use roulette_common::Role;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use super::types::MatchingEvent;
use crate::protocol::MatchingMessage;
use crate::signaling::ChannelState;
use crate::ws;

/// Listen on the notification socket until it drops or `shutdown` fires.
///
/// An unrequested end of the connection is reported as
/// [`MatchingEvent::Unavailable`]; a requested one is silent.
pub(crate) async fn connection_task(
    url: String,
    connect_timeout: Duration,
    state_tx: watch::Sender<ChannelState>,
    event_tx: mpsc::Sender<MatchingEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    info!(url = %url, "Connecting to matching service");

    let stream = tokio::select! {
        result = ws::connect(&url, connect_timeout) => match result {
            Ok(stream) => stream,
            Err(reason) => {
                error!(error = %reason, "Matching service connection failed");
                state_tx.send_replace(ChannelState::Closed);
                let _ = event_tx.send(MatchingEvent::Unavailable { reason }).await;
                return;
            }
        },
        _ = &mut shutdown => {
            state_tx.send_replace(ChannelState::Closed);
            return;
        }
    };

    state_tx.send_replace(ChannelState::Open);
    info!("Matching channel open");

    let (mut write, mut read) = stream.split();

    let reason = loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = write.send(WsMessage::Close(None)).await;
                info!("Matching channel closed");
                state_tx.send_replace(ChannelState::Closed);
                return;
            }
            frame = read.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => handle_text(&text, &event_tx).await,
                Some(Ok(WsMessage::Close(_))) | None => {
                    break "matching service closed the connection".to_string();
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Matching WebSocket error");
                    break format!("connection lost: {e}");
                }
                Some(Ok(_)) => {}
            },
        }
    };

    warn!(reason = %reason, "Matching channel dropped");
    state_tx.send_replace(ChannelState::Closed);
    let _ = event_tx.send(MatchingEvent::Unavailable { reason }).await;
}

async fn handle_text(text: &str, event_tx: &mpsc::Sender<MatchingEvent>) {
    match serde_json::from_str::<MatchingMessage>(text) {
        Ok(MatchingMessage::Matched {
            room_code,
            initiator,
        }) => {
            let role = Role::from_initiator_flag(initiator);
            info!(room = %room_code, role = %role, "Matched");
            let _ = event_tx
                .send(MatchingEvent::Matched { room_code, role })
                .await;
        }
        Ok(MatchingMessage::Unrecognized) => {
            debug!(text = %text, "Ignoring matching service message");
        }
        Err(e) => {
            warn!(error = %e, text = %text, "Malformed message from matching service");
        }
    }
}
