//! Public handle for the matching service.

use std::future::Future;
use std::sync::Arc;

use roulette_common::{SessionError, UserName};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use super::connection::connection_task;
use super::registrar::Registrar;
use super::types::{MatchingConfig, MatchingEvent};
use crate::protocol::RegisterResponse;
use crate::signaling::ChannelState;
use crate::ws;

struct Connection {
    user: UserName,
    state_rx: watch::Receiver<ChannelState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

/// Registration plus the match notification socket.
///
/// Events from every connection this channel opens go to the single
/// receiver returned by [`MatchingChannel::new`]. A dropped connection is
/// reported once and never reopened by the channel itself.
pub struct MatchingChannel {
    config: MatchingConfig,
    registrar: Arc<dyn Registrar>,
    event_tx: mpsc::Sender<MatchingEvent>,
    connection: Option<Connection>,
}

impl MatchingChannel {
    pub fn new(
        config: MatchingConfig,
        registrar: Arc<dyn Registrar>,
    ) -> (Self, mpsc::Receiver<MatchingEvent>) {
        let (event_tx, event_rx) = mpsc::channel(64);
        let channel = Self {
            config,
            registrar,
            event_tx,
            connection: None,
        };
        (channel, event_rx)
    }

    /// Open the notification socket for `user`. No-op while a connection
    /// for the same user is connecting or open.
    pub fn connect(&mut self, user: &UserName) {
        if let Some(conn) = &self.connection {
            if conn.user == *user && *conn.state_rx.borrow() != ChannelState::Closed {
                debug!(user = %user, "Matching channel already connected");
                return;
            }
        }
        self.close();

        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let url = ws::user_socket_url(&self.config.ws_url, user.as_str());

        tokio::spawn(connection_task(
            url,
            self.config.connect_timeout,
            state_tx,
            self.event_tx.clone(),
            shutdown_rx,
        ));

        self.connection = Some(Connection {
            user: user.clone(),
            state_rx,
            shutdown_tx: Some(shutdown_tx),
        });
    }

    /// Connecting or open.
    pub fn is_alive(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|conn| *conn.state_rx.borrow() != ChannelState::Closed)
    }

    pub fn state(&self) -> ChannelState {
        self.connection
            .as_ref()
            .map_or(ChannelState::Closed, |conn| *conn.state_rx.borrow())
    }

    /// A detached registration request for `user`.
    pub fn registration(
        &self,
        user: &UserName,
    ) -> impl Future<Output = Result<RegisterResponse, SessionError>> + Send + 'static {
        let registrar = Arc::clone(&self.registrar);
        let user = user.clone();
        async move { registrar.register(&user).await }
    }

    /// Close the notification socket. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            if let Some(tx) = conn.shutdown_tx.take() {
                info!(user = %conn.user, "Closing matching channel");
                let _ = tx.send(());
            }
        }
    }
}

impl Drop for MatchingChannel {
    fn drop(&mut self) {
        self.close();
    }
}
