//! Cloneable front door to the orchestrator actor.

use roulette_common::{SessionError, UserName};
use tokio::sync::{mpsc, oneshot, watch};

use super::types::{SessionCommand, SessionSnapshot};

#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<SessionCommand>,
        snapshot_rx: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self {
            command_tx,
            snapshot_rx,
        }
    }

    /// Register under `name` and join the matching queue.
    pub async fn register(&self, name: impl Into<UserName>) -> Result<(), SessionError> {
        let name = name.into();
        self.request(|reply| SessionCommand::Register { name, reply })
            .await
    }

    /// Leave the current round (if any) and queue for a new stranger.
    pub async fn find_next(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::FindNext { reply }).await
    }

    /// Same as [`find_next`](Self::find_next). Asking the user to confirm is
    /// the caller's job.
    pub async fn skip(&self) -> Result<(), SessionError> {
        self.find_next().await
    }

    /// Tear everything down and stop the actor.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Shutdown { reply })
            .await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Wait until the snapshot satisfies `predicate` and return it.
    pub async fn wait_until(
        &self,
        mut predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| SessionError::OrchestratorStopped)?
            .clone();
        Ok(snapshot)
    }

    async fn request(
        &self,
        command: impl FnOnce(oneshot::Sender<Result<(), SessionError>>) -> SessionCommand,
    ) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::OrchestratorStopped)?;
        reply_rx
            .await
            .map_err(|_| SessionError::OrchestratorStopped)?
    }
}
