//! Single-owner progress task.
//!
//! One blocking-pool task owns the [`ProgressEngine`]; every mutation is a command on
//! an unbounded queue, so `record_visit`, `record_collectible` and `reset`
//! never interleave their read-modify-write. Replies travel over oneshot
//! channels and the latest committed state is published on a watch channel
//! for observers.

use tokio::sync::{mpsc, oneshot, watch};

use crate::progress::engine::{Outcome, ProgressEngine};
use crate::progress::errors::ProgressError;
use crate::progress::storage::BlobStore;
use crate::progress::types::{ProgressState, ProgressSummary};

pub enum ProgressCommand {
    RecordVisit {
        attraction_id: String,
        points: u32,
        reply: oneshot::Sender<Outcome>,
    },
    RecordCollectible {
        item_id: String,
        points: u32,
        reply: oneshot::Sender<Outcome>,
    },
    Reset(oneshot::Sender<Outcome>),
    Save(oneshot::Sender<Result<(), ProgressError>>),
    Snapshot(oneshot::Sender<ProgressState>),
    Summary(oneshot::Sender<ProgressSummary>),
    Shutdown(oneshot::Sender<()>),
}

#[derive(Clone, Debug)]
pub struct ProgressHandle {
    tx: mpsc::UnboundedSender<ProgressCommand>,
    state_rx: watch::Receiver<ProgressState>,
}

impl ProgressHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ProgressCommand,
    ) -> Result<T, ProgressError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(build(tx))
            .map_err(|_| ProgressError::ActorClosed)?;
        rx.await.map_err(|_| ProgressError::ActorClosed)
    }

    pub async fn record_visit(
        &self,
        attraction_id: &str,
        points: u32,
    ) -> Result<Outcome, ProgressError> {
        let attraction_id = attraction_id.to_string();
        self.request(|reply| ProgressCommand::RecordVisit {
            attraction_id,
            points,
            reply,
        })
        .await
    }

    pub async fn record_collectible(
        &self,
        item_id: &str,
        points: u32,
    ) -> Result<Outcome, ProgressError> {
        let item_id = item_id.to_string();
        self.request(|reply| ProgressCommand::RecordCollectible {
            item_id,
            points,
            reply,
        })
        .await
    }

    pub async fn reset_progress(&self) -> Result<Outcome, ProgressError> {
        self.request(ProgressCommand::Reset).await
    }

    /// Retry persisting the current state after an earlier persist failure.
    pub async fn save(&self) -> Result<(), ProgressError> {
        self.request(ProgressCommand::Save).await?
    }

    pub async fn snapshot(&self) -> Result<ProgressState, ProgressError> {
        self.request(ProgressCommand::Snapshot).await
    }

    pub async fn summary(&self) -> Result<ProgressSummary, ProgressError> {
        self.request(ProgressCommand::Summary).await
    }

    /// Observe committed state; the receiver sees the value after each
    /// completed mutation.
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.state_rx.clone()
    }

    /// Stop the owner task. Returns once the engine and its store are
    /// dropped.
    pub async fn shutdown(&self) {
        let _ = self.request(ProgressCommand::Shutdown).await;
    }
}

/// Spawn the owner task. Must be called from inside a tokio runtime.
///
/// The loop runs on the blocking pool: each mutation ends in a synchronous
/// store write (a sled flush), which must not hold up the async workers.
pub fn start_progress_actor<B>(mut engine: ProgressEngine<B>) -> ProgressHandle
where
    B: BlobStore + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressCommand>();
    let (state_tx, state_rx) = watch::channel(engine.state().clone());
    let handle = ProgressHandle { tx, state_rx };

    tokio::task::spawn_blocking(move || {
        let mut shutdown_reply = None;
        while let Some(cmd) = rx.blocking_recv() {
            match cmd {
                ProgressCommand::RecordVisit {
                    attraction_id,
                    points,
                    reply,
                } => {
                    let outcome = engine.record_visit(&attraction_id, points);
                    publish(&state_tx, &outcome);
                    let _ = reply.send(outcome);
                }
                ProgressCommand::RecordCollectible {
                    item_id,
                    points,
                    reply,
                } => {
                    let outcome = engine.record_collectible(&item_id, points);
                    publish(&state_tx, &outcome);
                    let _ = reply.send(outcome);
                }
                ProgressCommand::Reset(reply) => {
                    let outcome = engine.reset_progress();
                    publish(&state_tx, &outcome);
                    let _ = reply.send(outcome);
                }
                ProgressCommand::Save(reply) => {
                    let _ = reply.send(engine.save());
                }
                ProgressCommand::Snapshot(reply) => {
                    let _ = reply.send(engine.state().clone());
                }
                ProgressCommand::Summary(reply) => {
                    let _ = reply.send(engine.summary());
                }
                ProgressCommand::Shutdown(done) => {
                    shutdown_reply = Some(done);
                    break;
                }
            }
        }
        // Release the store before acknowledging so the caller may reopen it.
        drop(engine);
        log::debug!("progress actor terminated");
        if let Some(done) = shutdown_reply {
            let _ = done.send(());
        }
    });

    handle
}

fn publish(state_tx: &watch::Sender<ProgressState>, outcome: &Outcome) {
    if outcome.changed {
        state_tx.send_replace(outcome.state.clone());
    }
}
