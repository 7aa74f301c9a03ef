use std::pin::pin;
use std::sync::Arc;

use futures::Stream;
use futures::StreamExt;
use prost::Message;
use tokio::sync::watch;
use tonic::Status;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::OpSink;
use super::WatchState;
use crate::diffstore::ResetMode;
use crate::metrics::WATCH_ROUNDS;
use crate::metrics::WATCH_SESSIONS_ACTIVE;
use crate::proto::Set;
use crate::proto::WatchReq;
use crate::proxystore::ProxyStore;
use crate::WatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Idle until the subscriber asks for the next round.
    WaitingTrigger,
    /// Reading a store snapshot into the diff engines.
    Snapshotting,
    /// Sending the round's operations.
    Emitting,
    /// Round delivered; engines already hold the next open generation.
    Resetting,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The snapshot was complete and its diff was sent, followed by a sync.
    Synced { revision: u64, sent: usize },
    /// Some set was not fully loaded yet; nothing was sent or recorded.
    Skipped { revision: u64 },
}

/// One subscriber's watch loop over a shared [`ProxyStore`].
pub struct WatchSession<S, V> {
    id: u64,
    store: Arc<ProxyStore<V>>,
    state: WatchState<S, V>,
    revision: u64,
    phase: SessionState,
}

impl<S, V> WatchSession<S, V>
where
    S: OpSink,
    V: Message + 'static,
{
    /// Watches every set.
    pub fn new(
        id: u64,
        store: Arc<ProxyStore<V>>,
        sink: S,
    ) -> Self {
        Self::with_sets(id, store, sink, &Set::ALL)
    }

    pub fn with_sets(
        id: u64,
        store: Arc<ProxyStore<V>>,
        sink: S,
        sets: &[Set],
    ) -> Self {
        Self {
            id,
            store,
            state: WatchState::new(sink, sets),
            revision: 0,
            phase: SessionState::WaitingTrigger,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn phase(&self) -> SessionState {
        self.phase
    }

    /// Store revision of the last round, synced or skipped.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn state(&self) -> &WatchState<S, V> {
        &self.state
    }

    /// Runs one round: waits for a store revision newer than the last one
    /// seen, diffs it and sends the changes followed by a sync marker.
    ///
    /// Updates go out in set order, deletes in reverse set order so that
    /// dependents disappear before what they depend on.
    pub async fn run_round(&mut self) -> std::result::Result<RoundOutcome, WatchError> {
        self.phase = SessionState::Snapshotting;

        let state = &mut self.state;
        let mut synced = false;
        let revision = self
            .store
            .view(self.revision + 1, |tx| {
                synced = tx.all_synced();
                if synced {
                    state.observe(tx);
                }
            })
            .await;
        self.revision = revision;

        if !synced {
            debug!(session = self.id, revision, "store not synced, skipping round");
            WATCH_ROUNDS.with_label_values(&["skipped"]).inc();
            self.phase = SessionState::WaitingTrigger;
            return Ok(RoundOutcome::Skipped { revision });
        }

        self.state.reset(ResetMode::TrackDeletes);
        self.phase = SessionState::Emitting;

        let sets = self.state.sets().to_vec();
        let mut sent = 0;
        for set in sets.iter() {
            sent += self.state.send_updates(*set).await;
        }
        for set in sets.iter().rev() {
            sent += self.state.send_deletes(*set).await;
        }
        self.state.send_sync().await;

        if let Some(e) = self.state.err() {
            WATCH_ROUNDS.with_label_values(&["failed"]).inc();
            self.phase = SessionState::Closed;
            return Err(e.clone());
        }

        self.phase = SessionState::Resetting;
        self.state.finish_round();
        debug!(session = self.id, revision, sent, "round delivered");
        WATCH_ROUNDS.with_label_values(&["synced"]).inc();
        self.phase = SessionState::WaitingTrigger;

        Ok(RoundOutcome::Synced { revision, sent })
    }

    /// Serves rounds for every request on `requests` until the subscriber
    /// closes its stream, a send fails, or `shutdown` fires.
    ///
    /// A clean end of the request stream is not an error; a request stream
    /// error is returned as is.
    pub async fn run<R>(
        mut self,
        requests: R,
        mut shutdown: watch::Receiver<()>,
    ) -> std::result::Result<(), Status>
    where
        R: Stream<Item = std::result::Result<WatchReq, Status>> + Send,
    {
        let id = self.id;
        let _active = ActiveSession::enter();
        info!(session = id, "watch session started");

        let mut requests = pin!(requests);
        let result = loop {
            let request = tokio::select! {
                _ = shutdown.changed() => {
                    debug!(session = id, "shutdown signal received");
                    break Ok(());
                }
                request = requests.next() => request,
            };

            match request {
                None => {
                    debug!(session = id, "subscriber closed request stream");
                    break Ok(());
                }
                Some(Err(status)) => {
                    warn!(session = id, "request stream error: {}", status);
                    break Err(status);
                }
                Some(Ok(_)) => {}
            }

            let outcome = tokio::select! {
                _ = shutdown.changed() => {
                    debug!(session = id, "shutdown signal received");
                    break Ok(());
                }
                outcome = self.run_round() => outcome,
            };

            if let Err(e) = outcome {
                warn!(session = id, "watch session failed: {}", e);
                break Err(Status::from(e));
            }
        };

        self.phase = SessionState::Closed;
        info!(session = id, "watch session closed");
        result
    }
}

struct ActiveSession;

impl ActiveSession {
    fn enter() -> Self {
        WATCH_SESSIONS_ACTIVE.inc();
        ActiveSession
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        WATCH_SESSIONS_ACTIVE.dec();
    }
}
