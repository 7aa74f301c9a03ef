use parking_lot::RwLock;
use prost::Message;
use tokio::sync::watch;
use tracing::debug;

use super::tx::StoreState;
use super::Tx;
use super::TxMut;

/// In-memory proxy state shared by every watch session.
///
/// Sessions only ever read; the read lock is never held across an `.await`.
pub struct ProxyStore<V> {
    state: RwLock<StoreState<V>>,
    revision_tx: watch::Sender<u64>,
}

impl<V> Default for ProxyStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ProxyStore<V> {
    pub fn new() -> Self {
        let (revision_tx, _) = watch::channel(0);
        Self {
            state: RwLock::new(StoreState::new()),
            revision_tx,
        }
    }

    /// Current revision. Starts at 0 and advances once per effective batch.
    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    /// Runs `f` against a consistent snapshot taken at a revision of at
    /// least `min_revision`, waiting for writers if the store is behind.
    ///
    /// Returns the revision the snapshot was taken at.
    pub async fn view<F>(
        &self,
        min_revision: u64,
        f: F,
    ) -> u64
    where
        F: FnOnce(&Tx<'_, V>),
    {
        let mut revision_rx = self.revision_tx.subscribe();
        // the sender lives as long as `self`, so this only returns once reached
        let _ = revision_rx.wait_for(|rev| *rev >= min_revision).await;

        let state = self.state.read();
        f(&Tx { state: &state });
        state.revision
    }
}

impl<V> ProxyStore<V>
where V: Message
{
    /// Applies a batch of writes atomically.
    ///
    /// Waiting viewers are woken once the batch is visible.
    pub fn update<F, R>(
        &self,
        f: F,
    ) -> R
    where
        F: FnOnce(&mut TxMut<'_, V>) -> R,
    {
        let (result, revision) = {
            let mut state = self.state.write();
            let mut tx = TxMut {
                state: &mut state,
                changed: false,
            };
            let result = f(&mut tx);
            let changed = tx.changed;
            if changed {
                state.revision += 1;
                debug!(revision = state.revision, "store updated");
            }
            (result, changed.then_some(state.revision))
        };

        if let Some(revision) = revision {
            self.revision_tx.send_replace(revision);
        }
        result
    }
}
