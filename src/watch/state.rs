use std::sync::Arc;

use bytes::BytesMut;
use prost::Message;
use tracing::debug;
use tracing::warn;

use super::OpSink;
use crate::diffstore::DiffStore;
use crate::diffstore::ResetMode;
use crate::metrics::WATCH_OPS_SENT;
use crate::proto::OpItem;
use crate::proto::Set;
use crate::proxystore::Tx;
use crate::WatchError;

/// Per-subscriber diff state: one [`DiffStore`] per watched set, the sink
/// operations go to, and the first error that happened on that sink.
///
/// After the first failure every send becomes a no-op returning 0, so a
/// round can run to completion and report the error once at the end.
pub struct WatchState<S, V> {
    sink: S,
    sets: Vec<Set>,
    diffs: Vec<DiffStore<Arc<V>>>,
    buf: BytesMut,
    err: Option<WatchError>,
}

impl<S, V> WatchState<S, V>
where
    S: OpSink,
    V: Message + 'static,
{
    pub fn new(
        sink: S,
        sets: &[Set],
    ) -> Self {
        Self {
            sink,
            sets: sets.to_vec(),
            diffs: sets.iter().map(|_| DiffStore::new()).collect(),
            buf: BytesMut::new(),
            err: None,
        }
    }

    /// Watched sets, in emission order.
    pub fn sets(&self) -> &[Set] {
        &self.sets
    }

    /// Diff engine of `set`.
    ///
    /// # Panics
    /// If `set` is not watched by this state. That is a wiring bug.
    pub fn store_for(
        &mut self,
        set: Set,
    ) -> &mut DiffStore<Arc<V>> {
        let idx = self.index_of(set);
        &mut self.diffs[idx]
    }

    /// Feeds every entry of the watched sets into their engines.
    pub fn observe(
        &mut self,
        tx: &Tx<'_, V>,
    ) {
        for (set, diff) in self.sets.iter().zip(self.diffs.iter_mut()) {
            tx.each(*set, |kv| {
                diff.set(kv.path.as_bytes(), kv.content_hash(), kv.value.clone());
                true
            });
        }
    }

    /// Closes the open generation of every engine.
    pub fn reset(
        &mut self,
        mode: ResetMode,
    ) {
        for diff in self.diffs.iter_mut() {
            diff.reset(mode);
        }
    }

    /// Sends a set operation for every entry `set` updated in the last
    /// closed generation. Returns how many were delivered.
    pub async fn send_updates(
        &mut self,
        set: Set,
    ) -> usize {
        let idx = self.index_of(set);
        let Self {
            sink, diffs, buf, err, ..
        } = self;
        if err.is_some() {
            return 0;
        }

        let mut sent = 0;
        for (key, value) in diffs[idx].updated() {
            buf.reserve(value.encoded_len());
            if let Err(e) = value.as_ref().encode(buf) {
                warn!(%set, "failed to encode value: {}", e);
                *err = Some(e.into());
                break;
            }
            let path = String::from_utf8_lossy(key).into_owned();
            let op = OpItem::set_op(set, path, buf.split().freeze());
            if !deliver(sink, err, set, op).await {
                break;
            }
            sent += 1;
        }
        sent
    }

    /// Sends a delete operation for every entry `set` dropped in the last
    /// closed generation. Returns how many were delivered.
    pub async fn send_deletes(
        &mut self,
        set: Set,
    ) -> usize {
        let idx = self.index_of(set);
        let Self {
            sink, diffs, err, ..
        } = self;
        if err.is_some() {
            return 0;
        }

        let mut sent = 0;
        for (key, _) in diffs[idx].deleted() {
            let path = String::from_utf8_lossy(key).into_owned();
            if !deliver(sink, err, set, OpItem::delete_op(set, path)).await {
                break;
            }
            sent += 1;
        }
        sent
    }

    /// Sends the end-of-round marker. Returns `false` if it was not delivered.
    pub async fn send_sync(&mut self) -> bool {
        let Self { sink, err, .. } = self;
        if err.is_some() {
            return false;
        }
        let delivered = deliver_op(sink, err, OpItem::sync()).await;
        if delivered {
            WATCH_OPS_SENT.with_label_values(&["sync", "all"]).inc();
        }
        delivered
    }

    /// Drops whatever a failed encode left in the scratch buffer.
    pub fn finish_round(&mut self) {
        self.buf.clear();
    }

    /// Open generation of the engine watching `set`.
    ///
    /// # Panics
    /// If `set` is not watched by this state.
    pub fn generation(
        &self,
        set: Set,
    ) -> u64 {
        self.diffs[self.index_of(set)].generation()
    }

    /// The first error recorded on this state, if any.
    pub fn err(&self) -> Option<&WatchError> {
        self.err.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.err.is_some()
    }

    pub fn into_err(self) -> Option<WatchError> {
        self.err
    }

    fn index_of(
        &self,
        set: Set,
    ) -> usize {
        match self.sets.iter().position(|s| *s == set) {
            Some(idx) => idx,
            None => panic!("not watching set {set}"),
        }
    }
}

async fn deliver<S: OpSink>(
    sink: &S,
    err: &mut Option<WatchError>,
    set: Set,
    op: OpItem,
) -> bool {
    let kind = op.kind();
    if !deliver_op(sink, err, op).await {
        return false;
    }
    WATCH_OPS_SENT.with_label_values(&[kind, set.label()]).inc();
    true
}

async fn deliver_op<S: OpSink>(
    sink: &S,
    err: &mut Option<WatchError>,
    op: OpItem,
) -> bool {
    match sink.send(op).await {
        Ok(()) => true,
        Err(e) => {
            debug!("watch sink failed: {}", e);
            *err = Some(e);
            false
        }
    }
}
