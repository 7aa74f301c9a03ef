use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use prost::Message;
use tracing::trace;

use crate::diffstore::new_buffer_store;
use crate::diffstore::BufferStore;
use crate::diffstore::Leaf;
use crate::proto::Set;

/// One entry of the store.
#[derive(Debug)]
pub struct Kv<V> {
    pub set: Set,
    pub path: String,
    pub value: Arc<V>,
    hash: u64,
}

impl<V> Kv<V> {
    /// Content hash of the value's protobuf encoding.
    pub fn content_hash(&self) -> u64 {
        self.hash
    }
}

pub(super) struct SetState<V> {
    entries: BTreeMap<String, Kv<V>>,
    leaves: BufferStore,
    synced: bool,
}

impl<V> SetState<V> {
    fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            leaves: new_buffer_store(),
            synced: false,
        }
    }
}

pub(super) struct StoreState<V> {
    pub(super) revision: u64,
    sets: BTreeMap<Set, SetState<V>>,
}

impl<V> StoreState<V> {
    pub(super) fn new() -> Self {
        Self {
            revision: 0,
            sets: Set::ALL.iter().map(|set| (*set, SetState::new())).collect(),
        }
    }

    fn set_state_mut(
        &mut self,
        set: Set,
    ) -> &mut SetState<V> {
        self.sets.entry(set).or_insert_with(SetState::new)
    }
}

/// Read-only, point-in-time view of the store.
pub struct Tx<'a, V> {
    pub(super) state: &'a StoreState<V>,
}

impl<V> Tx<'_, V> {
    /// Revision this view was taken at.
    pub fn revision(&self) -> u64 {
        self.state.revision
    }

    /// Whether every set has been fully loaded from upstream.
    pub fn all_synced(&self) -> bool {
        Set::ALL.iter().all(|set| self.is_synced(*set))
    }

    pub fn is_synced(
        &self,
        set: Set,
    ) -> bool {
        self.state.sets.get(&set).map(|s| s.synced).unwrap_or(false)
    }

    /// Visits every entry of `set` in path order until `visitor` returns `false`.
    pub fn each<F>(
        &self,
        set: Set,
        mut visitor: F,
    ) where
        F: FnMut(&Kv<V>) -> bool,
    {
        let Some(state) = self.state.sets.get(&set) else {
            return;
        };
        for kv in state.entries.values() {
            if !visitor(kv) {
                break;
            }
        }
    }

    pub fn get(
        &self,
        set: Set,
        path: &str,
    ) -> Option<&Kv<V>> {
        self.state.sets.get(&set)?.entries.get(path)
    }

    pub fn len(
        &self,
        set: Set,
    ) -> usize {
        self.state.sets.get(&set).map(|s| s.entries.len()).unwrap_or(0)
    }
}

/// Write access used inside [`ProxyStore::update`](super::ProxyStore::update).
pub struct TxMut<'a, V> {
    pub(super) state: &'a mut StoreState<V>,
    pub(super) changed: bool,
}

impl<V> TxMut<'_, V>
where V: Message
{
    /// Upserts `path` in `set`.
    ///
    /// Returns `Ok(false)` when the stored encoding is already identical.
    pub fn set(
        &mut self,
        set: Set,
        path: &str,
        value: V,
    ) -> std::result::Result<bool, prost::EncodeError> {
        let state = self.state.set_state_mut(set);

        let leaf = state.leaves.get(Bytes::copy_from_slice(path.as_bytes()));
        leaf.reset();
        if let Err(e) = value.encode(leaf.buf_mut()) {
            if !state.entries.contains_key(path) {
                state.leaves.remove(path.as_bytes());
            }
            return Err(e);
        }
        let hash = leaf.content_hash();

        if let Some(existing) = state.entries.get(path) {
            if existing.hash == hash {
                trace!(%set, path, "unchanged value");
                return Ok(false);
            }
        }

        state.entries.insert(
            path.to_string(),
            Kv {
                set,
                path: path.to_string(),
                value: Arc::new(value),
                hash,
            },
        );
        self.changed = true;
        Ok(true)
    }

    /// Removes `path` from `set`, releasing its leaf.
    pub fn delete(
        &mut self,
        set: Set,
        path: &str,
    ) -> bool {
        let state = self.state.set_state_mut(set);
        if state.entries.remove(path).is_none() {
            return false;
        }
        state.leaves.remove(path.as_bytes());
        self.changed = true;
        true
    }

    /// Marks whether `set` is fully loaded from upstream.
    pub fn set_sync(
        &mut self,
        set: Set,
        synced: bool,
    ) {
        let state = self.state.set_state_mut(set);
        if state.synced != synced {
            state.synced = synced;
            self.changed = true;
        }
    }

    /// Read access to the state being modified.
    pub fn view(&self) -> Tx<'_, V> {
        Tx { state: &*self.state }
    }
}
