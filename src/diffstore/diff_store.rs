use std::collections::BTreeMap;

use bytes::Bytes;
use tracing::trace;

/// How [`DiffStore::reset`] treats keys that were not observed during the
/// round being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Unobserved keys are reported as deleted and dropped.
    TrackDeletes,
    /// Unobserved keys are kept with their last confirmed hash, as if they
    /// had been observed unchanged. For callers that feed a partial snapshot,
    /// e.g. a single set refreshed on its own; watch sessions always feed
    /// complete rounds and close with `TrackDeletes`.
    KeepUnobserved,
}

#[derive(Debug)]
struct Entry<V> {
    /// Hash of the latest observation.
    hash: u64,
    /// Hash as of the last closed generation; `None` until the key's first close.
    confirmed: Option<u64>,
    value: V,
    /// Generation of the latest observation.
    seen: u64,
}

/// Generational diff engine for one partition.
///
/// Keeps one entry per live key with the hash confirmed at the end of the
/// previous generation, so the next generation's observations are compared
/// in `O(log n)` each.
///
/// Results of a closed generation ([`DiffStore::updated`] and
/// [`DiffStore::deleted`]) stay readable until the next call to
/// [`DiffStore::reset`]. Observations made in between affect the values
/// returned by `updated()` but not which keys it lists.
#[derive(Debug)]
pub struct DiffStore<V> {
    entries: BTreeMap<Bytes, Entry<V>>,
    /// Keys classified as updated by the last close.
    updated: Vec<Bytes>,
    /// Entries dropped by the last close.
    deleted: Vec<(Bytes, V)>,
    /// Reused between closes to collect keys to drop.
    unobserved: Vec<Bytes>,
    /// The currently open generation.
    generation: u64,
}

impl<V> Default for DiffStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> DiffStore<V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
            unobserved: Vec::new(),
            generation: 1,
        }
    }

    /// Records an observation of `key` in the open generation.
    ///
    /// A second call for the same key in one generation replaces the first;
    /// classification always compares against the previous generation.
    pub fn set(
        &mut self,
        key: &[u8],
        hash: u64,
        value: V,
    ) {
        let generation = self.generation;

        if let Some(entry) = self.entries.get_mut(key) {
            entry.hash = hash;
            entry.value = value;
            entry.seen = generation;
            return;
        }

        self.entries.insert(
            Bytes::copy_from_slice(key),
            Entry {
                hash,
                confirmed: None,
                value,
                seen: generation,
            },
        );
    }

    /// Closes the open generation and opens the next one.
    ///
    /// Keys observed with a hash different from their confirmed one (or no
    /// confirmed hash at all) become `updated`. Keys not observed become
    /// `deleted` under [`ResetMode::TrackDeletes`] and are released.
    pub fn reset(
        &mut self,
        mode: ResetMode,
    ) {
        let closing = self.generation;

        self.updated.clear();
        self.deleted.clear();

        for (key, entry) in self.entries.iter_mut() {
            if entry.seen == closing {
                if entry.confirmed != Some(entry.hash) {
                    entry.confirmed = Some(entry.hash);
                    self.updated.push(key.clone());
                }
            } else if mode == ResetMode::TrackDeletes {
                self.unobserved.push(key.clone());
            }
        }

        for key in self.unobserved.drain(..) {
            if let Some(entry) = self.entries.remove(&key) {
                self.deleted.push((key, entry.value));
            }
        }

        trace!(
            generation = closing,
            updated = self.updated.len(),
            deleted = self.deleted.len(),
            live = self.entries.len(),
            ?mode,
            "closed generation"
        );

        self.generation += 1;
    }

    /// New or changed entries of the last closed generation, in key order.
    pub fn updated(&self) -> impl Iterator<Item = (&[u8], &V)> + '_ {
        self.updated.iter().filter_map(move |key| {
            self.entries
                .get(key)
                .map(|entry| (key.as_ref(), &entry.value))
        })
    }

    /// Entries dropped by the last closed generation, with their last value.
    pub fn deleted(&self) -> impl Iterator<Item = (&[u8], &V)> + '_ {
        self.deleted
            .iter()
            .map(|(key, value)| (key.as_ref(), value))
    }

    pub fn updated_len(&self) -> usize {
        self.updated.len()
    }

    pub fn deleted_len(&self) -> usize {
        self.deleted.len()
    }

    /// Whether the last closed generation changed anything.
    pub fn has_changes(&self) -> bool {
        !self.updated.is_empty() || !self.deleted.is_empty()
    }

    /// The open generation. Starts at 1 and advances on every reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Live keys: everything confirmed or observed and not yet deleted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
