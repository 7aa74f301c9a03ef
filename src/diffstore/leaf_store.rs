use std::borrow::Borrow;
use std::collections::BTreeMap;

/// A value held by a [`LeafStore`].
pub trait Leaf {
    /// Bring the leaf back to its pristine (empty) state so it can be reused.
    fn reset(&mut self);

    /// 64-bit hash of the leaf's current content.
    ///
    /// Must be deterministic and depend only on observable content.
    fn content_hash(&self) -> u64;
}

/// Keyed container of reusable leaves.
///
/// Leaves are created through the factory on first access to a key. Removed
/// leaves are reset and parked, and the next new key takes a parked leaf
/// before the factory is called again.
///
/// The store never evicts on its own: a key stays mapped to the same live
/// leaf until [`LeafStore::remove`] or [`LeafStore::clear`] is called.
pub struct LeafStore<K, L> {
    leaves: BTreeMap<K, L>,
    free: Vec<L>,
    factory: fn() -> L,
}

impl<K, L> LeafStore<K, L>
where
    K: Ord,
    L: Leaf,
{
    pub fn new(factory: fn() -> L) -> Self {
        Self {
            leaves: BTreeMap::new(),
            free: Vec::new(),
            factory,
        }
    }

    /// Returns the leaf for `key`, creating it when missing.
    pub fn get(
        &mut self,
        key: K,
    ) -> &mut L {
        let free = &mut self.free;
        let factory = self.factory;
        self.leaves
            .entry(key)
            .or_insert_with(|| free.pop().unwrap_or_else(factory))
    }

    /// Returns the leaf for `key` if it already exists.
    pub fn get_mut<Q>(
        &mut self,
        key: &Q,
    ) -> Option<&mut L>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.leaves.get_mut(key)
    }

    pub fn contains<Q>(
        &self,
        key: &Q,
    ) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.leaves.contains_key(key)
    }

    /// Drops `key` from the store. The leaf is reset and kept for reuse.
    ///
    /// Returns `false` if the key was not present.
    pub fn remove<Q>(
        &mut self,
        key: &Q,
    ) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.leaves.remove(key) {
            Some(mut leaf) => {
                leaf.reset();
                self.free.push(leaf);
                true
            }
            None => false,
        }
    }

    /// Removes every key, parking all leaves for reuse.
    pub fn clear(&mut self) {
        let leaves = std::mem::take(&mut self.leaves);
        self.free.extend(leaves.into_values().map(|mut leaf| {
            leaf.reset();
            leaf
        }));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &L)> {
        self.leaves.iter()
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Number of reset leaves waiting to be reused.
    pub fn parked(&self) -> usize {
        self.free.len()
    }
}

impl<K, L> std::fmt::Debug for LeafStore<K, L>
where
    K: std::fmt::Debug,
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LeafStore")
            .field("keys", &self.leaves.keys().collect::<Vec<_>>())
            .field("parked", &self.free.len())
            .finish()
    }
}
