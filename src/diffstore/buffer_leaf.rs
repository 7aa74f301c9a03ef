use bytes::Bytes;
use bytes::BytesMut;
use xxhash_rust::xxh64::xxh64;

use super::Leaf;
use super::LeafStore;

/// Leaf store of byte accumulators keyed by opaque byte strings.
pub type BufferStore = LeafStore<Bytes, BufferLeaf>;

pub fn new_buffer_store() -> BufferStore {
    LeafStore::new(BufferLeaf::new)
}

/// Byte accumulator leaf.
///
/// Hashes its content with XXH64 (seed 0). Fast and well distributed, but
/// not meant to resist crafted collisions.
#[derive(Debug, Default, Clone)]
pub struct BufferLeaf {
    buf: BytesMut,
}

impl BufferLeaf {
    pub fn new() -> Self {
        Self { buf: BytesMut::new() }
    }

    /// Write access for encoders (`prost::Message::encode` takes `&mut impl BufMut`).
    pub fn buf_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    pub fn extend_from_slice(
        &mut self,
        data: &[u8],
    ) {
        self.buf.extend_from_slice(data);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl AsRef<[u8]> for BufferLeaf {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl Leaf for BufferLeaf {
    fn reset(&mut self) {
        self.buf.clear();
    }

    fn content_hash(&self) -> u64 {
        xxh64(&self.buf, 0)
    }
}
