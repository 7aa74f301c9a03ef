//! Change detection primitives.
//!
//! Two building blocks live here:
//!
//! - [`LeafStore`]: a keyed scratch container of [`Leaf`] values. A leaf can
//!   reset itself and hash its own content, which lets callers accumulate a
//!   serialized form of some state and derive a content hash from it without
//!   allocating a fresh buffer per key.
//! - [`DiffStore`]: a generational diff engine. Each round the caller feeds
//!   every live `(key, hash, value)` it can see, then closes the round with
//!   [`DiffStore::reset`]. The closed round reports which keys are new or
//!   changed and which keys were not seen anymore.
//!
//! ```text
//!  round N   set(k, h, v) ... set(k, h, v)  reset(mode)
//!                 │                              │
//!                 ▼                              ▼
//!         entries: key -> (hash, confirmed hash, value, seen)
//!                                                │
//!                          updated(): seen in N, hash != confirmed
//!                          deleted(): confirmed before N, not seen in N
//! ```
//!
//! Neither container is internally synchronized; each watch session owns
//! its own instances.

mod buffer_leaf;
mod diff_store;
mod leaf_store;

pub use buffer_leaf::*;
pub use diff_store::*;
pub use leaf_store::*;
