//! Concurrent hash containers built on hand-over-hand (lock-coupling)
//! traversal of per-bucket chains.
//!
//! Every bucket owns a singly linked chain of nodes. The bucket head and every
//! node carry their own [`RwLock`](std::sync::RwLock); a thread walking a
//! chain always locks the next position before unlocking the current one, so
//! operations on different keys only contend where their walks overlap and
//! operations on the same key are serialized by the chain itself. There is no
//! table-wide lock.
//!
//! [`FineGrainedHashMap`] stores key/value pairs and [`FineGrainedHashSet`]
//! stores bare keys; both are instances of the same engine.
//!
//! Resizing and bulk loading take `&mut self`: the table must be exclusively
//! owned for them, which the borrow checker enforces.

#[macro_use]
extern crate log;

mod error;
mod map;
mod raw;
mod set;

pub use error::Error;
pub use map::{FineGrainedHashMap, Map};
pub use set::{FineGrainedHashSet, Set};

/// Bucket count used when none is given. A prime, so that `hash % n` spreads
/// keys well even for weak hashers.
pub const DEFAULT_NUM_BUCKETS: usize = 55_001;
