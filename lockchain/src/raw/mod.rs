//! The table engine shared by the map and the set.

mod node;

use std::borrow::Borrow;
use std::collections::TryReserveError;
use std::hash::{BuildHasher, Hash, Hasher};
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam::utils::CachePadded;

use crate::Error;
use node::{Bucket, Node};

/// What a chain node stores. The engine only ever looks at the key.
pub(crate) trait Entry {
    type Key: Hash + Eq;

    fn key(&self) -> &Self::Key;
}

/// Map entry.
pub(crate) struct KeyValue<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K: Hash + Eq, V> Entry for KeyValue<K, V> {
    type Key = K;

    fn key(&self) -> &K {
        &self.key
    }
}

/// Set entry: the element is its own key.
pub(crate) struct KeyOnly<T>(pub(crate) T);

impl<T: Hash + Eq> Entry for KeyOnly<T> {
    type Key = T;

    fn key(&self) -> &T {
        &self.0
    }
}

fn allocate_buckets<E>(num_buckets: usize) -> Result<Vec<Bucket<E>>, TryReserveError> {
    let mut buckets = Vec::new();
    buckets.try_reserve_exact(num_buckets)?;
    buckets.extend((0..num_buckets).map(|_| Bucket::new()));
    Ok(buckets)
}

/// A fixed array of independently locked buckets plus a live-entry counter.
pub(crate) struct RawTable<E, S> {
    buckets: Vec<Bucket<E>>,
    count: CachePadded<AtomicUsize>,
    hash_builder: S,
}

impl<E, S> RawTable<E, S> {
    pub(crate) fn try_new(num_buckets: usize, hash_builder: S) -> Result<Self, Error> {
        if num_buckets == 0 {
            return Err(Error::ZeroBuckets);
        }
        let buckets = allocate_buckets(num_buckets)?;
        trace!("allocated table with {} buckets", num_buckets);
        Ok(RawTable {
            buckets,
            count: CachePadded::new(AtomicUsize::new(0)),
            hash_builder,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub(crate) fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hash_builder
    }
}

impl<E, S> RawTable<E, S>
where
    E: Entry,
    S: BuildHasher,
{
    fn bucket_index<Q: ?Sized + Hash>(&self, key: &Q) -> usize {
        let mut hasher = self.hash_builder.build_hasher();
        key.hash(&mut hasher);
        (hasher.finish() % self.buckets.len() as u64) as usize
    }

    pub(crate) fn find<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        E::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&E) -> R,
    {
        self.buckets[self.bucket_index(key)].find(key, f)
    }

    /// Inserts `entry` unless its key is present. For a present key,
    /// `on_occupied` gets the stored entry under its node's write lock along
    /// with the rejected entry, and its result is returned.
    pub(crate) fn insert<R, F>(&self, entry: E, on_occupied: F) -> Option<R>
    where
        F: FnOnce(&mut E, E) -> R,
    {
        let index = self.bucket_index(entry.key());
        // Allocate before any lock is taken.
        let node = Node::new(entry);
        self.buckets[index].insert(node, &self.count, on_occupied)
    }

    pub(crate) fn remove<Q>(&self, key: &Q) -> Option<E>
    where
        E::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buckets[self.bucket_index(key)].remove(key, &self.count)
    }

    /// Unlocked insert for an exclusively borrowed table.
    pub(crate) fn insert_mut<R, F>(&mut self, entry: E, on_occupied: F) -> Option<R>
    where
        F: FnOnce(&mut E, E) -> R,
    {
        let index = self.bucket_index(entry.key());
        let outcome = self.buckets[index].insert_mut(Node::new(entry), on_occupied);
        if outcome.is_none() {
            *self.count.get_mut() += 1;
        }
        outcome
    }

    /// Rehashes every entry into `num_buckets` fresh buckets.
    ///
    /// Nodes are relinked rather than reallocated, so the only allocation
    /// that can fail is the new bucket array, and it happens before the old
    /// one is touched. Zero and the current bucket count are no-ops.
    pub(crate) fn try_resize(&mut self, num_buckets: usize) -> Result<(), TryReserveError> {
        if num_buckets == 0 || num_buckets == self.buckets.len() {
            return Ok(());
        }
        let fresh = allocate_buckets(num_buckets)?;
        let old = mem::replace(&mut self.buckets, fresh);
        debug!(
            "resizing table from {} to {} buckets ({} entries)",
            old.len(),
            num_buckets,
            self.count.get_mut()
        );

        let mut moved = 0;
        for mut bucket in old {
            for mut node in bucket.drain() {
                let index = self.bucket_index(node.entry_mut().key());
                // Keys were unique before the rehash, so this never collides.
                let collided = self.buckets[index].insert_mut(node, |current, incoming| {
                    *current = incoming;
                });
                if collided.is_none() {
                    moved += 1;
                }
            }
        }
        *self.count.get_mut() = moved;
        Ok(())
    }

    pub(crate) fn grow(&mut self) -> Result<(), TryReserveError> {
        let doubled = self.buckets.len().saturating_mul(2);
        self.try_resize(doubled)
    }
}
