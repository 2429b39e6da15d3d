//! This module contains the concurrent hashmap implementation.

mod fine_grained_map;

pub use fine_grained_map::FineGrainedHashMap;

use std::hash::Hash;

/// Common functionalities for concurrent hash maps.
pub trait Map {
    /// Key type for a HashMap implementation.
    type Key: Hash + Eq;
    /// Value type for a HashMap implementation.
    type Val;

    /// Returns a copy of the value associated with a key, if it exists.
    fn find(&self, key: &Self::Key) -> Option<Self::Val>;

    /// Check whether the map contains a value mapped to the given key.
    fn contains(&self, key: &Self::Key) -> bool;

    /// Emplaces a key-value pair into the map if the key is absent.
    ///
    /// Returns whether the pair was inserted; an existing value is left as is.
    fn insert(&self, key: Self::Key, value: Self::Val) -> bool;

    /// Emplaces a key-value pair into the map.
    ///
    /// If there were a key-value pair associated with this provided key,
    /// its value will be overwritten.
    fn put(&self, key: Self::Key, value: Self::Val);

    /// Attempts to remove a key-value pair based on the provided key, returning
    /// whether a key-value pair was found and removed.
    fn erase(&self, key: &Self::Key) -> bool;

    /// Number of key-value pairs currently stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
