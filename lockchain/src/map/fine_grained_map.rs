use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::mem;

use super::Map;
use crate::raw::{KeyValue, RawTable};
use crate::{Error, DEFAULT_NUM_BUCKETS};

/// A concurrent hash map implemented with fine-grained locking.
///
/// Each bucket and each entry has its own reader/writer lock, and lookups,
/// insertions and removals walk a bucket's chain hand over hand. Readers of
/// a key share locks with each other; writers of different keys only meet
/// where their walks cross the same entry.
///
/// Values are copied out by [`find`](Self::find) because no reference may
/// outlive the entry's lock; use [`find_with`](Self::find_with) to inspect a
/// value in place.
///
/// ```
/// use lockchain::FineGrainedHashMap;
///
/// let map = FineGrainedHashMap::with_num_buckets(16);
/// assert!(map.insert("answer".to_string(), 42));
/// assert!(!map.insert("answer".to_string(), 0));
/// assert_eq!(map.find("answer"), Some(42));
/// assert_eq!(map.insert_or_replace("answer".to_string(), 7), Some(42));
/// assert!(map.erase("answer"));
/// assert!(map.is_empty());
/// ```
pub struct FineGrainedHashMap<K, V, S = RandomState> {
    table: RawTable<KeyValue<K, V>, S>,
}

impl<K, V> FineGrainedHashMap<K, V, RandomState> {
    /// Creates a map with [`DEFAULT_NUM_BUCKETS`] buckets.
    pub fn new() -> Self {
        Self::with_num_buckets(DEFAULT_NUM_BUCKETS)
    }

    /// # Panics
    ///
    /// Panics if `num_buckets` is zero.
    pub fn with_num_buckets(num_buckets: usize) -> Self {
        Self::with_num_buckets_and_hasher(num_buckets, RandomState::new())
    }
}

impl<K, V, S> FineGrainedHashMap<K, V, S> {
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_num_buckets_and_hasher(DEFAULT_NUM_BUCKETS, hash_builder)
    }

    /// # Panics
    ///
    /// Panics if `num_buckets` is zero or the bucket array cannot be
    /// allocated.
    pub fn with_num_buckets_and_hasher(num_buckets: usize, hash_builder: S) -> Self {
        match Self::try_with_num_buckets_and_hasher(num_buckets, hash_builder) {
            Ok(map) => map,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_with_num_buckets_and_hasher(num_buckets: usize, hash_builder: S) -> Result<Self, Error> {
        Ok(FineGrainedHashMap {
            table: RawTable::try_new(num_buckets, hash_builder)?,
        })
    }

    /// Number of entries. Exact whenever no insert or erase is in flight.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_buckets(&self) -> usize {
        self.table.num_buckets()
    }

    pub fn hasher(&self) -> &S {
        self.table.hasher()
    }
}

impl<K, V, S> FineGrainedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.find(key, |_| ()).is_some()
    }

    /// Returns a copy of the value stored under `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.table.find(key, |entry| entry.value.clone())
    }

    /// Runs `f` on the value stored under `key` while its entry is
    /// read-locked. `f` must not call back into this map for a key in the
    /// same bucket with a mutating operation, or it deadlocks.
    pub fn find_with<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        self.table.find(key, |entry| f(&entry.value))
    }

    /// Inserts `key` with `value` if the key is absent.
    ///
    /// Returns `false`, leaving the stored value untouched, if the key was
    /// already present.
    pub fn insert(&self, key: K, value: V) -> bool {
        // The rejected pair is dropped only after every lock is released.
        self.table
            .insert(KeyValue { key, value }, |_, rejected| rejected)
            .is_none()
    }

    /// Inserts `key` with `value`, overwriting the value of a present key in
    /// place. Returns the overwritten value.
    ///
    /// The call always succeeds: `Some` only tells an overwrite apart from
    /// the insertion of a new key, which returns `None`.
    pub fn insert_or_replace(&self, key: K, value: V) -> Option<V> {
        self.table
            .insert(KeyValue { key, value }, |current, incoming| {
                mem::replace(&mut current.value, incoming.value)
            })
    }

    /// Removes `key`, returning whether it was present.
    pub fn erase<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove(key).is_some()
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove(key).map(|entry| entry.value)
    }

    /// Inserts without taking any lock. A present key gets its value
    /// overwritten. Returns whether the key was new.
    pub fn fast_insert(&mut self, key: K, value: V) -> bool {
        self.table
            .insert_mut(KeyValue { key, value }, |current, incoming| {
                current.value = incoming.value;
            })
            .is_none()
    }

    /// Rehashes every entry into `num_buckets` buckets. Zero is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the new bucket array cannot be allocated; the map is left
    /// unchanged in that case.
    pub fn resize(&mut self, num_buckets: usize) {
        if let Err(err) = self.try_resize(num_buckets) {
            panic!("{}", err);
        }
    }

    pub fn try_resize(&mut self, num_buckets: usize) -> Result<(), Error> {
        self.table.try_resize(num_buckets)?;
        Ok(())
    }

    /// Doubles the bucket count.
    pub fn grow(&mut self) {
        if let Err(err) = self.table.grow() {
            panic!("{}", Error::from(err));
        }
    }
}

impl<K, V, S: Default> Default for FineGrainedHashMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> fmt::Debug for FineGrainedHashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FineGrainedHashMap")
            .field("len", &self.len())
            .field("num_buckets", &self.num_buckets())
            .finish()
    }
}

impl<K, V, S> Extend<(K, V)> for FineGrainedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.fast_insert(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for FineGrainedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S> Map for FineGrainedHashMap<K, V, S>
where
    K: Hash + Eq,
    V: Clone,
    S: BuildHasher,
{
    type Key = K;
    type Val = V;

    fn find(&self, key: &K) -> Option<V> {
        FineGrainedHashMap::find(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        FineGrainedHashMap::contains(self, key)
    }

    fn insert(&self, key: K, value: V) -> bool {
        FineGrainedHashMap::insert(self, key, value)
    }

    fn put(&self, key: K, value: V) {
        self.insert_or_replace(key, value);
    }

    fn erase(&self, key: &K) -> bool {
        FineGrainedHashMap::erase(self, key)
    }

    fn len(&self) -> usize {
        FineGrainedHashMap::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::BuildHasherDefault;

    #[test]
    fn test_hashtable() {
        let map = FineGrainedHashMap::with_num_buckets(10);
        let key = "hello".to_string();
        let val = "world".to_string();
        map.insert(key.clone(), val.clone());
        assert!(map.contains(&key));
        assert_eq!(map.find(&key).unwrap(), val);
    }

    #[test]
    fn borrowed_lookup() {
        let map: FineGrainedHashMap<String, u32> = FineGrainedHashMap::with_num_buckets(4);
        map.insert("one".to_string(), 1);
        assert!(map.contains("one"));
        assert_eq!(map.find_with("one", |v| v + 1), Some(2));
        assert_eq!(map.remove("one"), Some(1));
        assert_eq!(map.find_with("one", |v| v + 1), None);
    }

    #[test]
    fn insert_keeps_existing_value() {
        let map = FineGrainedHashMap::with_num_buckets(1);
        assert!(map.insert(1, "a"));
        assert!(!map.insert(1, "b"));
        assert_eq!(map.find(&1), Some("a"));
        assert_eq!(map.insert_or_replace(1, "c"), Some("a"));
        assert_eq!(map.insert_or_replace(2, "d"), None);
        assert_eq!(map.find(&1), Some("c"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn fast_insert_overwrites() {
        let mut map = FineGrainedHashMap::with_num_buckets(2);
        assert!(map.fast_insert(1, 10));
        assert!(!map.fast_insert(1, 11));
        assert_eq!(map.find(&1), Some(11));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn collect_and_extend() {
        let mut map: FineGrainedHashMap<u32, u32> = (0..100).map(|i| (i, i * i)).collect();
        assert_eq!(map.num_buckets(), DEFAULT_NUM_BUCKETS);
        map.extend((50..150).map(|i| (i, 0)));
        assert_eq!(map.len(), 150);
        assert_eq!(map.find(&49), Some(49 * 49));
        assert_eq!(map.find(&50), Some(0));
    }

    #[test]
    fn custom_hasher() {
        let map: FineGrainedHashMap<u8, u8, BuildHasherDefault<DefaultHasher>> =
            FineGrainedHashMap::with_num_buckets_and_hasher(3, Default::default());
        for i in 0..=255 {
            assert!(map.insert(i, i));
        }
        assert_eq!(map.len(), 256);
    }

    #[test]
    fn grow_doubles() {
        let mut map = FineGrainedHashMap::with_num_buckets(5);
        map.insert(1, 1);
        map.grow();
        assert_eq!(map.num_buckets(), 10);
        map.resize(0);
        assert_eq!(map.num_buckets(), 10);
        assert_eq!(map.find(&1), Some(1));
    }

    #[test]
    fn debug_reports_shape() {
        let map = FineGrainedHashMap::with_num_buckets(3);
        map.insert('x', ());
        assert_eq!(format!("{:?}", map), "FineGrainedHashMap { len: 1, num_buckets: 3 }");
    }

    #[test]
    #[should_panic(expected = "zero buckets")]
    fn zero_buckets_panics() {
        let _ = FineGrainedHashMap::<u8, u8>::with_num_buckets(0);
    }

    #[test]
    fn try_constructor_reports_zero_buckets() {
        let res = FineGrainedHashMap::<u8, u8, RandomState>::try_with_num_buckets_and_hasher(
            0,
            RandomState::new(),
        );
        assert_eq!(res.unwrap_err(), Error::ZeroBuckets);
    }
}
