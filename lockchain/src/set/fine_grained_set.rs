use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use super::Set;
use crate::raw::{KeyOnly, RawTable};
use crate::{Error, DEFAULT_NUM_BUCKETS};

/// A concurrent hash set implemented with fine-grained locking.
///
/// The same engine as [`FineGrainedHashMap`](crate::FineGrainedHashMap),
/// storing each element as its own key. Inserting an element that is
/// already present changes nothing.
///
/// ```
/// use lockchain::FineGrainedHashSet;
///
/// let set = FineGrainedHashSet::with_num_buckets(8);
/// assert!(set.insert(3));
/// assert!(!set.insert(3));
/// assert!(set.contains(&3));
/// assert!(set.erase(&3));
/// assert!(!set.erase(&3));
/// ```
pub struct FineGrainedHashSet<T, S = RandomState> {
    table: RawTable<KeyOnly<T>, S>,
}

impl<T> FineGrainedHashSet<T, RandomState> {
    /// Creates a set with [`DEFAULT_NUM_BUCKETS`] buckets.
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

impl<T, S> FineGrainedHashSet<T, S> {
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_num_buckets_and_hasher(DEFAULT_NUM_BUCKETS, hash_builder)
    }

    /// # Panics
    ///
    /// Panics if `num_buckets` is zero or the bucket array cannot be
    /// allocated.
    pub fn with_num_buckets_and_hasher(num_buckets: usize, hash_builder: S) -> Self {
        match Self::try_with_num_buckets_and_hasher(num_buckets, hash_builder) {
            Ok(set) => set,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_with_num_buckets_and_hasher(num_buckets: usize, hash_builder: S) -> Result<Self, Error> {
        Ok(FineGrainedHashSet {
            table: RawTable::try_new(num_buckets, hash_builder)?,
        })
    }

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

impl<T, S> FineGrainedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    pub fn contains<Q>(&self, elem: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.find(elem, |_| ()).is_some()
    }

    /// Adds `elem`. Returns `false` if an equal element was already present.
    pub fn insert(&self, elem: T) -> bool {
        self.table
            .insert(KeyOnly(elem), |_, rejected| rejected)
            .is_none()
    }

    pub fn erase<Q>(&self, elem: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(elem).is_some()
    }

    /// Removes and returns the stored element equal to `elem`.
    pub fn take<Q>(&self, elem: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove(elem).map(|entry| entry.0)
    }

    /// Adds `elem` without taking any lock. Returns whether it was new.
    pub fn fast_insert(&mut self, elem: T) -> bool {
        self.table.insert_mut(KeyOnly(elem), |_, _| ()).is_none()
    }

    /// Rehashes every element into `num_buckets` buckets. Zero is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the new bucket array cannot be allocated.
    pub fn resize(&mut self, num_buckets: usize) {
        if let Err(err) = self.try_resize(num_buckets) {
            panic!("{}", err);
        }
    }

    pub fn try_resize(&mut self, num_buckets: usize) -> Result<(), Error> {
        self.table.try_resize(num_buckets)?;
        Ok(())
    }

    pub fn grow(&mut self) {
        if let Err(err) = self.table.grow() {
            panic!("{}", Error::from(err));
        }
    }
}

impl<T, S: Default> Default for FineGrainedHashSet<T, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T, S> fmt::Debug for FineGrainedHashSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FineGrainedHashSet")
            .field("len", &self.len())
            .field("num_buckets", &self.num_buckets())
            .finish()
    }
}

impl<T, S> Extend<T> for FineGrainedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for elem in iter {
            self.fast_insert(elem);
        }
    }
}

impl<T, S> FromIterator<T> for FineGrainedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<T, S> Set for FineGrainedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type Elem = T;

    fn insert(&self, elem: T) -> bool {
        FineGrainedHashSet::insert(self, elem)
    }

    fn erase(&self, elem: &T) -> bool {
        FineGrainedHashSet::erase(self, elem)
    }

    fn contains(&self, elem: &T) -> bool {
        FineGrainedHashSet::contains(self, elem)
    }

    fn len(&self) -> usize {
        FineGrainedHashSet::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let set = FineGrainedHashSet::with_num_buckets(2);
        for _ in 0..3 {
            set.insert("aboba".to_string());
        }
        assert_eq!(set.len(), 1);
        assert!(set.contains("aboba"));
    }

    #[test]
    fn take_returns_stored_element() {
        let set = FineGrainedHashSet::with_num_buckets(4);
        set.insert(String::from("kept"));
        assert_eq!(set.take("kept").as_deref(), Some("kept"));
        assert_eq!(set.take("kept"), None);
        assert!(set.is_empty());
    }

    #[test]
    fn resize_preserves_members() {
        let mut set: FineGrainedHashSet<u32> = (0..300).collect();
        set.resize(3);
        assert_eq!(set.num_buckets(), 3);
        assert_eq!(set.len(), 300);
        assert!((0..300).all(|i| set.contains(&i)));
        set.grow();
        assert_eq!(set.num_buckets(), 6);
        assert!(!set.contains(&300));
    }

    #[test]
    fn fast_insert_skips_duplicates() {
        let mut set = FineGrainedHashSet::with_num_buckets(1);
        assert!(set.fast_insert(1));
        assert!(!set.fast_insert(1));
        set.extend([2, 3, 3]);
        assert_eq!(set.len(), 3);
    }
}
