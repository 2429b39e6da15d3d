//! This module contains the concurrent hash set implementation.

mod fine_grained_set;

pub use fine_grained_set::FineGrainedHashSet;

/// Common functionalities for concurrent sets.
pub trait Set {
    type Elem;

    /// Adds `elem`, returning `false` if it was already present.
    fn insert(&self, elem: Self::Elem) -> bool;

    /// Removes `elem`, returning whether it was present.
    fn erase(&self, elem: &Self::Elem) -> bool;

    fn contains(&self, elem: &Self::Elem) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
