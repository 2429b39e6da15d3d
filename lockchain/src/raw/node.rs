use std::borrow::Borrow;
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Entry;

/// Owning pointer to the rest of a chain.
pub(crate) type Link<E> = Option<Box<Node<E>>>;

/// The state guarded by a node's lock: its entry and the link to its
/// successor.
pub(crate) struct Slot<E> {
    entry: E,
    next: Link<E>,
}

pub(crate) struct Node<E> {
    slot: RwLock<Slot<E>>,
}

impl<E> Node<E> {
    pub(crate) fn new(entry: E) -> Box<Self> {
        Box::new(Node {
            slot: RwLock::new(Slot { entry, next: None }),
        })
    }

    // A panic while a guard is held cannot leave a half-made splice: every
    // link update is a single assignment. Poisoning is therefore ignored.
    fn read(&self) -> RwLockReadGuard<'_, Slot<E>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slot<E>> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot_mut(&mut self) -> &mut Slot<E> {
        self.slot.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn entry_mut(&mut self) -> &mut E {
        &mut self.slot_mut().entry
    }

    /// Consumes a detached node. The node must not own a successor anymore.
    pub(crate) fn into_entry(self) -> E {
        let slot = self.slot.into_inner().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(slot.next.is_none());
        slot.entry
    }
}

/// Extends a node reference past the guard it was read through.
///
/// # Safety
///
/// The node's own lock must be acquired before the guard it was reached
/// through is released, and the reference must not be used once that node
/// lock is released again. Under this discipline nobody can unlink (and
/// free) the node while the reference is in use: unlinking requires the
/// predecessor's write lock followed by the node's write lock.
unsafe fn detach<'a, E>(node: &Node<E>) -> &'a Node<E> {
    &*(node as *const Node<E>)
}

/// A read lock on one position of a chain.
enum ReadPos<'a, E> {
    Head(RwLockReadGuard<'a, Link<E>>),
    Node(RwLockReadGuard<'a, Slot<E>>),
}

impl<E> ReadPos<'_, E> {
    fn next(&self) -> Option<&Node<E>> {
        match self {
            ReadPos::Head(head) => head.as_deref(),
            ReadPos::Node(slot) => slot.next.as_deref(),
        }
    }
}

/// A write lock on one position of a chain.
enum WritePos<'a, E> {
    Head(RwLockWriteGuard<'a, Link<E>>),
    Node(RwLockWriteGuard<'a, Slot<E>>),
}

impl<E> WritePos<'_, E> {
    fn next(&self) -> Option<&Node<E>> {
        match self {
            WritePos::Head(head) => head.as_deref(),
            WritePos::Node(slot) => slot.next.as_deref(),
        }
    }

    fn link_mut(&mut self) -> &mut Link<E> {
        match self {
            WritePos::Head(head) => &mut **head,
            WritePos::Node(slot) => &mut slot.next,
        }
    }
}

/// One hash bucket: the head of a chain and the lock guarding it.
pub(crate) struct Bucket<E> {
    head: RwLock<Link<E>>,
}

impl<E> Bucket<E> {
    pub(crate) fn new() -> Self {
        Bucket {
            head: RwLock::new(None),
        }
    }

    fn read_head(&self) -> RwLockReadGuard<'_, Link<E>> {
        self.head.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_head(&self) -> RwLockWriteGuard<'_, Link<E>> {
        self.head.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn head_mut(&mut self) -> &mut Link<E> {
        self.head.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Detaches the whole chain, yielding its nodes front to back.
    pub(crate) fn drain(&mut self) -> Drain<E> {
        Drain {
            link: self.head_mut().take(),
        }
    }
}

impl<E: Entry> Bucket<E> {
    /// Walks the chain under read locks and applies `f` to the entry whose
    /// key equals `key`, while that entry's node is still read-locked.
    pub(crate) fn find<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        E::Key: Borrow<Q>,
        Q: ?Sized + Eq,
        F: FnOnce(&E) -> R,
    {
        let mut held = ReadPos::Head(self.read_head());
        loop {
            // SAFETY: `node` is locked right below, before `held` is released.
            let node = unsafe { detach(held.next()?) };
            let slot = node.read();
            drop(held);
            if slot.entry.key().borrow() == key {
                return Some(f(&slot.entry));
            }
            held = ReadPos::Node(slot);
        }
    }

    /// Appends `node` at the tail of the chain unless its key is already
    /// present, in which case `on_occupied` receives the stored entry (still
    /// write-locked) and the rejected one.
    ///
    /// Returns `None` when the node was linked in. `count` is bumped while
    /// the new tail's predecessor is still locked, so no eraser of the same
    /// key can decrement it first.
    pub(crate) fn insert<R, F>(
        &self,
        mut node: Box<Node<E>>,
        count: &AtomicUsize,
        on_occupied: F,
    ) -> Option<R>
    where
        F: FnOnce(&mut E, E) -> R,
    {
        let mut held = WritePos::Head(self.write_head());
        while let Some(next) = held.next() {
            // SAFETY: `next` is locked right below, before `held` is released.
            let next = unsafe { detach(next) };
            let mut slot = next.write();
            drop(held);
            if slot.entry.key() == node.entry_mut().key() {
                let incoming = Node::into_entry(*node);
                return Some(on_occupied(&mut slot.entry, incoming));
            }
            held = WritePos::Node(slot);
        }
        *held.link_mut() = Some(node);
        count.fetch_add(1, Ordering::Release);
        None
    }

    /// Unlinks the node holding `key` and returns its entry.
    ///
    /// The predecessor and the candidate are both write-locked at the moment
    /// of the match; the predecessor adopts the candidate's successor before
    /// the candidate is dropped.
    pub(crate) fn remove<Q>(&self, key: &Q, count: &AtomicUsize) -> Option<E>
    where
        E::Key: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut held = WritePos::Head(self.write_head());
        loop {
            // SAFETY: `node` is locked right below, before `held` is released.
            let node = unsafe { detach(held.next()?) };
            let mut slot = node.write();
            if slot.entry.key().borrow() == key {
                let successor = slot.next.take();
                drop(slot);
                let unlinked = mem::replace(held.link_mut(), successor);
                count.fetch_sub(1, Ordering::Release);
                drop(held);
                return unlinked.map(|node| Node::into_entry(*node));
            }
            held = WritePos::Node(slot);
        }
    }

    /// Lock-free counterpart of [`Bucket::insert`] for exclusively owned
    /// buckets. Still refuses duplicates.
    pub(crate) fn insert_mut<R, F>(&mut self, mut node: Box<Node<E>>, on_occupied: F) -> Option<R>
    where
        F: FnOnce(&mut E, E) -> R,
    {
        let mut link = self.head_mut();
        loop {
            match link {
                None => {
                    *link = Some(node);
                    return None;
                }
                Some(existing) => {
                    let slot = existing.slot_mut();
                    if slot.entry.key() == node.entry_mut().key() {
                        let incoming = Node::into_entry(*node);
                        return Some(on_occupied(&mut slot.entry, incoming));
                    }
                    link = &mut slot.next;
                }
            }
        }
    }
}

impl<E> Drop for Bucket<E> {
    fn drop(&mut self) {
        drop(self.drain());
    }
}

/// Owning iterator over a detached chain.
///
/// Nodes are handed out one at a time with their successor link cleared, so
/// dropping a long chain never recurses.
pub(crate) struct Drain<E> {
    link: Link<E>,
}

impl<E> Iterator for Drain<E> {
    type Item = Box<Node<E>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut node = self.link.take()?;
        self.link = node.slot_mut().next.take();
        Some(node)
    }
}

impl<E> Drop for Drain<E> {
    fn drop(&mut self) {
        for _ in self.by_ref() {}
    }
}
