//! In-order and level-order traversal, and the external in-order iterator.
//!
//! Nothing here follows pointers: children are found by deriving a child path and probing the
//! table. Every auxiliary buffer grows through `try_reserve`, so a traversal reports
//! [`Error::AllocationFailure`] instead of aborting.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::path::{Direction, Path};
use crate::PathTree;

#[inline]
fn push<T>(stack: &mut Vec<T>, item: T) -> Result<()> {
    stack.try_reserve(1).map_err(|_| Error::alloc(1))?;
    stack.push(item);
    Ok(())
}

impl<K, V> PathTree<K, V> {
    /// Calls `visit` for every entry in ascending key order.
    ///
    /// Uses an explicit stack of `(path, expanded)` pairs: an unexpanded path is replaced by its
    /// right child, itself (expanded) and its left child, and an expanded path is visited.
    pub fn traverse_in_order<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&K, &V),
    {
        let Some(root) = self.root_path() else {
            return Ok(());
        };
        let mut stack: Vec<(Path, bool)> = Vec::new();
        push(&mut stack, (root, false))?;

        while let Some((path, expanded)) = stack.pop() {
            if expanded {
                let entry = self.entry_at(path);
                visit(&entry.key, &entry.value);
                continue;
            }
            if let Some(right) = self.child_path(path, Direction::Right) {
                push(&mut stack, (right, false))?;
            }
            push(&mut stack, (path, true))?;
            if let Some(left) = self.child_path(path, Direction::Left) {
                push(&mut stack, (left, false))?;
            }
        }
        Ok(())
    }

    /// Calls `visit` for every entry, level by level, left to right within a level.
    pub fn traverse_level_order<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&K, &V),
    {
        let Some(root) = self.root_path() else {
            return Ok(());
        };
        let mut queue: VecDeque<Path> = VecDeque::new();
        queue.try_reserve(1).map_err(|_| Error::alloc(1))?;
        queue.push_back(root);

        while let Some(path) = queue.pop_front() {
            let entry = self.entry_at(path);
            visit(&entry.key, &entry.value);
            for dir in [Direction::Left, Direction::Right] {
                if let Some(child) = self.child_path(path, dir) {
                    queue.try_reserve(1).map_err(|_| Error::alloc(1))?;
                    queue.push_back(child);
                }
            }
        }
        Ok(())
    }

    /// In-order iterator over `(&key, &value)`.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

/// Lazy in-order iterator over a [`PathTree`].
///
/// Holds a stack of paths whose left subtrees have been emitted. Iteration cannot be restarted;
/// call [`PathTree::iter`] again for a fresh pass. The iterator borrows the tree, so the tree
/// cannot be mutated while it is alive.
pub struct Iter<'a, K, V> {
    tree: &'a PathTree<K, V>,
    stack: Vec<Path>,
    /// Start of a left spine not yet pushed, left over from a right step or a failed push.
    pending: Option<Path>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn new(tree: &'a PathTree<K, V>) -> Self {
        let mut iter = Self {
            tree,
            stack: Vec::new(),
            pending: tree.root_path(),
            remaining: tree.len(),
        };
        // On failure the unpushed part of the spine stays in `pending` and `try_next` reports it.
        let _ = iter.push_pending_spine();
        iter
    }

    fn push_pending_spine(&mut self) -> Result<()> {
        while let Some(path) = self.pending {
            if self.stack.try_reserve(1).is_err() {
                return Err(Error::alloc(1));
            }
            self.stack.push(path);
            self.pending = self.tree.child_path(path, Direction::Left);
        }
        Ok(())
    }

    pub fn has_next(&self) -> bool {
        !self.stack.is_empty() || self.pending.is_some()
    }

    /// Next entry in key order.
    ///
    /// Fails with [`Error::InvalidIteratorState`] once every entry has been returned, and with
    /// [`Error::AllocationFailure`] if the path stack cannot grow; the latter can be retried.
    pub fn try_next(&mut self) -> Result<(&'a K, &'a V)> {
        self.push_pending_spine()?;
        let path = self.stack.pop().ok_or(Error::InvalidIteratorState)?;
        let entry = self.tree.entry_at(path);
        self.pending = self.tree.child_path(path, Direction::Right);
        self.remaining -= 1;
        Ok((&entry.key, &entry.value))
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    /// Stops early if the path stack cannot grow; [`try_next`](Iter::try_next) reports that as
    /// [`Error::AllocationFailure`], and the count from [`len`](ExactSizeIterator::len) then
    /// still includes the entries not yet returned.
    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a PathTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
