//! # pathtree
//!
//! A binary search tree with no child pointers. Every node is addressed by its [`Path`]: the
//! left/right turns from the root packed into a `u64`, plus a depth. Nodes live in a chained
//! [`PathTable`] keyed by that path, and every structural question ("does this node have a left
//! child?") is answered by deriving a path and probing the table.
//!
//! The price of pointer-free identity shows up in deletion: promoting a subtree by one level
//! means re-keying every node in it (see [`relocate()`]), O(subtree) instead of one pointer swap.
//! The encoding also caps the depth at [`MAX_DEPTH`]; insertions that would go deeper fail with
//! [`Error::DepthExceeded`]. There is no rebalancing.
//!
//! ## Example
//!
//! ```rust
//! use pathtree::PathTree;
//!
//! let mut tree: PathTree<u32, &str> = PathTree::new();
//! tree.insert(50, "root").unwrap();
//! tree.insert(30, "left").unwrap();
//! tree.insert(70, "right").unwrap();
//!
//! assert_eq!(tree.get(&30), Some(&"left"));
//! assert_eq!(tree.remove(&50), Ok("root"));
//! assert_eq!(tree.keys().copied().collect::<Vec<_>>(), vec![30, 70]);
//! ```

#![deny(unsafe_code)]

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;

pub mod config;
pub mod error;
pub mod path;
pub mod relocate;
mod render;
pub mod table;
mod traverse;

pub use config::TreeConfig;
pub use error::{Error, Result};
pub use path::{Direction, Path, MAX_DEPTH};
pub use relocate::{relocate, Relocation};
pub use render::Render;
pub use table::{Entry, PathTable};
pub use traverse::Iter;

/// Where a key walk from the root ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Probe {
    /// The key is stored at this path.
    Found(Path),
    /// The key is absent and would be inserted at this (empty) path.
    Vacant(Path),
    /// The key is absent and its slot would be deeper than a path can encode.
    TooDeep { depth: usize },
}

/// How a node is unlinked, decided once per deletion from which children are present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Removal {
    Leaf,
    OneChild(Direction),
    TwoChildren,
}

/// Ordered map stored as a path-addressed binary search tree.
#[derive(Clone)]
pub struct PathTree<K, V> {
    table: PathTable<K, V>,
    has_root: bool,
    size: usize,
    config: TreeConfig,
}

impl<K, V> PathTree<K, V> {
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            table: PathTable::with_capacity(config.initial_capacity),
            has_root: false,
            size: 0,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.has_root
    }

    /// Bucket count of the underlying table.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// [`Path::ROOT`] if the tree has a root.
    #[inline]
    pub fn root_path(&self) -> Option<Path> {
        self.has_root.then_some(Path::ROOT)
    }

    #[inline]
    pub fn contains_path(&self, path: Path) -> bool {
        self.table.contains(path)
    }

    /// The child of `path` in direction `dir`, if that node exists.
    #[inline]
    pub fn child_path(&self, path: Path, dir: Direction) -> Option<Path> {
        path.child(dir).filter(|&child| self.table.contains(child))
    }

    #[inline]
    fn entry_at(&self, path: Path) -> &Entry<K, V> {
        self.table
            .get(path)
            .expect("walked onto a path with no entry")
    }

    /// Follows `dir` from `path` for as long as a child exists.
    fn extreme(&self, mut path: Path, dir: Direction) -> Path {
        while let Some(next) = self.child_path(path, dir) {
            path = next;
        }
        path
    }

    pub fn min(&self) -> Result<(&K, &V)> {
        let root = self.root_path().ok_or(Error::EmptyTree)?;
        let entry = self.entry_at(self.extreme(root, Direction::Left));
        Ok((&entry.key, &entry.value))
    }

    pub fn max(&self) -> Result<(&K, &V)> {
        let root = self.root_path().ok_or(Error::EmptyTree)?;
        let entry = self.entry_at(self.extreme(root, Direction::Right));
        Ok((&entry.key, &entry.value))
    }

    /// Number of levels: 0 for an empty tree, 1 for a lone root.
    pub fn height(&self) -> usize {
        let Some(root) = self.root_path() else {
            return 0;
        };
        let mut deepest = 0u8;
        let mut stack = vec![root];
        while let Some(path) = stack.pop() {
            deepest = deepest.max(path.depth());
            for dir in [Direction::Left, Direction::Right] {
                if let Some(child) = self.child_path(path, dir) {
                    stack.push(child);
                }
            }
        }
        usize::from(deepest) + 1
    }

    /// Drops every entry and starts over with a fresh table of the configured capacity.
    pub fn clear(&mut self) {
        tracing::trace!(len = self.size, "clearing path tree");
        self.table = PathTable::with_capacity(self.config.initial_capacity);
        self.has_root = false;
        self.size = 0;
    }

    fn removal(&self, path: Path) -> Removal {
        match (
            self.child_path(path, Direction::Left),
            self.child_path(path, Direction::Right),
        ) {
            (None, None) => Removal::Leaf,
            (Some(_), None) => Removal::OneChild(Direction::Left),
            (None, Some(_)) => Removal::OneChild(Direction::Right),
            (Some(_), Some(_)) => Removal::TwoChildren,
        }
    }

    /// Unlinks the node at `path` and returns its entry.
    ///
    /// On error the tree is unchanged.
    fn remove_at(&mut self, path: Path) -> Result<Entry<K, V>> {
        match self.removal(path) {
            Removal::Leaf => {
                let entry = self
                    .table
                    .remove(path)
                    .expect("removal target must be present");
                if path.is_root() {
                    self.has_root = false;
                }
                Ok(entry)
            }
            Removal::OneChild(dir) => {
                // The node absorbs its only child, the child's subtree moves up a level, and the
                // child's old path is dropped last unless a relocated grandchild landed on it.
                let child = path.child(dir).expect("present child has a valid path");
                let relocation = relocate(&mut self.table, child, path)?;
                Ok(match relocation.displaced {
                    Some(entry) => entry,
                    None => self
                        .table
                        .remove(child)
                        .expect("relocation leaves the absorbed entry at the child path"),
                })
            }
            Removal::TwoChildren => {
                let right = path.right().expect("present child has a valid path");
                let successor = self.extreme(right, Direction::Left);
                // Successor's key/value move into this node; the successor has no left child,
                // so unlinking its slot never recurses again.
                self.table.swap(path, successor)?;
                match self.remove_at(successor) {
                    Ok(entry) => Ok(entry),
                    Err(err) => {
                        let restored = self.table.swap(path, successor);
                        debug_assert!(restored.is_ok());
                        Err(err)
                    }
                }
            }
        }
    }
}

impl<K: Ord, V> PathTree<K, V> {
    /// Walks from the root comparing `key` against each visited node.
    fn probe<Q>(&self, key: &Q) -> Option<Probe>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root_path()?;
        loop {
            let dir = match key.cmp(self.entry_at(current).key.borrow()) {
                Ordering::Equal => return Some(Probe::Found(current)),
                Ordering::Less => Direction::Left,
                Ordering::Greater => Direction::Right,
            };
            match current.child(dir) {
                None => {
                    return Some(Probe::TooDeep {
                        depth: usize::from(current.depth()) + 1,
                    })
                }
                Some(child) if self.table.contains(child) => current = child,
                Some(child) => return Some(Probe::Vacant(child)),
            }
        }
    }

    fn find_path<Q>(&self, key: &Q) -> Result<Path>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.probe(key) {
            None => Err(Error::EmptyTree),
            Some(Probe::Found(path)) => Ok(path),
            Some(_) => Err(Error::NotFound),
        }
    }

    /// Inserts `key`, returning the previous value if the key was already present.
    ///
    /// Re-inserting an existing key overwrites its value in place and keeps the original key.
    /// On error the tree is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        match self.probe(&key) {
            None => {
                self.table.insert(Path::ROOT, Entry::new(key, value))?;
                self.has_root = true;
                self.size = 1;
                Ok(None)
            }
            Some(Probe::Found(path)) => {
                let entry = self
                    .table
                    .get_mut(path)
                    .expect("probe returned a present path");
                Ok(Some(mem::replace(&mut entry.value, value)))
            }
            Some(Probe::Vacant(path)) => {
                self.table.insert(path, Entry::new(key, value))?;
                self.size += 1;
                Ok(None)
            }
            Some(Probe::TooDeep { depth }) => Err(Error::DepthExceeded { depth }),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let path = self.find_path(key).ok()?;
        let entry = self.entry_at(path);
        Some((&entry.key, &entry.value))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let path = self.find_path(key).ok()?;
        self.table.get_mut(path).map(|entry| &mut entry.value)
    }

    /// Like [`get`](Self::get), but says why nothing was found.
    pub fn find<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let path = self.find_path(key)?;
        Ok(&self.entry_at(path).value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_path(key).is_ok()
    }

    /// Path of the node holding `key`.
    pub fn path_of<Q>(&self, key: &Q) -> Option<Path>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_path(key).ok()
    }

    /// Removes `key` and returns its value.
    ///
    /// Fails with [`Error::EmptyTree`] or [`Error::NotFound`] without touching the tree, or with
    /// [`Error::AllocationFailure`] if a subtree relocation cannot be planned, also leaving the
    /// tree unchanged.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let path = self.find_path(key)?;
        let entry = self.remove_at(path)?;
        self.size -= 1;
        Ok(entry.value)
    }
}

impl<K, V> Default for PathTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for PathTree<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}


#[cfg(test)]
mod proptests;
