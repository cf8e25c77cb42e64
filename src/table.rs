//! Chained hash table keyed by [`Path`].
//!
//! Each bucket is a small vector whose inline slot plays the role of the bucket head; further
//! entries spill into the chain. Growth doubles the bucket count once `len / capacity` reaches
//! 3/4, and every allocation a rehash needs is made before the first entry moves, so a failed
//! resize leaves the old table untouched.

use std::mem;

use smallvec::SmallVec;

use crate::config::{DEFAULT_INITIAL_CAPACITY, LOAD_FACTOR_DEN, LOAD_FACTOR_NUM};
use crate::error::{Error, Result};
use crate::path::Path;

/// A key/value pair stored at some [`Path`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> Entry<K, V> {
    #[inline]
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

#[derive(Clone, Debug)]
struct Slot<K, V> {
    path: Path,
    entry: Entry<K, V>,
}

type Bucket<K, V> = SmallVec<[Slot<K, V>; 1]>;

#[derive(Clone)]
pub struct PathTable<K, V> {
    buckets: Vec<Bucket<K, V>>,
    len: usize,
}

impl<K, V> PathTable<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_CAPACITY)
    }

    /// Creates a table with `capacity` buckets (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut buckets = Vec::with_capacity(capacity);
        buckets.resize_with(capacity, SmallVec::new);
        Self { buckets, len: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    #[inline]
    fn over_threshold(&self) -> bool {
        self.len * LOAD_FACTOR_DEN >= self.capacity() * LOAD_FACTOR_NUM
    }

    /// (bucket, position in chain) of `path`.
    #[inline]
    fn locate(&self, path: Path) -> Option<(usize, usize)> {
        let b = path.bucket(self.capacity());
        self.buckets[b]
            .iter()
            .position(|slot| slot.path == path)
            .map(|i| (b, i))
    }

    pub fn get(&self, path: Path) -> Option<&Entry<K, V>> {
        if self.len == 0 {
            return None;
        }
        let (b, i) = self.locate(path)?;
        Some(&self.buckets[b][i].entry)
    }

    pub fn get_mut(&mut self, path: Path) -> Option<&mut Entry<K, V>> {
        if self.len == 0 {
            return None;
        }
        let (b, i) = self.locate(path)?;
        Some(&mut self.buckets[b][i].entry)
    }

    #[inline]
    pub fn contains(&self, path: Path) -> bool {
        self.len != 0 && self.locate(path).is_some()
    }

    /// Stores `entry` at `path`, returning the entry it replaced.
    ///
    /// The load factor is checked before anything else, so an insert that only updates an
    /// existing path may still grow the table. On error the table holds the same entries as
    /// before the call.
    pub fn insert(&mut self, path: Path, entry: Entry<K, V>) -> Result<Option<Entry<K, V>>> {
        if self.over_threshold() {
            let doubled = self
                .capacity()
                .checked_mul(2)
                .ok_or_else(|| Error::alloc(usize::MAX))?;
            self.resize(doubled)?;
        }

        let b = path.bucket(self.buckets.len());
        let bucket = &mut self.buckets[b];
        if let Some(slot) = bucket.iter_mut().find(|slot| slot.path == path) {
            return Ok(Some(mem::replace(&mut slot.entry, entry)));
        }
        bucket.try_reserve(1).map_err(|_| Error::alloc(1))?;
        bucket.push(Slot { path, entry });
        self.len += 1;
        Ok(None)
    }

    /// Removes the entry at `path`. A removed chain head is replaced by the next link, so the
    /// rest of the bucket stays reachable.
    pub fn remove(&mut self, path: Path) -> Option<Entry<K, V>> {
        if self.len == 0 {
            return None;
        }
        let (b, i) = self.locate(path)?;
        let slot = self.buckets[b].remove(i);
        self.len -= 1;
        Some(slot.entry)
    }

    /// Rehashes every entry into `new_capacity` buckets (at least one).
    ///
    /// Runs in two passes: the first sizes the new bucket array and every chain in it, the
    /// second moves entries into space that already exists. Only the first pass can fail.
    pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
        let new_capacity = new_capacity.max(1);

        let mut counts: Vec<usize> = Vec::new();
        counts
            .try_reserve_exact(new_capacity)
            .map_err(|_| Error::alloc(new_capacity))?;
        counts.resize(new_capacity, 0);
        for slot in self.buckets.iter().flatten() {
            counts[slot.path.bucket(new_capacity)] += 1;
        }

        let mut buckets: Vec<Bucket<K, V>> = Vec::new();
        buckets
            .try_reserve_exact(new_capacity)
            .map_err(|_| Error::alloc(new_capacity))?;
        for &n in &counts {
            let mut bucket = SmallVec::new();
            bucket.try_reserve_exact(n).map_err(|_| Error::alloc(n))?;
            buckets.push(bucket);
        }

        let old_capacity = self.buckets.len();
        for slot in mem::replace(&mut self.buckets, buckets).into_iter().flatten() {
            let b = slot.path.bucket(new_capacity);
            self.buckets[b].push(slot);
        }
        tracing::debug!(old_capacity, new_capacity, len = self.len, "rehashed path table");
        Ok(())
    }

    /// Makes room in the chains `paths` hash to, so that the [`rekey`](Self::rekey) calls that
    /// follow never allocate.
    pub fn reserve_slots<I>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = Path>,
    {
        let capacity = self.capacity();
        let paths = paths.into_iter();
        let mut targets: Vec<usize> = Vec::new();
        targets
            .try_reserve(paths.size_hint().0)
            .map_err(|_| Error::alloc(paths.size_hint().0))?;
        for path in paths {
            targets.try_reserve(1).map_err(|_| Error::alloc(1))?;
            targets.push(path.bucket(capacity));
        }
        targets.sort_unstable();

        for run in targets.chunk_by(|a, b| a == b) {
            self.buckets[run[0]]
                .try_reserve(run.len())
                .map_err(|_| Error::alloc(run.len()))?;
        }
        Ok(())
    }

    /// Moves the entry at `old` to `new` without a load-factor check, returning whatever was
    /// displaced at `new`.
    ///
    /// Fails with [`Error::NotFound`] if `old` is absent. Allocates only when the target chain
    /// has no spare room; see [`reserve_slots`](Self::reserve_slots).
    pub fn rekey(&mut self, old: Path, new: Path) -> Result<Option<Entry<K, V>>> {
        let (b, i) = self.locate(old).ok_or(Error::NotFound)?;
        let slot = self.buckets[b].remove(i);
        self.len -= 1;

        let target = new.bucket(self.buckets.len());
        let bucket = &mut self.buckets[target];
        if let Some(existing) = bucket.iter_mut().find(|s| s.path == new) {
            return Ok(Some(mem::replace(&mut existing.entry, slot.entry)));
        }
        bucket.push(Slot {
            path: new,
            entry: slot.entry,
        });
        self.len += 1;
        Ok(None)
    }

    /// Exchanges the entries stored at two present paths.
    pub fn swap(&mut self, a: Path, b: Path) -> Result<()> {
        let at = self.locate(a).ok_or(Error::NotFound)?;
        let bt = self.locate(b).ok_or(Error::NotFound)?;
        if at == bt {
            return Ok(());
        }

        let (lo, hi) = if at < bt { (at, bt) } else { (bt, at) };
        if lo.0 == hi.0 {
            let (head, tail) = self.buckets[lo.0].split_at_mut(hi.1);
            mem::swap(&mut head[lo.1].entry, &mut tail[0].entry);
        } else {
            let (head, tail) = self.buckets.split_at_mut(hi.0);
            mem::swap(&mut head[lo.0][lo.1].entry, &mut tail[0][hi.1].entry);
        }
        Ok(())
    }

    /// Drops every entry, keeping the bucket count.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    /// All entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (Path, &Entry<K, V>)> + '_ {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|slot| (slot.path, &slot.entry)))
    }

    #[cfg(test)]
    fn longest_chain(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).max().unwrap_or(0)
    }
}

impl<K, V> Default for PathTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for PathTable<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(p, e)| (p.to_string(), (&e.key, &e.value))))
            .finish()
    }
}
