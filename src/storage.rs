//! Chunk directory: the ordered map from 16-bit chunk keys to containers.

use alloc::{sync::Arc, vec, vec::Vec};
use core::{cmp::Ordering, iter, mem};

use crate::container::{Container, SetOp};

pub(crate) type Entries = iter::Zip<vec::IntoIter<u16>, vec::IntoIter<Arc<Container>>>;

/// Sorted keys with one non-empty container per key.
///
/// Containers sit behind an [`Arc`] so that copy-on-write bitmaps can share
/// them; every mutable access goes through [`Arc::make_mut`], which
/// duplicates a container only while it is shared. Bitmaps without
/// copy-on-write never share, so for them `make_mut` is a plain borrow.
#[derive(Debug, Default)]
pub(crate) struct Directory {
    keys: Vec<u16>,
    containers: Vec<Arc<Container>>,
}

impl Directory {
    pub(crate) const fn new() -> Self {
        Self {
            keys: Vec::new(),
            containers: Vec::new(),
        }
    }

    /// A directory sharing every container with `self`.
    pub(crate) fn share(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            containers: self.containers.clone(),
        }
    }

    /// A directory owning a private copy of every container.
    pub(crate) fn deep_copy(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            containers: self
                .containers
                .iter()
                .map(|c| Arc::new(Container::clone(c)))
                .collect(),
        }
    }

    /// Number of containers.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.keys.clear();
        self.containers.clear();
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> &[u16] {
        &self.keys
    }

    #[inline]
    pub(crate) fn position(&self, key: u16) -> Result<usize, usize> {
        self.keys.binary_search(&key)
    }

    #[inline]
    pub(crate) fn key_at(&self, idx: usize) -> u16 {
        self.keys[idx]
    }

    #[inline]
    pub(crate) fn container_at(&self, idx: usize) -> &Container {
        &self.containers[idx]
    }

    #[inline]
    pub(crate) fn container_at_mut(&mut self, idx: usize) -> &mut Container {
        Arc::make_mut(&mut self.containers[idx])
    }

    /// Whether the container at `idx` is currently shared with another
    /// directory.
    #[cfg(test)]
    pub(crate) fn is_shared(&self, idx: usize) -> bool {
        Arc::strong_count(&self.containers[idx]) > 1
    }

    pub(crate) fn get(&self, key: u16) -> Option<&Container> {
        self.position(key).ok().map(|idx| self.container_at(idx))
    }

    /// Index of the container for `key`, inserting an empty one if needed.
    ///
    /// The caller must either fill the container or call
    /// [`remove_if_empty`](Self::remove_if_empty) afterwards.
    pub(crate) fn get_or_create(&mut self, key: u16) -> usize {
        match self.position(key) {
            Ok(idx) => idx,
            Err(idx) => {
                self.keys.insert(idx, key);
                self.containers.insert(idx, Arc::new(Container::default()));
                idx
            }
        }
    }

    /// Inserts a non-empty container for a key that is not stored yet, at the
    /// index reported by [`position`](Self::position).
    pub(crate) fn insert(&mut self, idx: usize, key: u16, container: Container) {
        debug_assert!(!container.is_empty());
        debug_assert_eq!(self.position(key), Err(idx));
        self.keys.insert(idx, key);
        self.containers.insert(idx, Arc::new(container));
    }

    /// Drops the container at `idx` if it holds no values. Returns whether
    /// it was dropped.
    pub(crate) fn remove_if_empty(&mut self, idx: usize) -> bool {
        if self.containers[idx].is_empty() {
            self.keys.remove(idx);
            self.containers.remove(idx);
            true
        } else {
            false
        }
    }

    /// Appends a container whose key is greater than every stored key.
    /// Empty containers are ignored.
    pub(crate) fn push(&mut self, key: u16, container: Container) {
        debug_assert!(self.keys.last().is_none_or(|&last| last < key));
        if !container.is_empty() {
            self.keys.push(key);
            self.containers.push(Arc::new(container));
        }
    }

    /// Appends a container of another directory, sharing it when `share`
    /// is set and copying it otherwise.
    fn push_from(&mut self, key: u16, container: &Arc<Container>, share: bool) {
        self.keys.push(key);
        self.containers.push(if share {
            Arc::clone(container)
        } else {
            Arc::new(Container::clone(container))
        });
    }

    /// Consumes the directory, yielding its entries in key order.
    pub(crate) fn into_entries(self) -> Entries {
        self.keys.into_iter().zip(self.containers)
    }

    /// Ascending `(key, container)` pairs.
    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = (u16, &Container)> + Clone {
        self.keys
            .iter()
            .copied()
            .zip(self.containers.iter().map(|c| &**c))
    }

    /// Total number of values.
    pub(crate) fn cardinality(&self) -> u64 {
        self.containers.iter().map(|c| u64::from(c.len())).sum()
    }

    /// Merge-joins the keys of both directories and combines every pair of
    /// containers with `op`. One-sided containers are shared, not copied,
    /// when `share` is set.
    pub(crate) fn binary_op(&self, other: &Self, op: SetOp, share: bool) -> Self {
        let mut out = Self::new();
        let (mut i, mut j) = (0, 0);
        while i < self.len() && j < other.len() {
            let (ka, kb) = (self.keys[i], other.keys[j]);
            if ka < kb {
                if op.keep(true, false) {
                    out.push_from(ka, &self.containers[i], share);
                }
                i += 1;
            } else if kb < ka {
                if op.keep(false, true) {
                    out.push_from(kb, &other.containers[j], share);
                }
                j += 1;
            } else {
                out.push(ka, self.containers[i].combine(&other.containers[j], op));
                i += 1;
                j += 1;
            }
        }
        if op.keep(true, false) {
            for idx in i..self.len() {
                out.push_from(self.keys[idx], &self.containers[idx], share);
            }
        }
        if op.keep(false, true) {
            for idx in j..other.len() {
                out.push_from(other.keys[idx], &other.containers[idx], share);
            }
        }
        out
    }

    /// In-place form of [`binary_op`](Self::binary_op). Containers of `self`
    /// are reused, and only duplicated when shared and modified.
    pub(crate) fn binary_op_inplace(&mut self, other: &Self, op: SetOp, share: bool) {
        let keys = mem::take(&mut self.keys);
        let containers = mem::take(&mut self.containers);
        let mut j = 0;
        for (key, mut container) in keys.into_iter().zip(containers) {
            while j < other.len() && other.keys[j] < key {
                if op.keep(false, true) {
                    self.push_from(other.keys[j], &other.containers[j], share);
                }
                j += 1;
            }
            if j < other.len() && other.keys[j] == key {
                Arc::make_mut(&mut container).combine_with(&other.containers[j], op);
                if !container.is_empty() {
                    self.keys.push(key);
                    self.containers.push(container);
                }
                j += 1;
            } else if op.keep(true, false) {
                self.keys.push(key);
                self.containers.push(container);
            }
        }
        if op.keep(false, true) {
            for idx in j..other.len() {
                self.push_from(other.keys[idx], &other.containers[idx], share);
            }
        }
    }

    /// Walks the keys present on both sides.
    fn for_each_common<'a>(&'a self, other: &'a Self, mut f: impl FnMut(&'a Container, &'a Container) -> bool) {
        let (mut i, mut j) = (0, 0);
        while i < self.len() && j < other.len() {
            match self.keys[i].cmp(&other.keys[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    if !f(&self.containers[i], &other.containers[j]) {
                        return;
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
    }

    /// `|self ∩ other|` without building the intersection.
    pub(crate) fn intersection_len(&self, other: &Self) -> u64 {
        let mut n = 0;
        self.for_each_common(other, |a, b| {
            n += u64::from(a.intersection_len(b));
            true
        });
        n
    }

    pub(crate) fn intersects(&self, other: &Self) -> bool {
        let mut found = false;
        self.for_each_common(other, |a, b| {
            found = a.intersects(b);
            !found
        });
        found
    }

    /// Whether every value of `self` is in `other`.
    pub(crate) fn is_subset(&self, other: &Self) -> bool {
        let mut j = 0;
        for (key, container) in self.iter() {
            while j < other.len() && other.keys[j] < key {
                j += 1;
            }
            if j == other.len() || other.keys[j] != key || !container.is_subset(&other.containers[j]) {
                return false;
            }
        }
        true
    }

    /// Same keys and same values per key, whatever the representations.
    pub(crate) fn eq_values(&self, other: &Self) -> bool {
        self.keys == other.keys
            && self
                .containers
                .iter()
                .zip(&other.containers)
                .all(|(a, b)| Arc::ptr_eq(a, b) || a.eq_values(b))
    }

    /// Releases spare capacity of the directory and of every container it
    /// owns exclusively. Returns the number of bytes freed.
    pub(crate) fn shrink_to_fit(&mut self) -> usize {
        let mut freed = (self.keys.capacity() - self.keys.len()) * mem::size_of::<u16>()
            + (self.containers.capacity() - self.containers.len())
                * mem::size_of::<Arc<Container>>();
        self.keys.shrink_to_fit();
        self.containers.shrink_to_fit();
        for container in &mut self.containers {
            if let Some(container) = Arc::get_mut(container) {
                freed += container.shrink_to_fit();
            }
        }
        freed
    }
}
