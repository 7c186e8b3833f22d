//! Sorted array of distinct 16-bit values.

use alloc::vec::Vec;
use core::{cmp::Ordering, mem};

use super::{ARRAY_MAX, BitsetContainer, Run};

/// A sparse container storing its values as a sorted `Vec<u16>`.
///
/// Holds at most [`ARRAY_MAX`] values; [`Container`](super::Container)
/// promotes it to a bitset before it would grow past that.
#[derive(Debug, Default)]
pub(crate) struct ArrayContainer {
    values: Vec<u16>,
}

// Copies keep the source capacity so that `shrink_to_fit` on a copy releases
// exactly what the original would have.
impl Clone for ArrayContainer {
    fn clone(&self) -> Self {
        let mut values = Vec::with_capacity(self.values.capacity());
        values.extend_from_slice(&self.values);
        Self { values }
    }
}

impl ArrayContainer {
    pub(crate) const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Builds a container from values that are already sorted and distinct.
    pub(crate) fn from_sorted(values: Vec<u16>) -> Self {
        debug_assert!(values.windows(2).all(|w| w[0] < w[1]));
        Self { values }
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[u16] {
        &self.values
    }

    #[inline]
    pub(crate) fn len(&self) -> u32 {
        self.values.len() as u32
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.values.len() >= ARRAY_MAX
    }

    #[inline]
    pub(crate) fn contains(&self, low: u16) -> bool {
        self.values.binary_search(&low).is_ok()
    }

    /// Inserts `low`, returning whether it was absent. The caller must promote
    /// a full container before inserting a new value.
    pub(crate) fn add(&mut self, low: u16) -> bool {
        match self.values.binary_search(&low) {
            Ok(_) => false,
            Err(pos) => {
                self.values.insert(pos, low);
                true
            }
        }
    }

    pub(crate) fn remove(&mut self, low: u16) -> bool {
        match self.values.binary_search(&low) {
            Ok(pos) => {
                self.values.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Number of values less than or equal to `low`.
    pub(crate) fn rank(&self, low: u16) -> u32 {
        match self.values.binary_search(&low) {
            Ok(pos) => pos as u32 + 1,
            Err(pos) => pos as u32,
        }
    }

    #[inline]
    pub(crate) fn select(&self, n: u32) -> Option<u16> {
        self.values.get(n as usize).copied()
    }

    #[inline]
    pub(crate) fn min(&self) -> Option<u16> {
        self.values.first().copied()
    }

    #[inline]
    pub(crate) fn max(&self) -> Option<u16> {
        self.values.last().copied()
    }

    /// Drops every value in `[beg, end)`.
    pub(crate) fn remove_range(&mut self, beg: u32, end: u32) {
        self.values.retain(|&v| !(beg..end).contains(&u32::from(v)));
    }

    /// Number of maximal runs of consecutive values.
    pub(crate) fn count_runs(&self) -> usize {
        let mut runs = 0;
        let mut prev: Option<u16> = None;
        for &v in &self.values {
            if prev.is_none_or(|p| u32::from(p) + 1 != u32::from(v)) {
                runs += 1;
            }
            prev = Some(v);
        }
        runs
    }

    pub(crate) fn to_runs(&self) -> Vec<Run> {
        let mut runs: Vec<Run> = Vec::with_capacity(self.count_runs());
        for &v in &self.values {
            match runs.last_mut() {
                Some(run) if u32::from(run.end) + 1 == u32::from(v) => run.end = v,
                _ => runs.push(Run::new(v, v)),
            }
        }
        runs
    }

    pub(crate) fn to_bitset(&self) -> BitsetContainer {
        let mut bitset = BitsetContainer::new();
        for &v in &self.values {
            bitset.add(v);
        }
        bitset
    }

    /// Releases spare capacity and returns the number of bytes freed.
    pub(crate) fn shrink_to_fit(&mut self) -> usize {
        let before = self.values.capacity();
        self.values.shrink_to_fit();
        (before - self.values.capacity()) * mem::size_of::<u16>()
    }

    pub(crate) fn union(&self, other: &Self) -> Vec<u16> {
        let (a, b) = (self.as_slice(), other.as_slice());
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        out
    }

    pub(crate) fn intersection(&self, other: &Self) -> Vec<u16> {
        let (a, b) = (self.as_slice(), other.as_slice());
        let mut out = Vec::with_capacity(a.len().min(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out
    }

    pub(crate) fn difference(&self, other: &Self) -> Vec<u16> {
        let (a, b) = (self.as_slice(), other.as_slice());
        let mut out = Vec::with_capacity(a.len());
        let mut j = 0;
        for &v in a {
            while j < b.len() && b[j] < v {
                j += 1;
            }
            if j == b.len() || b[j] != v {
                out.push(v);
            }
        }
        out
    }

    pub(crate) fn symmetric_difference(&self, other: &Self) -> Vec<u16> {
        let (a, b) = (self.as_slice(), other.as_slice());
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        out
    }

    /// Size of the intersection, without materializing it.
    pub(crate) fn intersection_len(&self, other: &Self) -> u32 {
        let (a, b) = (self.as_slice(), other.as_slice());
        let (mut i, mut j, mut n) = (0, 0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    n += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        n
    }

    pub(crate) fn intersects(&self, other: &Self) -> bool {
        let (a, b) = (self.as_slice(), other.as_slice());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => return true,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn array(values: &[u16]) -> ArrayContainer {
        ArrayContainer::from_sorted(values.to_vec())
    }

    #[test]
    fn test_add_remove_keep_order() {
        let mut a = ArrayContainer::new();
        assert!(a.add(10));
        assert!(a.add(3));
        assert!(a.add(7));
        assert!(!a.add(7));
        assert_eq!(a.as_slice(), &[3, 7, 10]);
        assert!(a.remove(7));
        assert!(!a.remove(7));
        assert_eq!(a.as_slice(), &[3, 10]);
    }

    #[test]
    fn test_rank_select() {
        let a = array(&[2, 4, 8]);
        assert_eq!(a.rank(0), 0);
        assert_eq!(a.rank(2), 1);
        assert_eq!(a.rank(5), 2);
        assert_eq!(a.rank(u16::MAX), 3);
        assert_eq!(a.select(2), Some(8));
        assert_eq!(a.select(3), None);
    }

    #[test]
    fn test_merges() {
        let a = array(&[1, 2, 3, 9]);
        let b = array(&[2, 3, 4]);
        assert_eq!(a.union(&b), vec![1, 2, 3, 4, 9]);
        assert_eq!(a.intersection(&b), vec![2, 3]);
        assert_eq!(a.difference(&b), vec![1, 9]);
        assert_eq!(a.symmetric_difference(&b), vec![1, 4, 9]);
        assert_eq!(a.intersection_len(&b), 2);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&array(&[5, 6])));
    }

    #[test]
    fn test_runs() {
        let a = array(&[0, 1, 2, 5, 7, 8, u16::MAX]);
        assert_eq!(a.count_runs(), 4);
        assert_eq!(
            a.to_runs(),
            vec![Run::new(0, 2), Run::new(5, 5), Run::new(7, 8), Run::new(u16::MAX, u16::MAX)]
        );
    }

    #[test]
    fn test_clone_keeps_capacity() {
        let mut a = ArrayContainer::new();
        for v in 0..100 {
            a.add(v);
        }
        let mut copy = a.clone();
        assert_eq!(copy.values.capacity(), a.values.capacity());
        let freed = copy.shrink_to_fit();
        assert_eq!(freed, (a.values.capacity() - 100) * 2);
        assert_eq!(copy.shrink_to_fit(), 0);
    }
}
