//! Containers holding the low 16 bits of the values that share a chunk key.
//!
//! Every chunk of 2^16 values is stored in one of three representations:
//!
//! - **Array**: a sorted `Vec<u16>`, used while the chunk holds at most
//!   [`ARRAY_MAX`] values
//! - **Bitset**: 1024 words (8 KiB), used for dense chunks
//! - **Run**: sorted inclusive runs, used for long contiguous ranges
//!
//! The three are interchangeable; which one a chunk uses only affects memory
//! and speed. Ordinary single-value mutation switches between array and
//! bitset at the [`ARRAY_MAX`] threshold and never creates runs: run
//! encodings come from range operations, from combining run containers, and
//! from [`Container::optimize`].

mod array;
mod bitset;
mod run;

use alloc::vec::Vec;
use core::{iter::Copied, slice};

pub(crate) use array::ArrayContainer;
pub(crate) use bitset::{BitsetContainer, BitsetIter};
pub(crate) use run::{Run, RunContainer, RunIter, combine};

/// Largest cardinality an array container may have.
pub(crate) const ARRAY_MAX: usize = 4096;
/// Number of `u64` words in a bitset container.
pub(crate) const BITSET_WORDS: usize = 1024;
/// Size of a bitset container payload.
pub(crate) const BITSET_BYTES: usize = BITSET_WORDS * 8;
/// Number of values addressed by one container.
pub(crate) const CHUNK_SIZE: u32 = 1 << 16;

/// Representation currently used by a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ContainerKind {
    Array,
    Bitset,
    Run,
}

/// A boolean set operation between two containers or two bitmaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SetOp {
    Union,
    Intersection,
    Difference,
    SymmetricDifference,
}

impl SetOp {
    /// Whether a value present on the given sides belongs to the result.
    #[inline]
    pub(crate) const fn keep(self, left: bool, right: bool) -> bool {
        match self {
            Self::Union => left || right,
            Self::Intersection => left && right,
            Self::Difference => left && !right,
            Self::SymmetricDifference => left != right,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Container {
    Array(ArrayContainer),
    Bitset(BitsetContainer),
    Run(RunContainer),
}

impl Default for Container {
    fn default() -> Self {
        Self::Array(ArrayContainer::new())
    }
}

/// Serialized payload size of a container in each representation.
#[inline]
const fn array_size(len: u32) -> usize {
    2 * len as usize
}

#[inline]
const fn run_size(n_runs: usize) -> usize {
    2 + 4 * n_runs
}

impl Container {
    /// A container holding exactly `[beg, end)`.
    pub(crate) fn from_range(beg: u32, end: u32) -> Self {
        Self::Run(RunContainer::from_range(beg, end))
    }

    /// Picks array or bitset for a sorted list of distinct values.
    pub(crate) fn from_values(values: Vec<u16>) -> Self {
        let array = ArrayContainer::from_sorted(values);
        if array.len() as usize > ARRAY_MAX {
            Self::Bitset(array.to_bitset())
        } else {
            Self::Array(array)
        }
    }

    /// Keeps a bitset only while it is denser than an array would be.
    pub(crate) fn from_bitset(bitset: BitsetContainer) -> Self {
        if bitset.len() as usize <= ARRAY_MAX {
            Self::Array(bitset.to_array())
        } else {
            Self::Bitset(bitset)
        }
    }

    /// Keeps the runs only when they are the cheapest encoding.
    pub(crate) fn from_runs(runs: Vec<Run>) -> Self {
        let mut container = Self::Run(RunContainer::from_runs(runs));
        container.optimize();
        container
    }

    #[inline]
    pub(crate) const fn kind(&self) -> ContainerKind {
        match self {
            Self::Array(_) => ContainerKind::Array,
            Self::Bitset(_) => ContainerKind::Bitset,
            Self::Run(_) => ContainerKind::Run,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> u32 {
        match self {
            Self::Array(a) => a.len(),
            Self::Bitset(b) => b.len(),
            Self::Run(r) => r.len(),
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub(crate) fn contains(&self, low: u16) -> bool {
        match self {
            Self::Array(a) => a.contains(low),
            Self::Bitset(b) => b.contains(low),
            Self::Run(r) => r.contains(low),
        }
    }

    /// Inserts `low`, promoting a full array to a bitset.
    pub(crate) fn add(&mut self, low: u16) -> bool {
        match self {
            Self::Array(a) if a.is_full() => {
                if a.contains(low) {
                    return false;
                }
                let mut bitset = a.to_bitset();
                bitset.add(low);
                *self = Self::Bitset(bitset);
                true
            }
            Self::Array(a) => a.add(low),
            Self::Bitset(b) => b.add(low),
            Self::Run(r) => r.add(low),
        }
    }

    /// Removes `low`, demoting a bitset that became sparse to an array.
    pub(crate) fn remove(&mut self, low: u16) -> bool {
        match self {
            Self::Array(a) => a.remove(low),
            Self::Bitset(b) => {
                let removed = b.remove(low);
                if removed && b.len() as usize <= ARRAY_MAX {
                    *self = Self::Array(b.to_array());
                }
                removed
            }
            Self::Run(r) => r.remove(low),
        }
    }

    pub(crate) fn rank(&self, low: u16) -> u32 {
        match self {
            Self::Array(a) => a.rank(low),
            Self::Bitset(b) => b.rank(low),
            Self::Run(r) => r.rank(low),
        }
    }

    pub(crate) fn select(&self, n: u32) -> Option<u16> {
        match self {
            Self::Array(a) => a.select(n),
            Self::Bitset(b) => b.select(n),
            Self::Run(r) => r.select(n),
        }
    }

    pub(crate) fn min(&self) -> Option<u16> {
        match self {
            Self::Array(a) => a.min(),
            Self::Bitset(b) => b.min(),
            Self::Run(r) => r.min(),
        }
    }

    pub(crate) fn max(&self) -> Option<u16> {
        match self {
            Self::Array(a) => a.max(),
            Self::Bitset(b) => b.max(),
            Self::Run(r) => r.max(),
        }
    }

    pub(crate) fn iter(&self) -> ContainerIter<'_> {
        match self {
            Self::Array(a) => ContainerIter::Array(a.as_slice().iter().copied()),
            Self::Bitset(b) => ContainerIter::Bitset(b.iter()),
            Self::Run(r) => ContainerIter::Run(r.iter()),
        }
    }

    /// Number of maximal runs of consecutive values.
    pub(crate) fn count_runs(&self) -> usize {
        match self {
            Self::Array(a) => a.count_runs(),
            Self::Bitset(b) => b.count_runs(),
            Self::Run(r) => r.n_runs(),
        }
    }

    pub(crate) fn to_runs(&self) -> Vec<Run> {
        match self {
            Self::Array(a) => a.to_runs(),
            Self::Bitset(b) => b.to_runs(),
            Self::Run(r) => r.runs().to_vec(),
        }
    }

    /// Calls `f` with every maximal run, in ascending order, whatever the
    /// representation.
    pub(crate) fn for_each_run(&self, mut f: impl FnMut(Run)) {
        if let Self::Run(r) = self {
            r.runs().iter().copied().for_each(f);
            return;
        }
        let mut current: Option<Run> = None;
        for v in self.iter() {
            match current.as_mut() {
                Some(run) if u32::from(run.end) + 1 == u32::from(v) => run.end = v,
                _ => {
                    if let Some(run) = current.replace(Run::new(v, v)) {
                        f(run);
                    }
                }
            }
        }
        if let Some(run) = current {
            f(run);
        }
    }

    /// Bytes the container's payload occupies in the serialized form.
    pub(crate) fn serialized_size(&self) -> usize {
        match self {
            Self::Array(a) => array_size(a.len()),
            Self::Bitset(_) => BITSET_BYTES,
            Self::Run(r) => run_size(r.n_runs()),
        }
    }

    /// The cheapest representation for the current contents. Runs win ties.
    pub(crate) fn best_kind(&self) -> ContainerKind {
        let len = self.len();
        let (plain_kind, plain_size) = if len as usize <= ARRAY_MAX {
            (ContainerKind::Array, array_size(len))
        } else {
            (ContainerKind::Bitset, BITSET_BYTES)
        };
        if run_size(self.count_runs()) <= plain_size {
            ContainerKind::Run
        } else {
            plain_kind
        }
    }

    /// Whether a run encoding would be at most as large as the current one.
    pub(crate) fn should_convert_to_run(&self) -> bool {
        !matches!(self, Self::Run(_)) && self.best_kind() == ContainerKind::Run
    }

    /// Converts to `kind` without changing the stored values.
    pub(crate) fn convert(&mut self, kind: ContainerKind) {
        if self.kind() == kind {
            return;
        }
        *self = match (kind, &*self) {
            (ContainerKind::Array, Self::Bitset(b)) => Self::Array(b.to_array()),
            (ContainerKind::Array, Self::Run(r)) => Self::Array(r.to_array()),
            (ContainerKind::Bitset, Self::Array(a)) => Self::Bitset(a.to_bitset()),
            (ContainerKind::Bitset, Self::Run(r)) => Self::Bitset(r.to_bitset()),
            (ContainerKind::Run, c) => Self::Run(RunContainer::from_runs(c.to_runs())),
            _ => return,
        };
    }

    /// Switches to the cheapest representation, reporting whether it changed.
    pub(crate) fn optimize(&mut self) -> bool {
        let best = self.best_kind();
        if best == self.kind() {
            return false;
        }
        self.convert(best);
        true
    }

    pub(crate) fn shrink_to_fit(&mut self) -> usize {
        match self {
            Self::Array(a) => a.shrink_to_fit(),
            Self::Bitset(_) => 0,
            Self::Run(r) => r.shrink_to_fit(),
        }
    }

    /// Computes `self op other`. The result may be empty.
    pub(crate) fn combine(&self, other: &Self, op: SetOp) -> Self {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => Self::from_values(match op {
                SetOp::Union => a.union(b),
                SetOp::Intersection => a.intersection(b),
                SetOp::Difference => a.difference(b),
                SetOp::SymmetricDifference => a.symmetric_difference(b),
            }),
            (Self::Bitset(a), Self::Bitset(b)) => {
                let mut out = a.clone();
                match op {
                    SetOp::Union => out.union_with(b),
                    SetOp::Intersection => out.intersection_with(b),
                    SetOp::Difference => out.difference_with(b),
                    SetOp::SymmetricDifference => out.symmetric_difference_with(b),
                }
                Self::from_bitset(out)
            }
            (Self::Array(a), Self::Bitset(b)) => match op {
                SetOp::Intersection => Self::from_values(
                    a.as_slice().iter().copied().filter(|&v| b.contains(v)).collect(),
                ),
                SetOp::Difference => Self::from_values(
                    a.as_slice().iter().copied().filter(|&v| !b.contains(v)).collect(),
                ),
                SetOp::Union | SetOp::SymmetricDifference => other.combine(self, op),
            },
            (Self::Bitset(a), Self::Array(b)) => {
                let mut out = a.clone();
                for &v in b.as_slice() {
                    match op {
                        SetOp::Union => {
                            out.add(v);
                        }
                        SetOp::Intersection => {
                            return Self::from_values(
                                b.as_slice().iter().copied().filter(|&v| a.contains(v)).collect(),
                            );
                        }
                        SetOp::Difference => {
                            out.remove(v);
                        }
                        SetOp::SymmetricDifference => {
                            if !out.remove(v) {
                                out.add(v);
                            }
                        }
                    }
                }
                Self::from_bitset(out)
            }
            (Self::Run(a), Self::Run(b)) => {
                Self::from_runs(combine(a.runs(), b.runs(), |x, y| op.keep(x, y)))
            }
            (Self::Run(a), _) => {
                Self::from_runs(combine(a.runs(), &other.to_runs(), |x, y| op.keep(x, y)))
            }
            (_, Self::Run(b)) => {
                Self::from_runs(combine(&self.to_runs(), b.runs(), |x, y| op.keep(x, y)))
            }
        }
    }

    /// In-place `self = self op other`. The result may be empty.
    pub(crate) fn combine_with(&mut self, other: &Self, op: SetOp) {
        match (&mut *self, other) {
            (Self::Bitset(a), Self::Bitset(b)) => {
                match op {
                    SetOp::Union => a.union_with(b),
                    SetOp::Intersection => a.intersection_with(b),
                    SetOp::Difference => a.difference_with(b),
                    SetOp::SymmetricDifference => a.symmetric_difference_with(b),
                }
                if a.len() as usize <= ARRAY_MAX {
                    *self = Self::Array(a.to_array());
                }
            }
            (Self::Bitset(a), Self::Array(b)) if op == SetOp::Union => {
                for &v in b.as_slice() {
                    a.add(v);
                }
            }
            _ => *self = self.combine(other, op),
        }
    }

    /// Size of `self ∩ other` without building it.
    pub(crate) fn intersection_len(&self, other: &Self) -> u32 {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => a.intersection_len(b),
            (Self::Bitset(a), Self::Bitset(b)) => a.intersection_len(b),
            (Self::Run(a), Self::Run(b)) => a.intersection_len(b),
            (Self::Array(a), Self::Bitset(b)) | (Self::Bitset(b), Self::Array(a)) => {
                a.as_slice().iter().filter(|&&v| b.contains(v)).count() as u32
            }
            (Self::Array(a), Self::Run(r)) | (Self::Run(r), Self::Array(a)) => {
                a.as_slice().iter().filter(|&&v| r.contains(v)).count() as u32
            }
            (Self::Bitset(b), Self::Run(r)) | (Self::Run(r), Self::Bitset(b)) => r
                .runs()
                .iter()
                .map(|run| b.range_len(u32::from(run.start), u32::from(run.end) + 1))
                .sum(),
        }
    }

    /// Whether `self` and `other` share a value, stopping at the first one.
    pub(crate) fn intersects(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => a.intersects(b),
            (Self::Bitset(a), Self::Bitset(b)) => a.intersects(b),
            (Self::Run(a), Self::Run(b)) => a.intersects(b),
            (Self::Array(a), Self::Bitset(b)) | (Self::Bitset(b), Self::Array(a)) => {
                a.as_slice().iter().any(|&v| b.contains(v))
            }
            (Self::Array(a), Self::Run(r)) | (Self::Run(r), Self::Array(a)) => {
                a.as_slice().iter().any(|&v| r.contains(v))
            }
            (Self::Bitset(b), Self::Run(r)) | (Self::Run(r), Self::Bitset(b)) => r
                .runs()
                .iter()
                .any(|run| b.range_intersects(u32::from(run.start), u32::from(run.end) + 1)),
        }
    }

    /// Whether both containers hold the same values.
    pub(crate) fn eq_values(&self, other: &Self) -> bool {
        let len = self.len();
        len == other.len() && self.intersection_len(other) == len
    }

    /// Whether every value of `self` is also in `other`.
    pub(crate) fn is_subset(&self, other: &Self) -> bool {
        let len = self.len();
        len <= other.len() && self.intersection_len(other) == len
    }

    /// Complements `[beg, end)` in place. The result may be empty.
    pub(crate) fn flip_range(&mut self, beg: u32, end: u32) {
        debug_assert!(beg < end && end <= CHUNK_SIZE);
        match self {
            Self::Array(a) => {
                let mut bitset = a.to_bitset();
                bitset.flip_range(beg, end);
                *self = Self::from_bitset(bitset);
            }
            Self::Bitset(b) => {
                b.flip_range(beg, end);
                if b.len() as usize <= ARRAY_MAX {
                    *self = Self::Array(b.to_array());
                }
            }
            Self::Run(r) => {
                let range = [Run::new(beg as u16, (end - 1) as u16)];
                *self = Self::from_runs(combine(r.runs(), &range, |x, y| x != y));
            }
        }
    }

    /// Inserts every value of `[beg, end)`.
    pub(crate) fn add_range(&mut self, beg: u32, end: u32) {
        debug_assert!(beg < end && end <= CHUNK_SIZE);
        match self {
            Self::Array(a) => {
                let mut bitset = a.to_bitset();
                bitset.set_range(beg, end);
                *self = Self::from_bitset(bitset);
            }
            Self::Bitset(b) => b.set_range(beg, end),
            Self::Run(r) => {
                let range = [Run::new(beg as u16, (end - 1) as u16)];
                *r = r.combine(&range, |x, y| x || y);
            }
        }
    }

    /// Removes every value of `[beg, end)`. The result may be empty.
    pub(crate) fn remove_range(&mut self, beg: u32, end: u32) {
        debug_assert!(beg < end && end <= CHUNK_SIZE);
        match self {
            Self::Array(a) => a.remove_range(beg, end),
            Self::Bitset(b) => {
                b.clear_range(beg, end);
                if b.len() as usize <= ARRAY_MAX {
                    *self = Self::Array(b.to_array());
                }
            }
            Self::Run(r) => {
                let range = [Run::new(beg as u16, (end - 1) as u16)];
                *r = r.combine(&range, |x, y| x && !y);
            }
        }
    }
}

/// Ascending iterator over the low values of a container.
#[derive(Clone, Debug)]
pub(crate) enum ContainerIter<'a> {
    Array(Copied<slice::Iter<'a, u16>>),
    Bitset(BitsetIter<'a>),
    Run(RunIter<'a>),
}

impl Iterator for ContainerIter<'_> {
    type Item = u16;

    #[inline]
    fn next(&mut self) -> Option<u16> {
        match self {
            Self::Array(it) => it.next(),
            Self::Bitset(it) => it.next(),
            Self::Run(it) => it.next(),
        }
    }
}

impl DoubleEndedIterator for ContainerIter<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<u16> {
        match self {
            Self::Array(it) => it.next_back(),
            Self::Bitset(it) => it.next_back(),
            Self::Run(it) => it.next_back(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn array(values: &[u16]) -> Container {
        Container::from_values(values.to_vec())
    }

    fn dense(beg: u16, end: u16, step: usize) -> Container {
        let mut c = Container::default();
        for v in (beg..end).step_by(step) {
            c.add(v);
        }
        c
    }

    fn collect(c: &Container) -> Vec<u16> {
        c.iter().collect()
    }

    #[test]
    fn test_array_promotes_and_bitset_demotes() {
        let mut c = dense(0, 8192, 2);
        assert_eq!(c.kind(), ContainerKind::Array);
        assert_eq!(c.len(), 4096);
        c.add(1);
        assert_eq!(c.kind(), ContainerKind::Bitset);
        c.remove(1);
        assert_eq!(c.kind(), ContainerKind::Array);
        assert_eq!(c.len(), 4096);
    }

    #[test]
    fn test_runs_never_appear_from_single_adds() {
        let c = dense(0, 1000, 1);
        assert_eq!(c.kind(), ContainerKind::Array);
        assert!(c.should_convert_to_run());
    }

    #[test]
    fn test_best_kind_prefers_runs_on_ties() {
        // One run costs 6 bytes, exactly as much as three array values.
        let c = array(&[7, 8, 9]);
        assert_eq!(c.serialized_size(), 6);
        assert_eq!(c.best_kind(), ContainerKind::Run);
        let c = array(&[1, 3]);
        assert_eq!(c.best_kind(), ContainerKind::Array);
    }

    #[test]
    fn test_optimize_and_convert_preserve_values() {
        let mut c = dense(100, 3000, 1);
        let before = collect(&c);
        assert!(c.optimize());
        assert_eq!(c.kind(), ContainerKind::Run);
        assert!(!c.optimize());
        assert_eq!(collect(&c), before);
        for kind in [ContainerKind::Bitset, ContainerKind::Array, ContainerKind::Run] {
            c.convert(kind);
            assert_eq!(c.kind(), kind);
            assert_eq!(collect(&c), before);
        }
    }

    #[test]
    fn test_combine_every_pair_of_kinds() {
        let left: Vec<u16> = (0..6000).filter(|v| v % 3 != 0).collect();
        let right: Vec<u16> = (3000..9000).collect();
        let kinds = [ContainerKind::Array, ContainerKind::Bitset, ContainerKind::Run];
        for op in [
            SetOp::Union,
            SetOp::Intersection,
            SetOp::Difference,
            SetOp::SymmetricDifference,
        ] {
            let expected: Vec<u16> = (0..=u16::MAX)
                .filter(|v| op.keep(left.binary_search(v).is_ok(), right.binary_search(v).is_ok()))
                .collect();
            for lk in kinds {
                for rk in kinds {
                    let mut a = Container::Bitset(ArrayContainer::from_sorted(left.clone()).to_bitset());
                    let mut b = Container::Bitset(ArrayContainer::from_sorted(right.clone()).to_bitset());
                    a.convert(lk);
                    b.convert(rk);
                    let out = a.combine(&b, op);
                    assert_eq!(collect(&out), expected, "{op:?} {lk:?} {rk:?}");
                    assert_eq!(out.len() as usize, expected.len());

                    let mut inplace = a.clone();
                    inplace.combine_with(&b, op);
                    assert_eq!(collect(&inplace), expected, "{op:?} {lk:?} {rk:?} in place");

                    if op == SetOp::Intersection {
                        assert_eq!(a.intersection_len(&b) as usize, expected.len());
                        assert_eq!(a.intersects(&b), !expected.is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn test_flip_range() {
        let mut c = array(&[1, 5, 9]);
        c.flip_range(0, 8);
        assert_eq!(collect(&c), vec![0, 2, 3, 4, 6, 7, 9]);
        let mut r = Container::from_range(0, 65536);
        r.flip_range(10, 65536);
        assert_eq!(collect(&r), (0..10).collect::<Vec<_>>());
        r.flip_range(0, 10);
        assert!(r.is_empty());
    }

    #[test]
    fn test_add_remove_range() {
        let mut c = array(&[1, 100]);
        c.add_range(10, 20);
        assert_eq!(c.len(), 12);
        c.remove_range(0, 15);
        assert_eq!(collect(&c), vec![15, 16, 17, 18, 19, 100]);
        let mut r = Container::from_range(0, 100);
        r.remove_range(10, 90);
        assert_eq!(r.len(), 20);
        assert_eq!(r.kind(), ContainerKind::Run);
    }

    #[test]
    fn test_for_each_run_is_layout_independent() {
        let mut a = dense(0, 300, 1);
        a.add(1000);
        let mut runs = Vec::new();
        a.for_each_run(|r| runs.push(r));
        a.convert(ContainerKind::Bitset);
        let mut again = Vec::new();
        a.for_each_run(|r| again.push(r));
        assert_eq!(runs, again);
        assert_eq!(runs, vec![Run::new(0, 299), Run::new(1000, 1000)]);
    }
}
