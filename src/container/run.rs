//! Run-length encoded container.

use alloc::vec::Vec;
use core::{iter::FlatMap, mem, ops::RangeInclusive, slice};

use super::{ArrayContainer, BitsetContainer, CHUNK_SIZE};

/// An inclusive run `[start, end]` of consecutive low values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Run {
    pub(crate) start: u16,
    pub(crate) end: u16,
}

impl Run {
    #[inline]
    pub(crate) const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    #[inline]
    pub(crate) const fn len(self) -> u32 {
        self.end as u32 - self.start as u32 + 1
    }

    #[inline]
    fn values(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

/// Where `pos` stands relative to `run`: whether it is covered, and the next
/// position at which that answer changes.
#[inline]
fn boundary(run: Option<&Run>, pos: u32) -> (bool, u32) {
    match run {
        Some(r) if u32::from(r.start) <= pos => (true, u32::from(r.end) + 1),
        Some(r) => (false, u32::from(r.start)),
        None => (false, CHUNK_SIZE),
    }
}

/// Appends `[beg, end)` to `out`, coalescing with the last run when adjacent.
#[inline]
fn push_range(out: &mut Vec<Run>, beg: u32, end: u32) {
    debug_assert!(beg < end && end <= CHUNK_SIZE);
    if let Some(last) = out.last_mut()
        && u32::from(last.end) + 1 == beg
    {
        last.end = (end - 1) as u16;
        return;
    }
    out.push(Run::new(beg as u16, (end - 1) as u16));
}

/// Sweeps both run lists in order and keeps every position for which
/// `keep(in_a, in_b)` holds.
pub(crate) fn combine(a: &[Run], b: &[Run], keep: impl Fn(bool, bool) -> bool) -> Vec<Run> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    let mut pos = 0u32;
    while pos < CHUNK_SIZE {
        while i < a.len() && u32::from(a[i].end) < pos {
            i += 1;
        }
        while j < b.len() && u32::from(b[j].end) < pos {
            j += 1;
        }
        if i == a.len() && j == b.len() {
            if keep(false, false) {
                push_range(&mut out, pos, CHUNK_SIZE);
            }
            break;
        }
        let (in_a, next_a) = boundary(a.get(i), pos);
        let (in_b, next_b) = boundary(b.get(j), pos);
        let next = next_a.min(next_b);
        if keep(in_a, in_b) {
            push_range(&mut out, pos, next);
        }
        pos = next;
    }
    out
}

/// A container of sorted, disjoint, non-adjacent runs with a cached
/// cardinality.
#[derive(Debug, Default)]
pub(crate) struct RunContainer {
    runs: Vec<Run>,
    len: u32,
}

impl Clone for RunContainer {
    fn clone(&self) -> Self {
        let mut runs = Vec::with_capacity(self.runs.capacity());
        runs.extend_from_slice(&self.runs);
        Self { runs, len: self.len }
    }
}

pub(crate) type RunIter<'a> =
    FlatMap<slice::Iter<'a, Run>, RangeInclusive<u16>, fn(&Run) -> RangeInclusive<u16>>;

impl RunContainer {
    pub(crate) fn from_runs(runs: Vec<Run>) -> Self {
        debug_assert!(
            runs.windows(2)
                .all(|w| u32::from(w[0].end) + 1 < u32::from(w[1].start))
        );
        let len = runs.iter().map(|r| r.len()).sum();
        Self { runs, len }
    }

    /// A container holding exactly `[beg, end)`.
    pub(crate) fn from_range(beg: u32, end: u32) -> Self {
        let mut runs = Vec::with_capacity(1);
        push_range(&mut runs, beg, end);
        Self::from_runs(runs)
    }

    #[inline]
    pub(crate) fn runs(&self) -> &[Run] {
        &self.runs
    }

    #[inline]
    pub(crate) fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub(crate) fn n_runs(&self) -> usize {
        self.runs.len()
    }

    /// Index of the first run starting after `low`.
    #[inline]
    fn upper(&self, low: u16) -> usize {
        self.runs.partition_point(|r| r.start <= low)
    }

    pub(crate) fn contains(&self, low: u16) -> bool {
        let idx = self.upper(low);
        idx > 0 && self.runs[idx - 1].end >= low
    }

    pub(crate) fn add(&mut self, low: u16) -> bool {
        let idx = self.upper(low);
        let low32 = u32::from(low);
        if idx > 0 {
            let prev_end = u32::from(self.runs[idx - 1].end);
            if prev_end >= low32 {
                return false;
            }
            if prev_end + 1 == low32 {
                self.runs[idx - 1].end = low;
                if let Some(&next) = self.runs.get(idx)
                    && u32::from(next.start) == low32 + 1
                {
                    self.runs[idx - 1].end = next.end;
                    self.runs.remove(idx);
                }
                self.len += 1;
                return true;
            }
        }
        if let Some(next) = self.runs.get_mut(idx)
            && u32::from(next.start) == low32 + 1
        {
            next.start = low;
        } else {
            self.runs.insert(idx, Run::new(low, low));
        }
        self.len += 1;
        true
    }

    pub(crate) fn remove(&mut self, low: u16) -> bool {
        let idx = self.upper(low);
        if idx == 0 {
            return false;
        }
        let run = self.runs[idx - 1];
        if run.end < low {
            return false;
        }
        match (run.start == low, run.end == low) {
            (true, true) => {
                self.runs.remove(idx - 1);
            }
            (true, false) => self.runs[idx - 1].start = low + 1,
            (false, true) => self.runs[idx - 1].end = low - 1,
            (false, false) => {
                self.runs[idx - 1].end = low - 1;
                self.runs.insert(idx, Run::new(low + 1, run.end));
            }
        }
        self.len -= 1;
        true
    }

    pub(crate) fn rank(&self, low: u16) -> u32 {
        let mut n = 0;
        for run in &self.runs[..self.upper(low)] {
            n += if run.end <= low {
                run.len()
            } else {
                u32::from(low) - u32::from(run.start) + 1
            };
        }
        n
    }

    pub(crate) fn select(&self, mut n: u32) -> Option<u16> {
        for run in &self.runs {
            let len = run.len();
            if n < len {
                return Some(run.start + n as u16);
            }
            n -= len;
        }
        None
    }

    #[inline]
    pub(crate) fn min(&self) -> Option<u16> {
        self.runs.first().map(|r| r.start)
    }

    #[inline]
    pub(crate) fn max(&self) -> Option<u16> {
        self.runs.last().map(|r| r.end)
    }

    pub(crate) fn iter(&self) -> RunIter<'_> {
        self.runs.iter().flat_map(Run::values as fn(&Run) -> RangeInclusive<u16>)
    }

    pub(crate) fn to_array(&self) -> ArrayContainer {
        let mut values = Vec::with_capacity(self.len as usize);
        values.extend(self.iter());
        ArrayContainer::from_sorted(values)
    }

    pub(crate) fn to_bitset(&self) -> BitsetContainer {
        BitsetContainer::from_runs(&self.runs)
    }

    pub(crate) fn shrink_to_fit(&mut self) -> usize {
        let before = self.runs.capacity();
        self.runs.shrink_to_fit();
        (before - self.runs.capacity()) * mem::size_of::<Run>()
    }

    /// Applies `keep` position-wise against another run list.
    pub(crate) fn combine(&self, other: &[Run], keep: impl Fn(bool, bool) -> bool) -> Self {
        Self::from_runs(combine(&self.runs, other, keep))
    }

    /// Number of values in `[beg, end)`.
    pub(crate) fn range_len(&self, beg: u32, end: u32) -> u32 {
        self.runs
            .iter()
            .map(|r| {
                let s = u32::from(r.start).max(beg);
                let e = (u32::from(r.end) + 1).min(end);
                e.saturating_sub(s)
            })
            .sum()
    }

    pub(crate) fn intersection_len(&self, other: &Self) -> u32 {
        let (a, b) = (&self.runs, &other.runs);
        let (mut i, mut j, mut n) = (0, 0, 0);
        while i < a.len() && j < b.len() {
            let s = a[i].start.max(b[j].start);
            let e = a[i].end.min(b[j].end);
            if s <= e {
                n += u32::from(e) - u32::from(s) + 1;
            }
            if a[i].end < b[j].end {
                i += 1;
            } else {
                j += 1;
            }
        }
        n
    }

    pub(crate) fn intersects(&self, other: &Self) -> bool {
        let (a, b) = (&self.runs, &other.runs);
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if a[i].start.max(b[j].start) <= a[i].end.min(b[j].end) {
                return true;
            }
            if a[i].end < b[j].end {
                i += 1;
            } else {
                j += 1;
            }
        }
        false
    }
}
