//! Dense 2^16-bit container.

use alloc::{boxed::Box, vec::Vec};

use super::{ArrayContainer, BITSET_WORDS, Run};
use crate::macros::bitpos;

/// A dense container: one bit per possible low value, with the cardinality
/// kept up to date on every mutation.
#[derive(Clone, Debug)]
pub(crate) struct BitsetContainer {
    words: Box<[u64; BITSET_WORDS]>,
    len: u32,
}

impl Default for BitsetContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// Calls `f` with every word index touched by `[beg, end)` and the mask of
/// bits in that word that fall inside the range.
#[inline]
fn for_each_mask(beg: u32, end: u32, mut f: impl FnMut(usize, u64)) {
    if beg >= end {
        return;
    }
    let (beg_wi, beg_bi) = bitpos!(beg);
    let (end_wi, end_bi) = bitpos!(end - 1);
    if beg_wi == end_wi {
        let width = end_bi - beg_bi + 1;
        let mask = if width == 64 { !0 } else { ((1u64 << width) - 1) << beg_bi };
        f(beg_wi, mask);
        return;
    }
    f(beg_wi, !0u64 << beg_bi);
    for wi in beg_wi + 1..end_wi {
        f(wi, !0);
    }
    f(end_wi, !0u64 >> (63 - end_bi));
}

impl BitsetContainer {
    pub(crate) fn new() -> Self {
        Self {
            words: Box::new([0; BITSET_WORDS]),
            len: 0,
        }
    }

    /// Builds a container from raw words, recomputing the cardinality.
    pub(crate) fn from_words(words: Box<[u64; BITSET_WORDS]>) -> Self {
        let len = words.iter().map(|w| w.count_ones()).sum();
        Self { words, len }
    }

    pub(crate) fn from_runs(runs: &[Run]) -> Self {
        let mut words = Box::new([0u64; BITSET_WORDS]);
        for run in runs {
            for_each_mask(u32::from(run.start), u32::from(run.end) + 1, |wi, mask| {
                words[wi] |= mask;
            });
        }
        Self::from_words(words)
    }

    #[inline]
    pub(crate) fn words(&self) -> &[u64; BITSET_WORDS] {
        &self.words
    }

    #[inline]
    pub(crate) fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub(crate) fn contains(&self, low: u16) -> bool {
        let (wi, bi) = bitpos!(low);
        self.words[wi] & (1u64 << bi) != 0
    }

    #[inline]
    pub(crate) fn add(&mut self, low: u16) -> bool {
        let (wi, bi) = bitpos!(low);
        let old = self.words[wi];
        let new = old | (1u64 << bi);
        self.words[wi] = new;
        let added = old != new;
        self.len += u32::from(added);
        added
    }

    #[inline]
    pub(crate) fn remove(&mut self, low: u16) -> bool {
        let (wi, bi) = bitpos!(low);
        let old = self.words[wi];
        let new = old & !(1u64 << bi);
        self.words[wi] = new;
        let removed = old != new;
        self.len -= u32::from(removed);
        removed
    }

    /// Number of set bits at positions less than or equal to `low`.
    pub(crate) fn rank(&self, low: u16) -> u32 {
        let (wi, bi) = bitpos!(low);
        let full: u32 = self.words[..wi].iter().map(|w| w.count_ones()).sum();
        let mask = if bi == 63 { !0 } else { (1u64 << (bi + 1)) - 1 };
        full + (self.words[wi] & mask).count_ones()
    }

    pub(crate) fn select(&self, mut n: u32) -> Option<u16> {
        for (wi, &word) in self.words.iter().enumerate() {
            let ones = word.count_ones();
            if n < ones {
                let mut w = word;
                for _ in 0..n {
                    w &= w - 1;
                }
                return Some((wi * 64 + w.trailing_zeros() as usize) as u16);
            }
            n -= ones;
        }
        None
    }

    pub(crate) fn min(&self) -> Option<u16> {
        self.words
            .iter()
            .position(|&w| w != 0)
            .map(|wi| (wi * 64 + self.words[wi].trailing_zeros() as usize) as u16)
    }

    pub(crate) fn max(&self) -> Option<u16> {
        self.words
            .iter()
            .rposition(|&w| w != 0)
            .map(|wi| (wi * 64 + 63 - self.words[wi].leading_zeros() as usize) as u16)
    }

    /// Number of maximal runs of consecutive set bits.
    pub(crate) fn count_runs(&self) -> usize {
        let mut carry = 0u64;
        let mut runs = 0;
        for &w in self.words.iter() {
            let starts = w & !((w << 1) | carry);
            runs += starts.count_ones() as usize;
            carry = w >> 63;
        }
        runs
    }

    pub(crate) fn to_array(&self) -> ArrayContainer {
        let mut values = Vec::with_capacity(self.len as usize);
        values.extend(self.iter());
        ArrayContainer::from_sorted(values)
    }

    pub(crate) fn to_runs(&self) -> Vec<Run> {
        let mut runs: Vec<Run> = Vec::with_capacity(self.count_runs());
        for v in self.iter() {
            match runs.last_mut() {
                Some(run) if u32::from(run.end) + 1 == u32::from(v) => run.end = v,
                _ => runs.push(Run::new(v, v)),
            }
        }
        runs
    }

    pub(crate) fn iter(&self) -> BitsetIter<'_> {
        BitsetIter::new(&self.words)
    }

    /// Sets every bit in `[beg, end)`.
    pub(crate) fn set_range(&mut self, beg: u32, end: u32) {
        for_each_mask(beg, end, |wi, mask| self.words[wi] |= mask);
        self.recount();
    }

    /// Clears every bit in `[beg, end)`.
    pub(crate) fn clear_range(&mut self, beg: u32, end: u32) {
        for_each_mask(beg, end, |wi, mask| self.words[wi] &= !mask);
        self.recount();
    }

    /// Complements every bit in `[beg, end)`.
    pub(crate) fn flip_range(&mut self, beg: u32, end: u32) {
        for_each_mask(beg, end, |wi, mask| self.words[wi] ^= mask);
        self.recount();
    }

    /// Number of set bits inside `[beg, end)`.
    pub(crate) fn range_len(&self, beg: u32, end: u32) -> u32 {
        let mut n = 0;
        for_each_mask(beg, end, |wi, mask| n += (self.words[wi] & mask).count_ones());
        n
    }

    pub(crate) fn range_intersects(&self, beg: u32, end: u32) -> bool {
        let mut hit = false;
        for_each_mask(beg, end, |wi, mask| hit |= self.words[wi] & mask != 0);
        hit
    }

    fn recount(&mut self) {
        self.len = self.words.iter().map(|w| w.count_ones()).sum();
    }

    pub(crate) fn union_with(&mut self, other: &Self) {
        for (dst, src) in self.words.iter_mut().zip(other.words.iter()) {
            *dst |= *src;
        }
        self.recount();
    }

    pub(crate) fn intersection_with(&mut self, other: &Self) {
        for (dst, src) in self.words.iter_mut().zip(other.words.iter()) {
            *dst &= *src;
        }
        self.recount();
    }

    pub(crate) fn difference_with(&mut self, other: &Self) {
        for (dst, src) in self.words.iter_mut().zip(other.words.iter()) {
            *dst &= !*src;
        }
        self.recount();
    }

    pub(crate) fn symmetric_difference_with(&mut self, other: &Self) {
        for (dst, src) in self.words.iter_mut().zip(other.words.iter()) {
            *dst ^= *src;
        }
        self.recount();
    }

    pub(crate) fn intersection_len(&self, other: &Self) -> u32 {
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a & b).count_ones())
            .sum()
    }

    pub(crate) fn intersects(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(a, b)| a & b != 0)
    }
}

/// Ascending, double-ended iterator over the set bits of a bitset container.
#[derive(Clone, Debug)]
pub(crate) struct BitsetIter<'a> {
    words: &'a [u64; BITSET_WORDS],
    front: usize,
    front_word: u64,
    back: usize,
    back_word: u64,
}

impl<'a> BitsetIter<'a> {
    fn new(words: &'a [u64; BITSET_WORDS]) -> Self {
        Self {
            words,
            front: 0,
            front_word: words[0],
            back: BITSET_WORDS - 1,
            back_word: words[BITSET_WORDS - 1],
        }
    }
}

impl Iterator for BitsetIter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        loop {
            if self.front_word != 0 {
                let bi = self.front_word.trailing_zeros() as usize;
                self.front_word &= self.front_word - 1;
                if self.front == self.back {
                    self.back_word = self.front_word;
                }
                return Some((self.front * 64 + bi) as u16);
            }
            if self.front >= self.back {
                return None;
            }
            self.front += 1;
            self.front_word = if self.front == self.back {
                self.back_word
            } else {
                self.words[self.front]
            };
        }
    }
}

impl DoubleEndedIterator for BitsetIter<'_> {
    fn next_back(&mut self) -> Option<u16> {
        loop {
            if self.back_word != 0 {
                let bi = 63 - self.back_word.leading_zeros() as usize;
                self.back_word &= !(1u64 << bi);
                if self.front == self.back {
                    self.front_word = self.back_word;
                }
                return Some((self.back * 64 + bi) as u16);
            }
            if self.back <= self.front {
                return None;
            }
            self.back -= 1;
            self.back_word = if self.back == self.front {
                self.front_word
            } else {
                self.words[self.back]
            };
        }
    }
}
