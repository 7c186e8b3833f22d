//! Iterator implementations for `Bitmap`.

use alloc::{sync::Arc, vec, vec::Vec};
use core::iter::FusedIterator;

use crate::{
    Bitmap,
    container::{Container, ContainerIter},
    macros::join,
    storage::{Directory, Entries},
};

/// An iterator over the values of a [`Bitmap`] in ascending order.
///
/// This struct is created by the [`iter`](Bitmap::iter) method on
/// [`Bitmap`]. It can also be walked from the back.
///
/// # Examples
///
/// ```
/// use smol_roaring::Bitmap;
///
/// let bitmap = Bitmap::try_from_iter([1u32, 70_000, 5]).unwrap();
/// let mut iter = bitmap.iter();
/// assert_eq!(iter.next(), Some(1));
/// assert_eq!(iter.next_back(), Some(70_000));
/// assert_eq!(iter.len(), 1);
/// assert_eq!(iter.next(), Some(5));
/// assert_eq!(iter.next(), None);
/// ```
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    dir: &'a Directory,
    /// Next container index to open at the front.
    front: usize,
    /// One past the next container index to open at the back.
    back: usize,
    front_iter: Option<(u16, ContainerIter<'a>)>,
    back_iter: Option<(u16, ContainerIter<'a>)>,
    remaining: u64,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(bitmap: &'a Bitmap) -> Self {
        Self {
            dir: &bitmap.dir,
            front: 0,
            back: bitmap.dir.len(),
            front_iter: None,
            back_iter: None,
            remaining: bitmap.len(),
        }
    }

    fn open(&self, idx: usize) -> (u16, ContainerIter<'a>) {
        (self.dir.key_at(idx), self.dir.container_at(idx).iter())
    }
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            if let Some((key, it)) = &mut self.front_iter
                && let Some(low) = it.next()
            {
                self.remaining -= 1;
                return Some(join!(*key, low));
            }
            if self.front < self.back {
                self.front_iter = Some(self.open(self.front));
                self.front += 1;
                continue;
            }
            // The back iterator may still hold the last opened container.
            let (key, it) = self.back_iter.as_mut()?;
            let low = it.next()?;
            self.remaining -= 1;
            return Some(join!(*key, low));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (n, usize::try_from(self.remaining).ok())
    }

    fn count(self) -> usize {
        self.remaining as usize
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<u32> {
        loop {
            if let Some((key, it)) = &mut self.back_iter
                && let Some(low) = it.next_back()
            {
                self.remaining -= 1;
                return Some(join!(*key, low));
            }
            if self.front < self.back {
                self.back -= 1;
                self.back_iter = Some(self.open(self.back));
                continue;
            }
            let (key, it) = self.front_iter.as_mut()?;
            let low = it.next_back()?;
            self.remaining -= 1;
            return Some(join!(*key, low));
        }
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

/// An owning iterator over the values of a [`Bitmap`] in ascending order.
///
/// This struct is created by the [`IntoIterator`] implementation for
/// [`Bitmap`]. Containers are decoded one at a time as the iterator reaches
/// them.
#[derive(Debug)]
pub struct IntoIter {
    entries: Entries,
    front: Option<(u16, vec::IntoIter<u16>)>,
    back: Option<(u16, vec::IntoIter<u16>)>,
    remaining: u64,
}

impl IntoIter {
    pub(crate) fn new(dir: Directory) -> Self {
        let remaining = dir.cardinality();
        Self {
            entries: dir.into_entries(),
            front: None,
            back: None,
            remaining,
        }
    }
}

/// Decodes one container's values.
fn decode((key, container): (u16, Arc<Container>)) -> (u16, vec::IntoIter<u16>) {
    let values: Vec<u16> = container.iter().collect();
    (key, values.into_iter())
}

impl Iterator for IntoIter {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            if let Some((key, it)) = &mut self.front
                && let Some(low) = it.next()
            {
                self.remaining -= 1;
                return Some(join!(*key, low));
            }
            if let Some(entry) = self.entries.next() {
                self.front = Some(decode(entry));
                continue;
            }
            let (key, it) = self.back.as_mut()?;
            let low = it.next()?;
            self.remaining -= 1;
            return Some(join!(*key, low));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (n, usize::try_from(self.remaining).ok())
    }
}

impl DoubleEndedIterator for IntoIter {
    fn next_back(&mut self) -> Option<u32> {
        loop {
            if let Some((key, it)) = &mut self.back
                && let Some(low) = it.next_back()
            {
                self.remaining -= 1;
                return Some(join!(*key, low));
            }
            if let Some(entry) = self.entries.next_back() {
                self.back = Some(decode(entry));
                continue;
            }
            let (key, it) = self.front.as_mut()?;
            let low = it.next_back()?;
            self.remaining -= 1;
            return Some(join!(*key, low));
        }
    }
}

impl ExactSizeIterator for IntoIter {}

impl FusedIterator for IntoIter {}

#[cfg(test)]
mod tests {
    use crate::Bitmap;
    use alloc::vec::Vec;

    fn sample() -> Bitmap {
        let mut bitmap = Bitmap::try_from_iter((0u32..5000).map(|v| v * 3)).unwrap();
        bitmap.add_range(200_000, 200_100);
        bitmap.add(u32::MAX);
        bitmap
    }

    #[test]
    fn test_forward_and_backward_agree() {
        let bitmap = sample();
        let forward: Vec<u32> = bitmap.iter().collect();
        let mut backward: Vec<u32> = bitmap.iter().rev().collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(forward.len() as u64, bitmap.len());
        assert!(forward.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_meeting_in_the_middle() {
        let bitmap = sample();
        let expected = bitmap.to_vec();
        let mut iter = bitmap.iter();
        let mut front = Vec::new();
        let mut back = Vec::new();
        loop {
            match (iter.next(), iter.next_back()) {
                (Some(a), Some(b)) => {
                    front.push(a);
                    back.push(b);
                }
                (Some(a), None) => {
                    front.push(a);
                    break;
                }
                (None, _) => break,
            }
        }
        assert_eq!(iter.len(), 0);
        back.reverse();
        front.extend(back);
        assert_eq!(front, expected);
    }

    #[test]
    fn test_single_container_from_both_ends() {
        let bitmap = Bitmap::try_from_iter([1u32, 2, 3]).unwrap();
        let mut iter = bitmap.iter();
        assert_eq!(iter.next_back(), Some(3));
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next_back(), Some(2));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn test_into_iter() {
        let bitmap = sample();
        let expected = bitmap.to_vec();
        let mut owned = bitmap.clone().into_iter();
        assert_eq!(owned.len(), expected.len());
        assert_eq!(owned.next_back(), Some(u32::MAX));
        assert_eq!(owned.next(), Some(0));
        let rest: Vec<u32> = owned.collect();
        assert_eq!(rest, expected[1..expected.len() - 1]);
    }
}
