//! `Bitmap` struct and core implementation.

use alloc::vec::Vec;

use tracing::debug;

use crate::{
    Value,
    container::{CHUNK_SIZE, Container},
    error::{Error, Result},
    iter::Iter,
    macros::{join, split},
    storage::Directory,
};

/// One past the largest value a bitmap can hold.
pub(crate) const UNIVERSE: u64 = 1 << 32;

/// Construction options shared by every bitmap constructor.
///
/// `copy_on_write` decides whether copies of a bitmap share their containers
/// until one side modifies them; it is fixed for the lifetime of a bitmap and
/// two bitmaps can only be combined when they agree on it. `optimize` runs
/// [`Bitmap::run_optimize`] and [`Bitmap::shrink_to_fit`] on the freshly
/// built bitmap.
///
/// # Examples
///
/// ```
/// use smol_roaring::Bitmap;
///
/// let bitmap = Bitmap::builder()
///     .copy_on_write(true)
///     .collect([1u32, 2, 3])
///     .unwrap();
/// assert!(bitmap.is_copy_on_write());
/// assert_eq!(bitmap.len(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitmapOptions {
    /// Share containers between copies until they are written to.
    pub copy_on_write: bool,
    /// Pick the cheapest container layout after construction.
    pub optimize: bool,
}

impl Default for BitmapOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl BitmapOptions {
    /// Copy-on-write disabled, optimization enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            copy_on_write: false,
            optimize: true,
        }
    }

    /// Sets the copy-on-write flag.
    #[must_use]
    pub const fn copy_on_write(mut self, enabled: bool) -> Self {
        self.copy_on_write = enabled;
        self
    }

    /// Sets whether constructors optimize the layout of their result.
    #[must_use]
    pub const fn optimize(mut self, enabled: bool) -> Self {
        self.optimize = enabled;
        self
    }

    /// An empty bitmap with these options.
    #[must_use]
    pub const fn build(self) -> Bitmap {
        Bitmap {
            dir: Directory::new(),
            copy_on_write: self.copy_on_write,
        }
    }

    /// Builds a bitmap from any collection of integers.
    ///
    /// Every value is checked before the bitmap is returned, so a single
    /// out-of-range value fails the whole construction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if a value is outside of `[0, 2^32)`.
    pub fn collect<I>(self, values: I) -> Result<Bitmap>
    where
        I: IntoIterator,
        I::Item: Value,
    {
        let mut staged = values
            .into_iter()
            .map(Value::to_u32)
            .collect::<Result<Vec<_>>>()?;
        staged.sort_unstable();
        let mut bitmap = self.build();
        bitmap.extend_sorted(staged);
        Ok(self.finish(bitmap))
    }

    /// Builds the bitmap of `range(start, stop, step)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStep`] when `step <= 0` and [`Error::Range`]
    /// when a value of the range falls outside of `[0, 2^32)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use smol_roaring::Bitmap;
    ///
    /// let evens = Bitmap::builder().range(0, 10, 2).unwrap();
    /// assert_eq!(evens.to_vec(), vec![0, 2, 4, 6, 8]);
    /// assert!(Bitmap::builder().range(0, 10, 0).is_err());
    /// ```
    pub fn range(self, start: i64, stop: i64, step: i64) -> Result<Bitmap> {
        if step <= 0 {
            return Err(Error::InvalidStep { step });
        }
        let mut bitmap = self.build();
        if start < stop {
            let first = start.to_u32()?;
            let last = i128::from(start)
                + (i128::from(stop) - 1 - i128::from(start)) / i128::from(step) * i128::from(step);
            let last = last.to_u32()?;
            if step == 1 {
                bitmap.add_range(u64::from(first), u64::from(last) + 1);
            } else {
                let step = step as usize;
                bitmap.extend_sorted((u64::from(first)..=u64::from(last)).step_by(step).map(|v| v as u32));
            }
        }
        Ok(self.finish(bitmap))
    }

    /// Copies `other` under these options.
    ///
    /// Containers are shared with `other` when both sides use copy-on-write
    /// and copied otherwise.
    #[must_use]
    pub fn copy_of(self, other: &Bitmap) -> Bitmap {
        let dir = if self.copy_on_write && other.copy_on_write {
            other.dir.share()
        } else {
            other.dir.deep_copy()
        };
        self.finish(Bitmap {
            dir,
            copy_on_write: self.copy_on_write,
        })
    }

    pub(crate) fn finish(self, mut bitmap: Bitmap) -> Bitmap {
        if self.optimize {
            bitmap.run_optimize();
            bitmap.shrink_to_fit();
        }
        bitmap
    }
}

/// A compressed set of `u32` values.
///
/// # Overview
///
/// Values are split into a 16-bit key and a 16-bit low part. Values sharing a
/// key are stored together in one container, and each container picks the
/// representation that suits its density:
///
/// - **Array**: a sorted list, for at most 4096 values
/// - **Bitset**: 65536 bits, for dense chunks
/// - **Run**: sorted inclusive ranges, for long stretches of consecutive
///   values
///
/// Arrays and bitsets are switched automatically as values come and go. Run
/// containers appear through range operations and
/// [`run_optimize`](Self::run_optimize).
///
/// # Copy-on-write
///
/// A bitmap built with [`BitmapOptions::copy_on_write`] shares its containers
/// with its clones and only copies a container the first time either side
/// modifies it. Binary operations refuse to mix bitmaps with different
/// copy-on-write flags.
///
/// # Examples
///
/// ```
/// use smol_roaring::Bitmap;
///
/// let mut a = Bitmap::try_from_iter([1u32, 2, 3, 100_000]).unwrap();
/// let b = Bitmap::try_from_iter([3u32, 100_000, 100_001]).unwrap();
///
/// a.add(7);
/// assert!(a.contains(7));
/// assert_eq!(a.len(), 5);
///
/// let both = a.intersection(&b).unwrap();
/// assert_eq!(both.to_vec(), vec![3, 100_000]);
/// ```
pub struct Bitmap {
    pub(crate) dir: Directory,
    pub(crate) copy_on_write: bool,
}

impl Bitmap {
    /// Creates an empty bitmap without copy-on-write.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let bitmap = Bitmap::new();
    /// assert!(bitmap.is_empty());
    /// assert!(!bitmap.is_copy_on_write());
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        BitmapOptions::new().build()
    }

    /// Starts configuring a bitmap.
    #[must_use]
    pub const fn builder() -> BitmapOptions {
        BitmapOptions::new()
    }

    /// Builds an optimized bitmap from any collection of integers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if a value is outside of `[0, 2^32)`; nothing
    /// is built in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::{Bitmap, Error};
    /// let bitmap = Bitmap::try_from_iter([3i64, 1, 2]).unwrap();
    /// assert_eq!(bitmap.to_vec(), vec![1, 2, 3]);
    ///
    /// let err = Bitmap::try_from_iter([1i64, -1]).unwrap_err();
    /// assert_eq!(err, Error::Range { value: -1 });
    /// ```
    pub fn try_from_iter<I>(values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Value,
    {
        Self::builder().collect(values)
    }

    /// Builds the bitmap of `range(start, stop, step)` with default options.
    ///
    /// # Errors
    ///
    /// See [`BitmapOptions::range`].
    pub fn from_range(start: i64, stop: i64, step: i64) -> Result<Self> {
        Self::builder().range(start, stop, step)
    }

    /// Whether copies of this bitmap share containers until written to.
    #[inline]
    #[must_use]
    pub const fn is_copy_on_write(&self) -> bool {
        self.copy_on_write
    }

    /// Adds `value`, returning whether it was absent.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let mut bitmap = Bitmap::new();
    /// assert!(bitmap.add(42));
    /// assert!(!bitmap.add(42));
    /// ```
    pub fn add(&mut self, value: u32) -> bool {
        if self.contains(value) {
            return false;
        }
        let (key, low) = split!(value);
        let idx = self.dir.get_or_create(key);
        self.dir.container_at_mut(idx).add(low)
    }

    /// Removes `value` if present, returning whether it was there.
    pub fn discard(&mut self, value: u32) -> bool {
        let (key, low) = split!(value);
        let Ok(idx) = self.dir.position(key) else {
            return false;
        };
        if !self.dir.container_at(idx).contains(low) {
            return false;
        }
        self.dir.container_at_mut(idx).remove(low);
        self.dir.remove_if_empty(idx);
        true
    }

    /// Removes `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `value` is not in the bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::{Bitmap, Error};
    /// let mut bitmap = Bitmap::try_from_iter([1u32]).unwrap();
    /// assert!(bitmap.remove(1).is_ok());
    /// assert_eq!(bitmap.remove(1), Err(Error::NotFound { value: 1 }));
    /// ```
    pub fn remove(&mut self, value: u32) -> Result<()> {
        if self.discard(value) {
            Ok(())
        } else {
            Err(Error::NotFound { value })
        }
    }

    /// Whether `value` is in the bitmap.
    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        let (key, low) = split!(value);
        self.dir.get(key).is_some_and(|c| c.contains(low))
    }

    /// [`add`](Self::add) for a value that may not be a `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if `value` is outside of `[0, 2^32)`.
    pub fn try_add(&mut self, value: i64) -> Result<bool> {
        Ok(self.add(value.to_u32()?))
    }

    /// [`discard`](Self::discard) for a value that may not be a `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if `value` is outside of `[0, 2^32)`.
    pub fn try_discard(&mut self, value: i64) -> Result<bool> {
        Ok(self.discard(value.to_u32()?))
    }

    /// [`remove`](Self::remove) for a value that may not be a `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if `value` is outside of `[0, 2^32)` and
    /// [`Error::NotFound`] if it is absent.
    pub fn try_remove(&mut self, value: i64) -> Result<()> {
        self.remove(value.to_u32()?)
    }

    /// [`contains`](Self::contains) for a value that may not be a `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if `value` is outside of `[0, 2^32)`.
    pub fn try_contains(&self, value: i64) -> Result<bool> {
        Ok(self.contains(value.to_u32()?))
    }

    /// Number of values in the bitmap.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.dir.cardinality()
    }

    /// Whether the bitmap holds no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dir.is_empty()
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.dir.clear();
    }

    /// Iterates over the values in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let bitmap = Bitmap::try_from_iter([70_000u32, 5, 9]).unwrap();
    /// let values: Vec<u32> = bitmap.iter().collect();
    /// assert_eq!(values, vec![5, 9, 70_000]);
    /// assert_eq!(bitmap.iter().next_back(), Some(70_000));
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self)
    }

    /// The values in ascending order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// Smallest value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] on an empty bitmap.
    pub fn min(&self) -> Result<u32> {
        self.dir
            .iter()
            .next()
            .and_then(|(key, c)| c.min().map(|low| join!(key, low)))
            .ok_or(Error::Empty)
    }

    /// Largest value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] on an empty bitmap.
    pub fn max(&self) -> Result<u32> {
        self.dir
            .iter()
            .next_back()
            .and_then(|(key, c)| c.max().map(|low| join!(key, low)))
            .ok_or(Error::Empty)
    }

    /// Number of values less than or equal to `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let bitmap = Bitmap::try_from_iter([1u32, 5, 70_000]).unwrap();
    /// assert_eq!(bitmap.rank(0), 0);
    /// assert_eq!(bitmap.rank(5), 2);
    /// assert_eq!(bitmap.rank(u32::MAX), 3);
    /// ```
    #[must_use]
    pub fn rank(&self, value: u32) -> u64 {
        let (key, low) = split!(value);
        let mut rank = 0;
        for (k, c) in self.dir.iter() {
            if k < key {
                rank += u64::from(c.len());
            } else {
                if k == key {
                    rank += u64::from(c.rank(low));
                }
                break;
            }
        }
        rank
    }

    /// The `n`-th smallest value, counting from zero.
    pub(crate) fn nth_value(&self, mut n: u64) -> Option<u32> {
        for (key, c) in self.dir.iter() {
            let len = u64::from(c.len());
            if n < len {
                return c.select(n as u32).map(|low| join!(key, low));
            }
            n -= len;
        }
        None
    }

    /// The value at position `index` in ascending order. Negative indices
    /// count from the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Index`] if `index` is not within `-len..len`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let bitmap = Bitmap::try_from_iter([10u32, 20, 30]).unwrap();
    /// assert_eq!(bitmap.select(0).unwrap(), 10);
    /// assert_eq!(bitmap.select(-1).unwrap(), 30);
    /// assert!(bitmap.select(3).is_err());
    /// ```
    pub fn select(&self, index: i64) -> Result<u32> {
        let len = self.len();
        let pos = if index < 0 {
            i128::from(index) + i128::from(len)
        } else {
            i128::from(index)
        };
        if pos < 0 || pos >= i128::from(len) {
            return Err(Error::Index { index, len });
        }
        self.nth_value(pos as u64).ok_or(Error::Index { index, len })
    }

    /// The values at the positions a Python-style slice `[start:stop:step]`
    /// selects, as a new bitmap.
    ///
    /// Negative bounds count from the end and out-of-range bounds are
    /// clamped. Negative steps walk backwards, which only changes which
    /// positions are picked since the result is a set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStep`] when `step` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let bitmap = Bitmap::try_from_iter(0u32..10).unwrap();
    /// assert_eq!(bitmap.slice(Some(2), Some(-2), Some(3)).unwrap().to_vec(), vec![2, 5]);
    /// assert_eq!(bitmap.slice(None, None, Some(-4)).unwrap().to_vec(), vec![1, 5, 9]);
    /// ```
    pub fn slice(&self, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Result<Self> {
        let step = step.unwrap_or(1);
        if step == 0 {
            return Err(Error::InvalidStep { step });
        }
        let len = self.len() as i64;
        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
        let clamp = |bound: Option<i64>, default: i64| match bound {
            None => default,
            Some(b) if b < 0 => (b + len).max(lower),
            Some(b) => b.min(upper),
        };
        let (first, last) = if step < 0 { (upper, lower) } else { (lower, upper) };
        let (start, stop) = (clamp(start, first), clamp(stop, last));

        let mut out = BitmapOptions::new()
            .copy_on_write(self.copy_on_write)
            .build();
        if step > 0 && start < stop {
            let count = (stop - start - 1) / step + 1;
            out.extend_sorted(
                self.iter()
                    .skip(start as usize)
                    .step_by(step as usize)
                    .take(count as usize),
            );
        } else if step < 0 && start > stop {
            let count = (start - stop - 1) / -step + 1;
            let mut picked: Vec<u32> = self
                .iter()
                .rev()
                .skip((len - 1 - start) as usize)
                .step_by(step.unsigned_abs() as usize)
                .take(count as usize)
                .collect();
            picked.reverse();
            out.extend_sorted(picked);
        }
        Ok(out)
    }

    /// Adds a run of values known to be ascending.
    pub(crate) fn extend_sorted(&mut self, values: impl IntoIterator<Item = u32>) {
        let mut idx = None;
        for value in values {
            let (key, low) = split!(value);
            let slot = match idx {
                Some(i) if self.dir.key_at(i) == key => i,
                _ => self.dir.get_or_create(key),
            };
            self.dir.container_at_mut(slot).add(low);
            idx = Some(slot);
        }
    }

    /// Splits `[start, end)` into per-chunk pieces `(key, beg, end)` with
    /// chunk-local bounds. `end` is clamped to `2^32`.
    fn chunks(start: u64, end: u64) -> impl Iterator<Item = (u16, u32, u32)> {
        let end = end.min(UNIVERSE);
        let (first_key, last_key) = if start < end {
            (start >> 16, (end - 1) >> 16)
        } else {
            (1, 0)
        };
        (first_key..=last_key).map(move |key| {
            let beg = if key == first_key { (start & 0xFFFF) as u32 } else { 0 };
            let stop = if key == last_key {
                ((end - 1) & 0xFFFF) as u32 + 1
            } else {
                CHUNK_SIZE
            };
            (key as u16, beg, stop)
        })
    }

    /// Complements `[start, end)` in place. Bounds past `2^32` are clamped and
    /// an empty range is a no-op.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let mut bitmap = Bitmap::try_from_iter([1u32, 3]).unwrap();
    /// bitmap.flip_inplace(0, 5);
    /// assert_eq!(bitmap.to_vec(), vec![0, 2, 4]);
    /// ```
    pub fn flip_inplace(&mut self, start: u64, end: u64) {
        for (key, beg, stop) in Self::chunks(start, end) {
            match self.dir.position(key) {
                Ok(idx) => {
                    self.dir.container_at_mut(idx).flip_range(beg, stop);
                    self.dir.remove_if_empty(idx);
                }
                Err(idx) => self.dir.insert(idx, key, Container::from_range(beg, stop)),
            }
        }
    }

    /// A copy of the bitmap with `[start, end)` complemented.
    #[must_use]
    pub fn flip(&self, start: u64, end: u64) -> Self {
        let mut out = self.clone();
        out.flip_inplace(start, end);
        out
    }

    /// Adds every value of `[start, end)`. Bounds past `2^32` are clamped.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add_range(65_530, 65_540);
    /// assert_eq!(bitmap.len(), 10);
    /// ```
    pub fn add_range(&mut self, start: u64, end: u64) {
        for (key, beg, stop) in Self::chunks(start, end) {
            match self.dir.position(key) {
                Ok(idx) => self.dir.container_at_mut(idx).add_range(beg, stop),
                Err(idx) => self.dir.insert(idx, key, Container::from_range(beg, stop)),
            }
        }
    }

    /// Removes every value of `[start, end)`. Bounds past `2^32` are clamped.
    pub fn remove_range(&mut self, start: u64, end: u64) {
        for (key, beg, stop) in Self::chunks(start, end) {
            if let Ok(idx) = self.dir.position(key) {
                self.dir.container_at_mut(idx).remove_range(beg, stop);
                self.dir.remove_if_empty(idx);
            }
        }
    }

    /// Converts every container to its cheapest representation. Run
    /// containers win ties.
    ///
    /// Returns whether any container changed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let mut bitmap = Bitmap::new();
    /// for v in 0..1000 {
    ///     bitmap.add(v);
    /// }
    /// assert!(bitmap.run_optimize());
    /// assert!(!bitmap.run_optimize());
    /// assert_eq!(bitmap.get_statistics().n_run_containers, 1);
    /// ```
    pub fn run_optimize(&mut self) -> bool {
        let (mut changed, mut to_run) = (0usize, 0usize);
        for idx in 0..self.dir.len() {
            let container = self.dir.container_at(idx);
            let best = container.best_kind();
            if best != container.kind() {
                to_run += usize::from(container.should_convert_to_run());
                self.dir.container_at_mut(idx).convert(best);
                changed += 1;
            }
        }
        debug!(changed, to_run, containers = self.dir.len(), "optimized container layout");
        changed > 0
    }

    /// Releases spare capacity. Returns the number of bytes freed; a second
    /// call returns 0.
    ///
    /// Containers shared with a copy-on-write clone are left alone.
    pub fn shrink_to_fit(&mut self) -> usize {
        let freed = self.dir.shrink_to_fit();
        debug!(freed, "released spare capacity");
        freed
    }

    /// Adds the values of every collection in `iterables`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if any value is outside of `[0, 2^32)`. The
    /// bitmap is left untouched in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let mut bitmap = Bitmap::new();
    /// bitmap.update([vec![1u32, 2], vec![100_000]]).unwrap();
    /// assert_eq!(bitmap.to_vec(), vec![1, 2, 100_000]);
    /// assert!(bitmap.update([vec![-1i64]]).is_err());
    /// assert_eq!(bitmap.len(), 3);
    /// ```
    pub fn update<I>(&mut self, iterables: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: IntoIterator,
        <I::Item as IntoIterator>::Item: Value,
    {
        let mut staged = Vec::new();
        for values in iterables {
            for value in values {
                staged.push(value.to_u32()?);
            }
        }
        staged.sort_unstable();
        self.extend_sorted(staged);
        Ok(())
    }

    /// Keeps only the values found in every collection of `iterables`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if any value is outside of `[0, 2^32)`. The
    /// bitmap is left untouched in that case.
    pub fn intersection_update<I>(&mut self, iterables: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: IntoIterator,
        <I::Item as IntoIterator>::Item: Value,
    {
        let options = BitmapOptions::new()
            .copy_on_write(self.copy_on_write)
            .optimize(false);
        let others = iterables
            .into_iter()
            .map(|values| options.collect(values))
            .collect::<Result<Vec<_>>>()?;
        for other in &others {
            self.intersection_inplace(other)?;
        }
        Ok(())
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::new()
    }
}
