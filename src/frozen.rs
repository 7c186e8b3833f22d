//! `FrozenBitmap`: an immutable, hashable bitmap.

use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    str::FromStr,
};

use crate::{
    Bitmap, BitmapOptions, Value,
    error::{Error, Result},
    iter::{IntoIter, Iter},
    traits::{fmt_values, impl_set_operators, parse_values},
};

/// A [`Bitmap`] that can no longer change.
///
/// Every read-only operation of [`Bitmap`] is available through `Deref`.
/// Mutating methods are simply not reachable, so attempts to modify a frozen
/// bitmap are rejected at compile time. Operations that produce a new bitmap
/// (`union`, `flip`, `slice`, ...) return a `FrozenBitmap` again, and both
/// kinds of bitmap can be mixed as operands.
///
/// Unlike [`Bitmap`], a frozen bitmap implements [`Hash`]. The hash depends
/// only on the stored values, never on the container layout.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use smol_roaring::{Bitmap, FrozenBitmap};
///
/// let frozen = FrozenBitmap::from_range(0, 100, 1).unwrap();
/// let mut incremental = Bitmap::new();
/// for v in 0..100 {
///     incremental.add(v);
/// }
/// let incremental = FrozenBitmap::from(incremental);
///
/// let mut seen = HashSet::new();
/// seen.insert(frozen);
/// assert!(seen.contains(&incremental));
/// ```
#[derive(Clone, Default)]
pub struct FrozenBitmap(Bitmap);

impl FrozenBitmap {
    /// An empty frozen bitmap.
    #[must_use]
    pub const fn new() -> Self {
        Self(Bitmap::new())
    }

    /// Builds an optimized frozen bitmap from any collection of integers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if a value is outside of `[0, 2^32)`.
    pub fn try_from_iter<I>(values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Value,
    {
        Bitmap::try_from_iter(values).map(Self)
    }

    /// Builds the frozen bitmap of `range(start, stop, step)`.
    ///
    /// # Errors
    ///
    /// See [`BitmapOptions::range`].
    pub fn from_range(start: i64, stop: i64, step: i64) -> Result<Self> {
        Bitmap::from_range(start, stop, step).map(Self)
    }

    /// Freezes a copy of `bitmap` built with `options`.
    #[must_use]
    pub fn from_bitmap(bitmap: &Bitmap, options: BitmapOptions) -> Self {
        Self(options.copy_of(bitmap))
    }

    /// Decodes a frozen bitmap produced by [`Bitmap::serialize`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if `bytes` is not a valid encoding.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        Bitmap::deserialize(bytes).map(Self)
    }

    /// A mutable copy of the bitmap.
    #[must_use]
    pub fn thaw(&self) -> Bitmap {
        self.0.clone()
    }

    /// Unwraps the underlying bitmap.
    #[must_use]
    pub fn into_inner(self) -> Bitmap {
        self.0
    }

    /// Values found in either bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn union(&self, other: &Bitmap) -> Result<Self> {
        self.0.union(other).map(Self)
    }

    /// Values found in both bitmaps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn intersection(&self, other: &Bitmap) -> Result<Self> {
        self.0.intersection(other).map(Self)
    }

    /// Values of `self` that are not in `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn difference(&self, other: &Bitmap) -> Result<Self> {
        self.0.difference(other).map(Self)
    }

    /// Values found in exactly one of the bitmaps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn symmetric_difference(&self, other: &Bitmap) -> Result<Self> {
        self.0.symmetric_difference(other).map(Self)
    }

    /// Union of any number of frozen bitmaps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the operands disagree on
    /// copy-on-write.
    pub fn union_all<'a, I>(bitmaps: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        Bitmap::union_all(bitmaps.into_iter().map(|b| &b.0)).map(Self)
    }

    /// Intersection of any number of frozen bitmaps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the operands disagree on
    /// copy-on-write.
    pub fn intersection_all<'a, I>(bitmaps: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        Bitmap::intersection_all(bitmaps.into_iter().map(|b| &b.0)).map(Self)
    }

    /// A copy with `[start, end)` complemented.
    #[must_use]
    pub fn flip(&self, start: u64, end: u64) -> Self {
        Self(self.0.flip(start, end))
    }

    /// See [`Bitmap::slice`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStep`] when `step` is zero.
    pub fn slice(&self, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Result<Self> {
        self.0.slice(start, stop, step).map(Self)
    }
}

impl Deref for FrozenBitmap {
    type Target = Bitmap;

    fn deref(&self) -> &Bitmap {
        &self.0
    }
}

impl AsRef<Bitmap> for FrozenBitmap {
    fn as_ref(&self) -> &Bitmap {
        &self.0
    }
}

impl From<Bitmap> for FrozenBitmap {
    fn from(bitmap: Bitmap) -> Self {
        Self(bitmap)
    }
}

impl From<FrozenBitmap> for Bitmap {
    fn from(frozen: FrozenBitmap) -> Self {
        frozen.0
    }
}

/// Hashes the maximal runs of consecutive values in ascending order, which
/// every layout of the same set produces identically.
impl Hash for FrozenBitmap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (key, container) in self.0.dir.iter() {
            container.for_each_run(|run| {
                key.hash(state);
                run.start.hash(state);
                run.end.hash(state);
            });
        }
        self.0.len().hash(state);
    }
}

impl PartialEq for FrozenBitmap {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for FrozenBitmap {}

impl PartialEq<Bitmap> for FrozenBitmap {
    fn eq(&self, other: &Bitmap) -> bool {
        self.0 == *other
    }
}

impl PartialEq<FrozenBitmap> for Bitmap {
    fn eq(&self, other: &FrozenBitmap) -> bool {
        *self == other.0
    }
}

impl PartialOrd for FrozenBitmap {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl fmt::Debug for FrozenBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_values("FrozenBitmap", self.0.iter(), f)
    }
}

impl fmt::Display for FrozenBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for FrozenBitmap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from_iter(parse_values(s)?)
    }
}

impl FromIterator<u32> for FrozenBitmap {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FrozenBitmap {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.0.iter()
    }
}

impl IntoIterator for FrozenBitmap {
    type Item = u32;
    type IntoIter = IntoIter;

    fn into_iter(self) -> IntoIter {
        self.0.into_iter()
    }
}

impl_set_operators!(FrozenBitmap);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerKind;
    use alloc::vec;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(bitmap: &FrozenBitmap) -> u64 {
        let mut hasher = DefaultHasher::new();
        bitmap.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_hash_ignores_layout() {
        let runs = FrozenBitmap::from_range(0, 100, 1).unwrap();
        let mut array = Bitmap::new();
        for v in 0..100 {
            array.add(v);
        }
        let array = FrozenBitmap::from_bitmap(&array, BitmapOptions::new().optimize(false));
        assert_eq!(runs.dir.container_at(0).kind(), ContainerKind::Run);
        assert_eq!(array.dir.container_at(0).kind(), ContainerKind::Array);
        assert_eq!(runs, array);
        assert_ne!(runs.get_statistics(), array.get_statistics());
        assert_eq!(hash_of(&runs), hash_of(&array));
    }

    #[test]
    fn test_hash_distinguishes_sets() {
        let a = FrozenBitmap::try_from_iter([1u32, 2, 3]).unwrap();
        let b = FrozenBitmap::try_from_iter([1u32, 2, 4]).unwrap();
        let c = FrozenBitmap::try_from_iter([1u32 << 16, 2, 3]).unwrap();
        assert_ne!(hash_of(&a), hash_of(&b));
        assert_ne!(hash_of(&a), hash_of(&c));
        assert_eq!(hash_of(&a), hash_of(&a.clone()));
    }

    #[test]
    fn test_operations_keep_the_frozen_type() {
        let a = FrozenBitmap::try_from_iter([1u32, 2, 3, 100_000]).unwrap();
        let b = Bitmap::try_from_iter([3u32, 100_000, 100_001]).unwrap();
        let union: FrozenBitmap = a.union(&b).unwrap();
        assert_eq!(union.to_vec(), vec![1, 2, 3, 100_000, 100_001]);
        let mixed: Bitmap = b.union(&a).unwrap();
        assert_eq!(mixed, union);
        let flipped: FrozenBitmap = a.flip(0, 4);
        assert_eq!(flipped.to_vec(), vec![0, 100_000]);
        let sliced: FrozenBitmap = a.slice(Some(1), None, None).unwrap();
        assert_eq!(sliced.to_vec(), vec![2, 3, 100_000]);
        let frozen_b = FrozenBitmap::from(b);
        assert_eq!((&a & &frozen_b).unwrap().to_vec(), vec![3, 100_000]);
        assert_eq!(
            FrozenBitmap::union_all([&a, &frozen_b]).unwrap().len(),
            5
        );
    }

    #[test]
    fn test_frozen_formatting() {
        let a: FrozenBitmap = "[4, 2]".parse().unwrap();
        assert_eq!(alloc::format!("{a}"), "FrozenBitmap([2, 4])");
        assert_eq!("x".parse::<FrozenBitmap>().unwrap_err(), Error::Type { token: "x".into() });
    }

    #[test]
    fn test_thaw_is_independent() {
        let frozen = FrozenBitmap::try_from_iter([1u32]).unwrap();
        let mut thawed = frozen.thaw();
        thawed.add(2);
        assert_eq!(frozen.len(), 1);
        assert_eq!(thawed.len(), 2);
    }
}
