//! Implementations of set operations for `Bitmap`.

use alloc::vec::Vec;

use tracing::trace;

use crate::{
    Bitmap,
    container::SetOp,
    error::{Error, Result},
};

impl Bitmap {
    /// Fails with [`Error::Incompatible`] unless both bitmaps agree on
    /// copy-on-write.
    #[inline]
    pub(crate) fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.copy_on_write == other.copy_on_write {
            Ok(())
        } else {
            Err(Error::Incompatible)
        }
    }

    fn binary_op(&self, other: &Self, op: SetOp) -> Result<Self> {
        self.check_compatible(other)?;
        trace!(?op, left = self.dir.len(), right = other.dir.len(), "combining bitmaps");
        Ok(Self {
            dir: self.dir.binary_op(&other.dir, op, self.copy_on_write),
            copy_on_write: self.copy_on_write,
        })
    }

    fn binary_op_inplace(&mut self, other: &Self, op: SetOp) -> Result<()> {
        self.check_compatible(other)?;
        trace!(?op, left = self.dir.len(), right = other.dir.len(), "combining bitmaps in place");
        self.dir.binary_op_inplace(&other.dir, op, self.copy_on_write);
        Ok(())
    }

    /// Values found in either bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let a = Bitmap::try_from_iter([1u32, 2, 3, 100_000]).unwrap();
    /// let b = Bitmap::try_from_iter([3u32, 100_000, 100_001]).unwrap();
    /// assert_eq!(a.union(&b).unwrap().to_vec(), vec![1, 2, 3, 100_000, 100_001]);
    /// ```
    pub fn union(&self, other: &Self) -> Result<Self> {
        self.binary_op(other, SetOp::Union)
    }

    /// Values found in both bitmaps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn intersection(&self, other: &Self) -> Result<Self> {
        self.binary_op(other, SetOp::Intersection)
    }

    /// Values of `self` that are not in `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let a = Bitmap::try_from_iter([1u32, 2, 3, 100_000]).unwrap();
    /// let b = Bitmap::try_from_iter([3u32, 100_000, 100_001]).unwrap();
    /// assert_eq!(a.difference(&b).unwrap().to_vec(), vec![1, 2]);
    /// ```
    pub fn difference(&self, other: &Self) -> Result<Self> {
        self.binary_op(other, SetOp::Difference)
    }

    /// Values found in exactly one of the bitmaps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn symmetric_difference(&self, other: &Self) -> Result<Self> {
        self.binary_op(other, SetOp::SymmetricDifference)
    }

    /// Adds every value of `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ;
    /// `self` is unchanged in that case.
    pub fn union_inplace(&mut self, other: &Self) -> Result<()> {
        self.binary_op_inplace(other, SetOp::Union)
    }

    /// Keeps only the values also found in `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ;
    /// `self` is unchanged in that case.
    pub fn intersection_inplace(&mut self, other: &Self) -> Result<()> {
        self.binary_op_inplace(other, SetOp::Intersection)
    }

    /// Removes every value found in `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ;
    /// `self` is unchanged in that case.
    pub fn difference_inplace(&mut self, other: &Self) -> Result<()> {
        self.binary_op_inplace(other, SetOp::Difference)
    }

    /// Toggles every value found in `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ;
    /// `self` is unchanged in that case.
    pub fn symmetric_difference_inplace(&mut self, other: &Self) -> Result<()> {
        self.binary_op_inplace(other, SetOp::SymmetricDifference)
    }

    /// Collects the operands of an n-ary operation and checks that they all
    /// agree on copy-on-write.
    fn operands<'a, I>(bitmaps: I) -> Result<Vec<&'a Self>>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let operands: Vec<&Self> = bitmaps.into_iter().collect();
        if let Some((first, rest)) = operands.split_first() {
            for other in rest {
                first.check_compatible(other)?;
            }
        }
        Ok(operands)
    }

    /// Union of any number of bitmaps. No operand gives an empty bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the operands disagree on
    /// copy-on-write.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let a = Bitmap::try_from_iter([1u32]).unwrap();
    /// let b = Bitmap::try_from_iter([2u32]).unwrap();
    /// let c = Bitmap::try_from_iter([3u32]).unwrap();
    /// assert_eq!(Bitmap::union_all([&a, &b, &c]).unwrap().to_vec(), vec![1, 2, 3]);
    /// ```
    pub fn union_all<'a, I>(bitmaps: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let operands = Self::operands(bitmaps)?;
        let Some((first, rest)) = operands.split_first() else {
            return Ok(Self::new());
        };
        let mut out = (*first).clone();
        for other in rest {
            out.dir.binary_op_inplace(&other.dir, SetOp::Union, out.copy_on_write);
        }
        Ok(out)
    }

    /// Intersection of any number of bitmaps. No operand gives an empty
    /// bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the operands disagree on
    /// copy-on-write.
    pub fn intersection_all<'a, I>(bitmaps: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let operands = Self::operands(bitmaps)?;
        let Some((first, rest)) = operands.split_first() else {
            return Ok(Self::new());
        };
        let mut out = (*first).clone();
        for other in rest {
            if out.is_empty() {
                break;
            }
            out.dir
                .binary_op_inplace(&other.dir, SetOp::Intersection, out.copy_on_write);
        }
        Ok(out)
    }

    /// `|self ∩ other|`, computed without building the intersection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn intersection_cardinality(&self, other: &Self) -> Result<u64> {
        self.check_compatible(other)?;
        Ok(self.dir.intersection_len(&other.dir))
    }

    /// `|self ∪ other|`, computed without building the union.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn union_cardinality(&self, other: &Self) -> Result<u64> {
        let common = self.intersection_cardinality(other)?;
        Ok(self.len() + other.len() - common)
    }

    /// `|self - other|`, computed without building the difference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn difference_cardinality(&self, other: &Self) -> Result<u64> {
        let common = self.intersection_cardinality(other)?;
        Ok(self.len() - common)
    }

    /// `|self ^ other|`, computed without building the symmetric difference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn symmetric_difference_cardinality(&self, other: &Self) -> Result<u64> {
        let common = self.intersection_cardinality(other)?;
        Ok(self.len() + other.len() - 2 * common)
    }

    /// `|self ∩ other| / |self ∪ other|`. Two empty bitmaps give 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let a = Bitmap::try_from_iter([1u32, 2, 3, 100_000]).unwrap();
    /// let b = Bitmap::try_from_iter([3u32, 100_000, 100_001]).unwrap();
    /// assert_eq!(a.jaccard_index(&b).unwrap(), 0.4);
    /// assert_eq!(Bitmap::new().jaccard_index(&Bitmap::new()).unwrap(), 0.0);
    /// ```
    pub fn jaccard_index(&self, other: &Self) -> Result<f64> {
        let common = self.intersection_cardinality(other)?;
        let union = (self.len() + other.len() - common).max(1);
        Ok(common as f64 / union as f64)
    }

    /// Whether the bitmaps share at least one value. Stops at the first
    /// common value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn intersect(&self, other: &Self) -> Result<bool> {
        self.check_compatible(other)?;
        Ok(self.dir.intersects(&other.dir))
    }

    /// Whether both bitmaps hold the same values.
    ///
    /// Unlike `==`, which only looks at the values, this refuses to compare
    /// bitmaps that disagree on copy-on-write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn try_eq(&self, other: &Self) -> Result<bool> {
        self.check_compatible(other)?;
        Ok(self.dir.eq_values(&other.dir))
    }

    /// Whether every value of `self` is in `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn is_subset(&self, other: &Self) -> Result<bool> {
        self.check_compatible(other)?;
        Ok(self.dir.is_subset(&other.dir))
    }

    /// Whether every value of `other` is in `self`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn is_superset(&self, other: &Self) -> Result<bool> {
        other.is_subset(self)
    }

    /// Whether `self` is a subset of `other` and smaller than it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn is_proper_subset(&self, other: &Self) -> Result<bool> {
        Ok(self.is_subset(other)? && self.len() < other.len())
    }

    /// Whether `self` is a superset of `other` and larger than it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the copy-on-write flags differ.
    pub fn is_proper_superset(&self, other: &Self) -> Result<bool> {
        other.is_proper_subset(self)
    }
}
