//! Trait implementations for `Bitmap`.

use alloc::vec::Vec;
use core::{cmp::Ordering, fmt, str::FromStr};

use crate::{
    Bitmap, BitmapOptions,
    error::{Error, Result},
    iter::{IntoIter, Iter},
};

/// Integer types that can be checked into the `u32` domain of a bitmap.
///
/// Implemented for every primitive integer type and for references to them,
/// so constructors accept `Vec<i64>`, `&[u32]`, ranges and so on.
///
/// # Examples
///
/// ```
/// use smol_roaring::{Error, Value};
///
/// assert_eq!(7u8.to_u32(), Ok(7));
/// assert_eq!((-1i32).to_u32(), Err(Error::Range { value: -1 }));
/// assert_eq!((1u64 << 32).to_u32(), Err(Error::Range { value: 1 << 32 }));
/// ```
pub trait Value: Copy {
    /// Converts to `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] when the value is outside of `[0, 2^32)`.
    fn to_u32(self) -> Result<u32>;
}

macro_rules! impl_value {
    ($($ty:ty),* $(,)?) => {$(
        impl Value for $ty {
            #[inline]
            fn to_u32(self) -> Result<u32> {
                u32::try_from(self).map_err(|_| Error::Range {
                    value: i128::try_from(self).unwrap_or(i128::MAX),
                })
            }
        }
    )*};
}

impl_value!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl<T: Value> Value for &T {
    #[inline]
    fn to_u32(self) -> Result<u32> {
        (*self).to_u32()
    }
}

impl Clone for Bitmap {
    /// Copy-on-write bitmaps share their containers with the clone; other
    /// bitmaps are copied container by container.
    fn clone(&self) -> Self {
        Self {
            dir: if self.copy_on_write {
                self.dir.share()
            } else {
                self.dir.deep_copy()
            },
            copy_on_write: self.copy_on_write,
        }
    }
}

/// Equality of the stored values. The copy-on-write flag and the container
/// layouts are ignored; see [`Bitmap::try_eq`] for the checked form.
impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.dir.eq_values(&other.dir)
    }
}

impl Eq for Bitmap {}

/// Subset order: `a < b` means `a` is a proper subset of `b`. Bitmaps where
/// neither contains the other are unordered.
impl PartialOrd for Bitmap {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.dir.is_subset(&other.dir), other.dir.is_subset(&self.dir)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

/// Writes `Name([v1, v2, ...])`.
pub(crate) fn fmt_values(name: &str, values: Iter<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(name)?;
    f.write_str("(")?;
    f.debug_list().entries(values).finish()?;
    f.write_str(")")
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_values("Bitmap", self.iter(), f)
    }
}

impl fmt::Display for Bitmap {
    /// Formats the bitmap as `Bitmap([1, 2, 3])`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let bitmap = Bitmap::try_from_iter([3u32, 1, 2]).unwrap();
    /// assert_eq!(bitmap.to_string(), "Bitmap([1, 2, 3])");
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Parses comma-separated integers, with or without surrounding brackets and
/// an optional `Name(...)` wrapper.
pub(crate) fn parse_values(s: &str) -> Result<Vec<u32>> {
    let mut body = s.trim();
    if let Some(open) = body.find('(')
        && body.ends_with(')')
        && body[..open].chars().all(char::is_alphanumeric)
    {
        body = body[open + 1..body.len() - 1].trim();
    }
    let body = body
        .strip_prefix('[')
        .and_then(|b| b.strip_suffix(']'))
        .unwrap_or(body);
    body.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<i128>()
                .map_err(|_| Error::Type {
                    token: token.into(),
                })
                .and_then(Value::to_u32)
        })
        .collect()
}

impl FromStr for Bitmap {
    type Err = Error;

    /// Parses a list of integers such as `"1, 2, 3"`, `"[1, 2, 3]"` or the
    /// output of [`Display`](fmt::Display).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Type`] for a token that is not an integer and
    /// [`Error::Range`] for an integer outside of `[0, 2^32)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use smol_roaring::{Bitmap, Error};
    ///
    /// let bitmap: Bitmap = "[1, 2, 3]".parse()?;
    /// assert_eq!(bitmap.to_vec(), vec![1, 2, 3]);
    /// assert_eq!(bitmap.to_string().parse::<Bitmap>()?, bitmap);
    ///
    /// let err = "1, 2, bla".parse::<Bitmap>().unwrap_err();
    /// assert_eq!(err, Error::Type { token: "bla".into() });
    /// # Ok::<(), Error>(())
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        Self::try_from_iter(parse_values(s)?)
    }
}

impl FromIterator<u32> for Bitmap {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut values: Vec<u32> = iter.into_iter().collect();
        values.sort_unstable();
        let options = BitmapOptions::new();
        let mut bitmap = options.build();
        bitmap.extend_sorted(values);
        options.finish(bitmap)
    }
}

impl<'a> FromIterator<&'a u32> for Bitmap {
    fn from_iter<I: IntoIterator<Item = &'a u32>>(iter: I) -> Self {
        iter.into_iter().copied().collect()
    }
}

impl Extend<u32> for Bitmap {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        let mut values: Vec<u32> = iter.into_iter().collect();
        values.sort_unstable();
        self.extend_sorted(values);
    }
}

impl<'a> Extend<&'a u32> for Bitmap {
    fn extend<I: IntoIterator<Item = &'a u32>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<'a> IntoIterator for &'a Bitmap {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl IntoIterator for Bitmap {
    type Item = u32;
    type IntoIter = IntoIter;

    fn into_iter(self) -> IntoIter {
        IntoIter::new(self.dir)
    }
}

/// Operator forms of the binary set operations. They return a `Result`
/// because operands that disagree on copy-on-write cannot be combined.
macro_rules! impl_set_operators {
    ($ty:ty) => {
        impl core::ops::BitOr for &$ty {
            type Output = $crate::Result<$ty>;

            fn bitor(self, rhs: Self) -> Self::Output {
                self.union(rhs)
            }
        }

        impl core::ops::BitAnd for &$ty {
            type Output = $crate::Result<$ty>;

            fn bitand(self, rhs: Self) -> Self::Output {
                self.intersection(rhs)
            }
        }

        impl core::ops::BitXor for &$ty {
            type Output = $crate::Result<$ty>;

            fn bitxor(self, rhs: Self) -> Self::Output {
                self.symmetric_difference(rhs)
            }
        }

        impl core::ops::Sub for &$ty {
            type Output = $crate::Result<$ty>;

            fn sub(self, rhs: Self) -> Self::Output {
                self.difference(rhs)
            }
        }
    };
}

pub(crate) use impl_set_operators;

impl_set_operators!(Bitmap);
