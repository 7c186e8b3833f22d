//! Serde implementations for `Bitmap` and `FrozenBitmap`.
//!
//! By default both types serialize as an ascending sequence of `u32` and
//! deserialize from a sequence of integers in any order. The modules below
//! can be used with `#[serde(with = "...")]` to pick another representation.

use crate::{Bitmap, BitmapOptions, FrozenBitmap};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, SeqAccess, Visitor},
    ser::SerializeSeq,
};

/// Serializing a bitmap as a strictly ascending sequence of integers.
pub mod sorted_set {
    use super::*;

    /// Serialize the bitmap as an ascending sequence of `u32`.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails to serialize the sequence.
    pub fn serialize<S>(b: &Bitmap, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = usize::try_from(b.len()).ok();
        let mut ser = serializer.serialize_seq(len)?;
        for value in b {
            ser.serialize_element(&value)?;
        }
        ser.end()
    }

    /// Deserialize a bitmap from a strictly ascending sequence of `u32`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequence is not strictly ascending or an
    /// element is not a `u32`.
    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: From<Bitmap>,
    {
        struct SortedVisitor;

        impl<'de> Visitor<'de> for SortedVisitor {
            type Value = Bitmap;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a strictly ascending sequence of u32")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let options = BitmapOptions::new();
                let mut bitmap = options.build();
                let mut last = None;
                while let Some(value) = seq.next_element::<u32>()? {
                    if let Some(last) = last
                        && last >= value
                    {
                        return Err(de::Error::invalid_value(
                            de::Unexpected::Unsigned(u64::from(value)),
                            &"strictly ascending sequence",
                        ));
                    }
                    last = Some(value);
                    bitmap.extend_sorted([value]);
                }
                Ok(options.finish(bitmap))
            }
        }

        deserializer.deserialize_seq(SortedVisitor).map(T::from)
    }
}

/// Serializing a bitmap as a sequence of integers in any order.
pub mod unordered_set {
    use super::*;
    use alloc::vec::Vec;

    /// Serialize the bitmap as an ascending sequence of `u32`.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails to serialize the sequence.
    pub fn serialize<S>(b: &Bitmap, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        sorted_set::serialize(b, serializer)
    }

    /// Deserialize a bitmap from a sequence of `u32`, in any order and with
    /// duplicates allowed.
    ///
    /// # Errors
    ///
    /// Returns an error if an element is not a `u32`.
    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: From<Bitmap>,
    {
        struct UnorderedVisitor;

        impl<'de> Visitor<'de> for UnorderedVisitor {
            type Value = Bitmap;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a sequence of u32")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
                while let Some(value) = seq.next_element::<u32>()? {
                    values.push(value);
                }
                Ok(values.into_iter().collect())
            }
        }

        deserializer.deserialize_seq(UnorderedVisitor).map(T::from)
    }
}

/// Serializing a bitmap in its binary encoding (see
/// [`Bitmap::serialize`]).
///
/// Human-readable formats get the bytes as a base64 string, other formats
/// as a byte array.
pub mod bytes {
    use super::*;

    /// Serialize the binary encoding of the bitmap.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails to serialize the bytes.
    pub fn serialize<S>(b: &Bitmap, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = b.serialize();
        if serializer.is_human_readable() {
            serializer.serialize_str(&data_encoding::BASE64.encode(&bytes))
        } else {
            serializer.serialize_bytes(&bytes)
        }
    }

    /// Deserialize a bitmap from its binary encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid base64 (for
    /// human-readable formats) or not a valid encoded bitmap.
    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: From<Bitmap>,
    {
        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = Bitmap;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("an encoded bitmap")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let decoded = data_encoding::BASE64
                    .decode(v.as_bytes())
                    .map_err(E::custom)?;
                self.visit_bytes(&decoded)
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Bitmap::deserialize(v).map_err(E::custom)
            }
        }

        let bitmap = if deserializer.is_human_readable() {
            deserializer.deserialize_str(BytesVisitor)?
        } else {
            deserializer.deserialize_bytes(BytesVisitor)?
        };
        Ok(T::from(bitmap))
    }
}

impl Serialize for Bitmap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        sorted_set::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Bitmap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        unordered_set::deserialize(deserializer)
    }
}

impl Serialize for FrozenBitmap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        sorted_set::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for FrozenBitmap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        unordered_set::deserialize(deserializer)
    }
}
