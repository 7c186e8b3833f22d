//! Binary encoding of a bitmap.
//!
//! ```text
//! [Magic "SRB1": 4 bytes] [Key count: u32]
//! per key, ascending:
//!   [Key: u16] [Tag: u8]
//!   tag 1, array:  [Count: u16] [Count x u16, strictly increasing]
//!   tag 2, bitset: [1024 x u64]
//!   tag 3, runs:   [Run count: u16] [Run count x (start: u16, length - 1: u16)]
//! ```
//!
//! All integers are little-endian. Decoding restores the exact container
//! variant of every key, so a decoded bitmap has the same
//! [statistics](crate::Bitmap::get_statistics) as the one that was encoded.

use alloc::{boxed::Box, vec::Vec};

use tracing::{debug, warn};

use crate::{
    Bitmap,
    container::{
        ARRAY_MAX, ArrayContainer, BITSET_BYTES, BITSET_WORDS, BitsetContainer, Container, Run,
        RunContainer,
    },
    error::{FormatError, Result},
    storage::Directory,
};

const MAGIC: [u8; 4] = *b"SRB1";
const HEADER_SIZE: usize = 8;
/// Key and tag in front of every payload.
const ENTRY_HEADER_SIZE: usize = 3;

const TAG_ARRAY: u8 = 1;
const TAG_BITSET: u8 = 2;
const TAG_RUN: u8 = 3;

fn payload_size(container: &Container) -> usize {
    match container {
        Container::Array(array) => 2 + 2 * array.len() as usize,
        Container::Bitset(_) => BITSET_BYTES,
        Container::Run(runs) => 2 + 4 * runs.n_runs(),
    }
}

impl Bitmap {
    /// Number of bytes [`serialize`](Self::serialize) produces.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let bitmap = Bitmap::from_range(0, 1000, 1).unwrap();
    /// assert_eq!(bitmap.serialized_size(), bitmap.serialize().len());
    /// ```
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        HEADER_SIZE
            + self
                .dir
                .iter()
                .map(|(_, c)| ENTRY_HEADER_SIZE + payload_size(c))
                .sum::<usize>()
    }

    /// Encodes the bitmap into a new buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use smol_roaring::Bitmap;
    ///
    /// let bitmap = Bitmap::try_from_iter([1u32, 5, 1 << 20]).unwrap();
    /// let bytes = bitmap.serialize();
    /// assert_eq!(Bitmap::deserialize(&bytes).unwrap(), bitmap);
    /// ```
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_size());
        self.serialize_into(&mut out);
        out
    }

    /// Appends the encoding of the bitmap to `out`.
    pub fn serialize_into(&self, out: &mut Vec<u8>) {
        out.reserve(self.serialized_size());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&(self.dir.len() as u32).to_le_bytes());
        for (key, container) in self.dir.iter() {
            out.extend_from_slice(&key.to_le_bytes());
            match container {
                Container::Array(array) => {
                    out.push(TAG_ARRAY);
                    out.extend_from_slice(&(array.len() as u16).to_le_bytes());
                    for low in array.as_slice() {
                        out.extend_from_slice(&low.to_le_bytes());
                    }
                }
                Container::Bitset(bitset) => {
                    out.push(TAG_BITSET);
                    for word in bitset.words() {
                        out.extend_from_slice(&word.to_le_bytes());
                    }
                }
                Container::Run(runs) => {
                    out.push(TAG_RUN);
                    out.extend_from_slice(&(runs.n_runs() as u16).to_le_bytes());
                    for run in runs.runs() {
                        out.extend_from_slice(&run.start.to_le_bytes());
                        out.extend_from_slice(&(run.end - run.start).to_le_bytes());
                    }
                }
            }
        }
    }

    /// Decodes a bitmap produced by [`serialize`](Self::serialize).
    ///
    /// The result does not use copy-on-write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`](crate::Error::Format) when the magic is
    /// wrong, the buffer is truncated or has trailing bytes, a tag is
    /// unknown, keys or array values are out of order, a container is empty
    /// or too long, or runs overlap, touch or overflow their chunk.
    #[tracing::instrument(level = "debug", skip(bytes), fields(len = bytes.len()))]
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        match decode(bytes) {
            Ok(dir) => {
                debug!(containers = dir.len(), "decoded bitmap");
                Ok(Self {
                    dir,
                    copy_on_write: false,
                })
            }
            Err(err) => {
                warn!(%err, "rejected serialized bitmap");
                Err(err.into())
            }
        }
    }
}

/// Cursor over the input that reports where it ran out.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    const fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < n {
            return Err(FormatError::Truncated {
                offset: self.offset,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, FormatError> {
        self.array::<1>().map(|[b]| b)
    }

    fn u16(&mut self) -> Result<u16, FormatError> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32, FormatError> {
        self.array().map(u32::from_le_bytes)
    }
}

fn decode(bytes: &[u8]) -> Result<Directory, FormatError> {
    let mut reader = Reader::new(bytes);
    if reader.array::<4>()? != MAGIC {
        return Err(FormatError::BadMagic);
    }
    let n_keys = reader.u32()?;
    let mut dir = Directory::new();
    let mut prev: Option<u16> = None;
    for _ in 0..n_keys {
        let key = reader.u16()?;
        if prev.is_some_and(|prev| prev >= key) {
            return Err(FormatError::UnsortedKeys { key });
        }
        let container = match reader.u8()? {
            TAG_ARRAY => read_array(&mut reader, key)?,
            TAG_BITSET => read_bitset(&mut reader, key)?,
            TAG_RUN => read_runs(&mut reader, key)?,
            tag => return Err(FormatError::UnknownTag { key, tag }),
        };
        dir.push(key, container);
        prev = Some(key);
    }
    match reader.remaining() {
        0 => Ok(dir),
        remaining => Err(FormatError::TrailingBytes { remaining }),
    }
}

fn read_array(reader: &mut Reader<'_>, key: u16) -> Result<Container, FormatError> {
    let count = usize::from(reader.u16()?);
    if count == 0 || count > ARRAY_MAX {
        return Err(FormatError::CorruptContainer { key });
    }
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let low = reader.u16()?;
        if values.last().is_some_and(|&last| last >= low) {
            return Err(FormatError::CorruptContainer { key });
        }
        values.push(low);
    }
    Ok(Container::Array(ArrayContainer::from_sorted(values)))
}

fn read_bitset(reader: &mut Reader<'_>, key: u16) -> Result<Container, FormatError> {
    let payload = reader.take(BITSET_BYTES)?;
    let mut words = Box::new([0u64; BITSET_WORDS]);
    for (word, bytes) in words.iter_mut().zip(payload.chunks_exact(8)) {
        let mut buf = [0; 8];
        buf.copy_from_slice(bytes);
        *word = u64::from_le_bytes(buf);
    }
    let bitset = BitsetContainer::from_words(words);
    if bitset.len() == 0 {
        return Err(FormatError::CorruptContainer { key });
    }
    Ok(Container::Bitset(bitset))
}

fn read_runs(reader: &mut Reader<'_>, key: u16) -> Result<Container, FormatError> {
    let n_runs = usize::from(reader.u16()?);
    if n_runs == 0 {
        return Err(FormatError::CorruptContainer { key });
    }
    let mut runs: Vec<Run> = Vec::with_capacity(n_runs);
    for _ in 0..n_runs {
        let start = reader.u16()?;
        let length = reader.u16()?;
        let end = start
            .checked_add(length)
            .ok_or(FormatError::CorruptContainer { key })?;
        // Runs must be separated by at least one missing value.
        if runs
            .last()
            .is_some_and(|last| u32::from(last.end) + 1 >= u32::from(start))
        {
            return Err(FormatError::CorruptContainer { key });
        }
        runs.push(Run::new(start, end));
    }
    Ok(Container::Run(RunContainer::from_runs(runs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, container::ContainerKind};
    use alloc::vec;

    fn kinds(bitmap: &Bitmap) -> Vec<ContainerKind> {
        bitmap.dir.iter().map(|(_, c)| c.kind()).collect()
    }

    /// One container of each variant.
    fn mixed() -> Bitmap {
        let mut bitmap = Bitmap::try_from_iter([1u32, 7, 300]).unwrap();
        bitmap.extend((1u32 << 16..(1 << 16) + 20_000).step_by(2));
        bitmap.add_range(2 << 16, (2 << 16) + 50_000);
        bitmap
    }

    fn header(n_keys: u32) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&n_keys.to_le_bytes());
        bytes
    }

    fn format_error(bytes: &[u8]) -> FormatError {
        match Bitmap::deserialize(bytes) {
            Err(Error::Format(err)) => err,
            other => panic!("expected a format error, got {other:?}"),
        }
    }

    #[test]
    fn test_roundtrip_keeps_variants() {
        let bitmap = mixed();
        assert_eq!(
            kinds(&bitmap),
            vec![ContainerKind::Array, ContainerKind::Bitset, ContainerKind::Run]
        );
        let bytes = bitmap.serialize();
        assert_eq!(bytes.len(), bitmap.serialized_size());
        let decoded = Bitmap::deserialize(&bytes).unwrap();
        assert_eq!(decoded, bitmap);
        assert_eq!(kinds(&decoded), kinds(&bitmap));
        assert_eq!(decoded.get_statistics(), bitmap.get_statistics());
        assert!(!decoded.is_copy_on_write());
    }

    #[test]
    fn test_empty_bitmap() {
        let bytes = Bitmap::new().serialize();
        assert_eq!(bytes, header(0));
        assert!(Bitmap::deserialize(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_layout_is_little_endian() {
        let bitmap = Bitmap::try_from_iter([0x0001_0002u32, 0x0001_0005]).unwrap();
        let mut expected = header(1);
        expected.extend_from_slice(&[1, 0, TAG_ARRAY, 2, 0, 2, 0, 5, 0]);
        assert_eq!(bitmap.serialize(), expected);

        let runs = Bitmap::from_range(10, 20, 1).unwrap();
        let mut expected = header(1);
        expected.extend_from_slice(&[0, 0, TAG_RUN, 1, 0, 10, 0, 9, 0]);
        assert_eq!(runs.serialize(), expected);
    }

    #[test]
    fn test_serialize_into_appends() {
        let bitmap = mixed();
        let mut out = vec![0xAA];
        bitmap.serialize_into(&mut out);
        assert_eq!(out[0], 0xAA);
        assert_eq!(&out[1..], bitmap.serialize().as_slice());
    }

    #[test]
    fn test_rejects_bad_magic_and_truncation() {
        assert_eq!(format_error(b"SRB2\0\0\0\0"), FormatError::BadMagic);
        assert_eq!(format_error(b"SR"), FormatError::Truncated { offset: 0 });
        let bytes = mixed().serialize();
        for cut in [5, HEADER_SIZE + 1, HEADER_SIZE + 4, bytes.len() - 1] {
            assert!(matches!(
                format_error(&bytes[..cut]),
                FormatError::Truncated { .. }
            ));
        }
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = mixed().serialize();
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(format_error(&bytes), FormatError::TrailingBytes { remaining: 2 });
    }

    #[test]
    fn test_rejects_unknown_tag_and_unsorted_keys() {
        let mut bytes = header(1);
        bytes.extend_from_slice(&[4, 0, 9]);
        assert_eq!(format_error(&bytes), FormatError::UnknownTag { key: 4, tag: 9 });

        let mut bytes = header(2);
        bytes.extend_from_slice(&[3, 0, TAG_ARRAY, 1, 0, 1, 0]);
        bytes.extend_from_slice(&[3, 0, TAG_ARRAY, 1, 0, 2, 0]);
        assert_eq!(format_error(&bytes), FormatError::UnsortedKeys { key: 3 });
    }

    #[test]
    fn test_rejects_corrupt_arrays() {
        let corrupt = FormatError::CorruptContainer { key: 0 };

        let mut empty = header(1);
        empty.extend_from_slice(&[0, 0, TAG_ARRAY, 0, 0]);
        assert_eq!(format_error(&empty), corrupt);

        let mut unsorted = header(1);
        unsorted.extend_from_slice(&[0, 0, TAG_ARRAY, 2, 0, 5, 0, 5, 0]);
        assert_eq!(format_error(&unsorted), corrupt);

        let mut too_long = header(1);
        too_long.extend_from_slice(&[0, 0, TAG_ARRAY]);
        too_long.extend_from_slice(&4097u16.to_le_bytes());
        for v in 0..4097u16 {
            too_long.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(format_error(&too_long), corrupt);
    }

    #[test]
    fn test_rejects_empty_bitset() {
        let mut bytes = header(1);
        bytes.extend_from_slice(&[0, 0, TAG_BITSET]);
        bytes.extend_from_slice(&[0; BITSET_BYTES]);
        assert_eq!(format_error(&bytes), FormatError::CorruptContainer { key: 0 });
    }

    #[test]
    fn test_rejects_corrupt_runs() {
        let corrupt = FormatError::CorruptContainer { key: 0 };
        let runs = |pairs: &[(u16, u16)]| {
            let mut bytes = header(1);
            bytes.extend_from_slice(&[0, 0, TAG_RUN]);
            bytes.extend_from_slice(&(pairs.len() as u16).to_le_bytes());
            for (start, length) in pairs {
                bytes.extend_from_slice(&start.to_le_bytes());
                bytes.extend_from_slice(&length.to_le_bytes());
            }
            bytes
        };
        assert_eq!(format_error(&runs(&[])), corrupt);
        assert_eq!(format_error(&runs(&[(65_000, 600)])), corrupt);
        assert_eq!(format_error(&runs(&[(0, 9), (5, 1)])), corrupt);
        assert_eq!(format_error(&runs(&[(0, 9), (10, 1)])), corrupt);
        let ok = Bitmap::deserialize(&runs(&[(0, 9), (11, 1), (65_535, 0)])).unwrap();
        assert_eq!(ok.len(), 13);
        assert_eq!(ok.max().unwrap(), 65_535);
    }
}
