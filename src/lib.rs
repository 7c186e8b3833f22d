//! A compressed bitmap of `u32` values in the style of Roaring bitmaps.
//!
//! This crate provides [`Bitmap`], a set of 32-bit unsigned integers that
//! splits the value space into chunks of 2^16 values and stores every
//! non-empty chunk in whichever of three containers suits it best:
//!
//! - **Array**: a sorted list of up to 4096 values
//! - **Bitset**: 1024 words, one bit per value of the chunk
//! - **Run**: a list of ranges of consecutive values
//!
//! Sparse, dense and clustered data all stay compact, and the set operations
//! work container by container without ever decompressing the whole bitmap.
//!
//! # Features
//!
//! - **Full set algebra**: union, intersection, difference and symmetric
//!   difference, in place or not, binary or n-ary
//! - **Order statistics**: `rank`, `select`, `min`, `max` and slicing
//! - **Range operations**: add, remove or flip whole ranges at once
//! - **Copy-on-write**: clones can share containers until one side writes
//! - **Immutable, hashable bitmaps** with [`FrozenBitmap`]
//! - **Binary encoding** via [`Bitmap::serialize`] and [`Bitmap::deserialize`]
//! - **Serialization support** via serde (optional)
//! - **`no_std` support** with `alloc`
//!
//! # Examples
//!
//! ```
//! use smol_roaring::Bitmap;
//!
//! let mut bitmap = Bitmap::try_from_iter([1u32, 2, 3, 100_000])?;
//! bitmap.add(7);
//! bitmap.add_range(1 << 20, (1 << 20) + 1000);
//!
//! assert!(bitmap.contains(7));
//! assert_eq!(bitmap.len(), 1005);
//! assert_eq!(bitmap.select(-1)?, (1 << 20) + 999);
//!
//! let other = Bitmap::try_from_iter([3u32, 100_000, 100_001])?;
//! let both = bitmap.intersection(&other)?;
//! assert_eq!(both.to_vec(), vec![3, 100_000]);
//!
//! // Pick the cheapest layout for every chunk
//! bitmap.run_optimize();
//! assert_eq!(bitmap.get_statistics().n_run_containers, 1);
//! # Ok::<(), smol_roaring::Error>(())
//! ```
//!
//! # Copy-on-write
//!
//! A bitmap built with [`BitmapOptions::copy_on_write`] shares its containers
//! with its clones and with the results of set operations; a shared container
//! is copied the first time either side modifies it. Bitmaps with different
//! copy-on-write settings cannot be combined: every binary operation between
//! them fails with [`Error::Incompatible`].
//!
//! # Logging
//!
//! Optimization passes, capacity release and binary decoding emit `tracing`
//! events at the `debug` and `trace` levels. The crate never installs a
//! subscriber.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

// Module declarations
mod bitmap;
mod codec;
mod container;
mod error;
mod frozen;
mod iter;
mod macros;
mod set_ops;
mod stats;
mod storage;
mod traits;

#[cfg(feature = "serde")]
pub mod serde;

// Re-exports
pub use bitmap::{Bitmap, BitmapOptions};
pub use error::{Error, FormatError, Result};
pub use frozen::FrozenBitmap;
pub use iter::{IntoIter, Iter};
pub use stats::Statistics;
pub use traits::Value;

/// Version of the crate, as a `major.minor.patch` string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git revision the crate was built from, or 40 zeros when it was built
/// outside of a git checkout.
pub const GIT_REVISION: &str = env!("SMOL_ROARING_GIT_REVISION");
