//! Layout statistics of a bitmap.

use alloc::collections::BTreeMap;

use crate::{Bitmap, container::Container, macros::join};

/// Counts of containers, values and payload bytes per container kind,
/// together with a few aggregates over the values.
///
/// Byte counts are the serialized payload sizes: `2` bytes per value for
/// arrays, `8192` per bitset and `2 + 4` bytes per run for run containers.
///
/// For an empty bitmap `min_value` is `u32::MAX` and `max_value` is `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Statistics {
    /// Containers of any kind.
    pub n_containers: u64,
    /// Array containers.
    pub n_array_containers: u64,
    /// Run containers.
    pub n_run_containers: u64,
    /// Bitset containers.
    pub n_bitset_containers: u64,
    /// Values held by array containers.
    pub n_values_array_containers: u64,
    /// Values held by run containers.
    pub n_values_run_containers: u64,
    /// Values held by bitset containers.
    pub n_values_bitset_containers: u64,
    /// Payload bytes of array containers.
    pub n_bytes_array_containers: u64,
    /// Payload bytes of run containers.
    pub n_bytes_run_containers: u64,
    /// Payload bytes of bitset containers.
    pub n_bytes_bitset_containers: u64,
    /// Largest value, or `0` when empty.
    pub max_value: u32,
    /// Smallest value, or `u32::MAX` when empty.
    pub min_value: u32,
    /// Sum of all values.
    pub sum_value: u64,
    /// Number of values.
    pub cardinality: u64,
}

impl Statistics {
    /// The statistics keyed by field name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let stats = Bitmap::from_range(0, 10, 1).unwrap().get_statistics();
    /// let map = stats.to_map();
    /// assert_eq!(map["n_run_containers"], 1);
    /// assert_eq!(map["sum_value"], 45);
    /// assert_eq!(map.len(), 14);
    /// ```
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, u64> {
        BTreeMap::from([
            ("n_containers", self.n_containers),
            ("n_array_containers", self.n_array_containers),
            ("n_run_containers", self.n_run_containers),
            ("n_bitset_containers", self.n_bitset_containers),
            ("n_values_array_containers", self.n_values_array_containers),
            ("n_values_run_containers", self.n_values_run_containers),
            ("n_values_bitset_containers", self.n_values_bitset_containers),
            ("n_bytes_array_containers", self.n_bytes_array_containers),
            ("n_bytes_run_containers", self.n_bytes_run_containers),
            ("n_bytes_bitset_containers", self.n_bytes_bitset_containers),
            ("max_value", u64::from(self.max_value)),
            ("min_value", u64::from(self.min_value)),
            ("sum_value", self.sum_value),
            ("cardinality", self.cardinality),
        ])
    }
}

impl Bitmap {
    /// Walks every container once and reports how the bitmap is laid out.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smol_roaring::Bitmap;
    /// let bitmap = Bitmap::from_range(0, 1 << 17, 1).unwrap();
    /// let stats = bitmap.get_statistics();
    /// assert_eq!(stats.n_run_containers, 2);
    /// assert_eq!(stats.n_bytes_run_containers, 12);
    /// assert_eq!(stats.cardinality, 1 << 17);
    /// ```
    #[must_use]
    pub fn get_statistics(&self) -> Statistics {
        let mut stats = Statistics {
            min_value: u32::MAX,
            ..Statistics::default()
        };
        for (key, container) in self.dir.iter() {
            let len = u64::from(container.len());
            let bytes = container.serialized_size() as u64;
            stats.n_containers += 1;
            match container {
                Container::Array(_) => {
                    stats.n_array_containers += 1;
                    stats.n_values_array_containers += len;
                    stats.n_bytes_array_containers += bytes;
                }
                Container::Bitset(_) => {
                    stats.n_bitset_containers += 1;
                    stats.n_values_bitset_containers += len;
                    stats.n_bytes_bitset_containers += bytes;
                }
                Container::Run(_) => {
                    stats.n_run_containers += 1;
                    stats.n_values_run_containers += len;
                    stats.n_bytes_run_containers += bytes;
                }
            }
            // Runs contribute their arithmetic series instead of every value.
            let base = u64::from(key) << 16;
            container.for_each_run(|run| {
                let n = u64::from(run.len());
                let first = base + u64::from(run.start);
                stats.sum_value += n * first + n * (n - 1) / 2;
            });
            stats.cardinality += len;
        }
        if let (Some((first_key, first)), Some((last_key, last))) =
            (self.dir.iter().next(), self.dir.iter().next_back())
        {
            stats.min_value = first.min().map_or(u32::MAX, |low| join!(first_key, low));
            stats.max_value = last.max().map_or(0, |low| join!(last_key, low));
        }
        stats
    }
}
