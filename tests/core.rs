use smol_roaring::{Bitmap, BitmapOptions, Error, FrozenBitmap, GIT_REVISION, Statistics, VERSION};
use std::collections::{BTreeSet, HashSet};

fn set_a() -> Bitmap {
    Bitmap::try_from_iter([1u32, 2, 3, 100_000]).unwrap()
}

fn set_b() -> Bitmap {
    Bitmap::try_from_iter([3u32, 100_000, 100_001]).unwrap()
}

fn incremental(n: u32) -> Bitmap {
    let mut bitmap = Bitmap::new();
    for v in 0..n {
        bitmap.add(v);
    }
    bitmap
}

#[test]
fn test_binary_operations() {
    let (a, b) = (set_a(), set_b());
    assert_eq!((&a | &b).unwrap().to_vec(), vec![1, 2, 3, 100_000, 100_001]);
    assert_eq!((&a & &b).unwrap().to_vec(), vec![3, 100_000]);
    assert_eq!((&a ^ &b).unwrap().to_vec(), vec![1, 2, 100_001]);
    assert_eq!((&a - &b).unwrap().to_vec(), vec![1, 2]);

    // Operands are left untouched
    assert_eq!(a, set_a());
    assert_eq!(b, set_b());
}

#[test]
fn test_inplace_operations() {
    let cases: [(fn(&mut Bitmap, &Bitmap) -> smol_roaring::Result<()>, Vec<u32>); 4] = [
        (Bitmap::union_inplace, vec![1, 2, 3, 100_000, 100_001]),
        (Bitmap::intersection_inplace, vec![3, 100_000]),
        (Bitmap::symmetric_difference_inplace, vec![1, 2, 100_001]),
        (Bitmap::difference_inplace, vec![1, 2]),
    ];
    for (op, expected) in cases {
        let mut a = set_a();
        let b = set_b();
        op(&mut a, &b).unwrap();
        assert_eq!(a.to_vec(), expected);
        assert_eq!(b, set_b());
    }
}

#[test]
fn test_cardinality_estimators() {
    let (a, b) = (set_a(), set_b());
    assert_eq!(a.union_cardinality(&b).unwrap(), 5);
    assert_eq!(a.intersection_cardinality(&b).unwrap(), 2);
    assert_eq!(a.difference_cardinality(&b).unwrap(), 2);
    assert_eq!(a.symmetric_difference_cardinality(&b).unwrap(), 3);
    assert!((a.jaccard_index(&b).unwrap() - 0.4).abs() < 1e-12);
    assert!(a.intersect(&b).unwrap());
    assert_eq!(Bitmap::new().jaccard_index(&Bitmap::new()).unwrap(), 0.0);
}

#[test]
fn test_comparisons() {
    let a = set_a();
    let sub = Bitmap::try_from_iter([1u32, 100_000]).unwrap();
    assert!(sub.is_subset(&a).unwrap());
    assert!(sub.is_proper_subset(&a).unwrap());
    assert!(a.is_superset(&sub).unwrap());
    assert!(a.is_proper_superset(&sub).unwrap());
    assert!(a.is_subset(&a).unwrap());
    assert!(!a.is_proper_subset(&a).unwrap());
    assert!(sub < a);
    assert!(a >= sub);
    assert!(!(a < set_b()) && !(a > set_b()));
}

#[test]
fn test_incompatible_copy_on_write() {
    let plain = set_a();
    let cow = BitmapOptions::new().copy_on_write(true).copy_of(&set_b());

    assert_eq!(plain.union(&cow), Err(Error::Incompatible));
    assert_eq!(plain.intersection(&cow), Err(Error::Incompatible));
    assert_eq!(plain.difference(&cow), Err(Error::Incompatible));
    assert_eq!(plain.symmetric_difference(&cow), Err(Error::Incompatible));
    assert_eq!(&plain | &cow, Err(Error::Incompatible));
    assert_eq!(&plain & &cow, Err(Error::Incompatible));
    assert_eq!(&plain ^ &cow, Err(Error::Incompatible));
    assert_eq!(&plain - &cow, Err(Error::Incompatible));

    let mut target = set_a();
    assert_eq!(target.union_inplace(&cow), Err(Error::Incompatible));
    assert_eq!(target.intersection_inplace(&cow), Err(Error::Incompatible));
    assert_eq!(target.difference_inplace(&cow), Err(Error::Incompatible));
    assert_eq!(target.symmetric_difference_inplace(&cow), Err(Error::Incompatible));
    assert_eq!(target, set_a());

    assert_eq!(plain.try_eq(&cow), Err(Error::Incompatible));
    assert_eq!(plain.is_subset(&cow), Err(Error::Incompatible));
    assert_eq!(plain.is_superset(&cow), Err(Error::Incompatible));
    assert_eq!(plain.is_proper_subset(&cow), Err(Error::Incompatible));
    assert_eq!(plain.is_proper_superset(&cow), Err(Error::Incompatible));
    assert_eq!(plain.intersect(&cow), Err(Error::Incompatible));
    assert_eq!(plain.union_cardinality(&cow), Err(Error::Incompatible));
    assert_eq!(plain.intersection_cardinality(&cow), Err(Error::Incompatible));
    assert_eq!(plain.difference_cardinality(&cow), Err(Error::Incompatible));
    assert_eq!(plain.symmetric_difference_cardinality(&cow), Err(Error::Incompatible));
    assert_eq!(plain.jaccard_index(&cow), Err(Error::Incompatible));
    assert_eq!(Bitmap::union_all([&plain, &cow]), Err(Error::Incompatible));
    assert_eq!(Bitmap::intersection_all([&plain, &cow]), Err(Error::Incompatible));
}

#[test]
fn test_statistics_properties() {
    let values: Vec<u32> = (0..200_000).filter(|v| v % 7 == 0 || v % 5000 < 300).collect();
    let bitmap = Bitmap::try_from_iter(&values).unwrap();
    let stats = bitmap.get_statistics();
    assert_eq!(
        stats.n_values_array_containers + stats.n_values_bitset_containers + stats.n_values_run_containers,
        values.len() as u64
    );
    assert_eq!(stats.n_bytes_array_containers, 2 * stats.n_values_array_containers);
    assert_eq!(stats.n_bytes_bitset_containers, 8192 * stats.n_bitset_containers);
    assert_eq!(stats.min_value, bitmap.select(0).unwrap());
    assert_eq!(stats.max_value, bitmap.select(-1).unwrap());
    assert_eq!(stats.cardinality, bitmap.len());
    assert_eq!(stats.sum_value, values.iter().map(|&v| u64::from(v)).sum::<u64>());
    assert_eq!(
        stats.n_containers,
        stats.n_array_containers + stats.n_bitset_containers + stats.n_run_containers
    );
}

#[test]
fn test_layout_of_stepped_ranges() {
    let arrays = Bitmap::from_range((1 << 16) - 10, (1 << 16) + 10, 2).unwrap();
    let stats = arrays.get_statistics();
    assert_eq!(
        (stats.n_array_containers, stats.n_bitset_containers, stats.n_run_containers),
        (2, 0, 0)
    );
    assert_eq!(stats.n_values_array_containers, 10);

    let bitsets = Bitmap::from_range(1, 1 << 17, 2).unwrap();
    let stats = bitsets.get_statistics();
    assert_eq!(
        (stats.n_array_containers, stats.n_bitset_containers, stats.n_run_containers),
        (0, 2, 0)
    );
    assert_eq!(stats.n_values_bitset_containers, 1 << 16);

    let runs = Bitmap::from_range(1, 1 << 17, 1).unwrap();
    let stats = runs.get_statistics();
    assert_eq!(
        (stats.n_array_containers, stats.n_bitset_containers, stats.n_run_containers),
        (0, 0, 2)
    );
    assert_eq!(stats.n_values_run_containers, (1 << 17) - 1);
    assert_eq!(stats.n_bytes_run_containers, 12);
}

#[test]
fn test_run_optimize() {
    let original = incremental(1000);
    let copy = BitmapOptions::new().optimize(false).copy_of(&original);
    let stats = copy.get_statistics();
    assert_eq!(original.get_statistics(), stats);
    assert_eq!(stats.n_containers, stats.n_array_containers);
    assert_eq!(stats.n_values_array_containers, 1000);

    let mut copy = copy;
    assert!(copy.run_optimize());
    let stats = copy.get_statistics();
    assert_eq!(stats.n_containers, stats.n_run_containers);
    assert_eq!(stats.n_values_run_containers, 1000);

    let optimized = BitmapOptions::new().copy_of(&original);
    assert_eq!(optimized.get_statistics(), stats);

    // Idempotent
    assert!(!copy.run_optimize());
    assert_eq!(copy.get_statistics(), stats);
}

#[test]
fn test_shrink_to_fit() {
    let original = incremental(1000);
    let mut copy = BitmapOptions::new().optimize(false).copy_of(&original);
    assert!(copy.shrink_to_fit() > 0);
    assert_eq!(copy.shrink_to_fit(), 0);
    let mut optimized = BitmapOptions::new().copy_of(&original);
    assert_eq!(optimized.shrink_to_fit(), 0);
}

#[test]
fn test_frozen_hash_ignores_layout() {
    let runs = FrozenBitmap::from_range(0, 100, 1).unwrap();
    let arrays = FrozenBitmap::from_bitmap(&incremental(100), BitmapOptions::new().optimize(false));
    assert_eq!(runs, arrays);
    assert_ne!(runs.get_statistics(), arrays.get_statistics());

    let set: HashSet<FrozenBitmap> = [runs.clone(), arrays].into_iter().collect();
    assert_eq!(set.len(), 1);
    assert!(set.contains(&runs));

    let other = FrozenBitmap::from_range(0, 101, 1).unwrap();
    assert!(!set.contains(&other));
}

#[test]
fn test_flip_against_reference() {
    let values: BTreeSet<u32> = [0u32, 5, 65_535, 65_536, 70_000, 200_000].into_iter().collect();
    let bitmap = Bitmap::try_from_iter(&values).unwrap();
    let (start, end) = (3u64, 131_080u64);
    let flipped = bitmap.flip(start, end);
    for v in [0u32, 3, 4, 5, 6, 65_535, 65_536, 70_000, 131_079, 131_080, 200_000] {
        let inside = (start..end).contains(&u64::from(v));
        assert_eq!(flipped.contains(v), values.contains(&v) != inside, "value {v}");
    }
    assert_eq!(flipped.flip(start, end), bitmap);
    assert_eq!(bitmap.flip(10, 10), bitmap);
    assert_eq!(bitmap.flip(10, 5), bitmap);
}

#[test]
fn test_serialization_roundtrip() {
    let mut bitmap = Bitmap::try_from_iter((0u32..50_000).map(|v| v * 13)).unwrap();
    bitmap.add_range(1 << 24, (1 << 24) + 100_000);
    let bytes = bitmap.serialize();
    let back = Bitmap::deserialize(&bytes).unwrap();
    assert_eq!(back, bitmap);
    assert_eq!(back.get_statistics(), bitmap.get_statistics());
    let frozen = FrozenBitmap::deserialize(&bytes).unwrap();
    assert_eq!(frozen, bitmap);

    let mut corrupt = bytes.clone();
    corrupt[0] = b'X';
    assert!(matches!(Bitmap::deserialize(&corrupt), Err(Error::Format(_))));
    assert!(matches!(
        Bitmap::deserialize(&bytes[..bytes.len() - 3]),
        Err(Error::Format(_))
    ));
}

#[test]
fn test_empty_statistics() {
    let stats = Bitmap::new().get_statistics();
    assert_eq!(
        stats,
        Statistics {
            min_value: u32::MAX,
            ..Statistics::default()
        }
    );
    assert_eq!(Bitmap::new().min(), Err(Error::Empty));
    assert_eq!(Bitmap::new().max(), Err(Error::Empty));
}

#[test]
fn test_version_strings() {
    let parts: Vec<&str> = VERSION.split('.').collect();
    assert_eq!(parts.len(), 3);
    assert!(parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit())));
    assert_eq!(GIT_REVISION.len(), 40);
    assert!(GIT_REVISION.bytes().all(|b| b.is_ascii_hexdigit()));
}
