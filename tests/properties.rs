use proptest::prelude::*;
use smol_roaring::{Bitmap, BitmapOptions, FrozenBitmap};
use std::{
    collections::{BTreeSet, hash_map::DefaultHasher},
    hash::{Hash, Hasher},
};

// Values clustered into a few chunks so that containers of every kind
// show up: scattered values, dense blocks and long runs.
prop_compose! {
    fn arb_values()
        (scattered in prop::collection::vec(0u32..(4 << 16), 0..300),
         dense in prop::option::of((0u32..4, 0u32..2)),
         runs in prop::collection::vec((0u32..(4 << 16), 1u32..5000), 0..4))
        -> BTreeSet<u32>
    {
        let mut values: BTreeSet<u32> = scattered.into_iter().collect();
        if let Some((key, parity)) = dense {
            values.extend(((key << 16)..((key + 1) << 16)).filter(|v| v % 2 == parity));
        }
        for (start, len) in runs {
            values.extend(start..start.saturating_add(len));
        }
        values
    }
}

fn bitmap(values: &BTreeSet<u32>) -> Bitmap {
    Bitmap::try_from_iter(values).unwrap()
}

/// Same values, built one at a time without optimization.
fn incremental(values: &BTreeSet<u32>) -> Bitmap {
    let mut bitmap = Bitmap::new();
    for &v in values {
        bitmap.add(v);
    }
    bitmap
}

fn hash_of(value: &impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    #[test]
    fn test_binary_operations_match_btreeset(a in arb_values(), b in arb_values()) {
        let (ba, bb) = (bitmap(&a), bitmap(&b));
        let union: BTreeSet<u32> = a.union(&b).copied().collect();
        let inter: BTreeSet<u32> = a.intersection(&b).copied().collect();
        let diff: BTreeSet<u32> = a.difference(&b).copied().collect();
        let sym: BTreeSet<u32> = a.symmetric_difference(&b).copied().collect();

        prop_assert_eq!((&ba | &bb).unwrap(), bitmap(&union));
        prop_assert_eq!((&ba & &bb).unwrap(), bitmap(&inter));
        prop_assert_eq!((&ba - &bb).unwrap(), bitmap(&diff));
        prop_assert_eq!((&ba ^ &bb).unwrap(), bitmap(&sym));

        prop_assert_eq!(ba.union_cardinality(&bb).unwrap(), union.len() as u64);
        prop_assert_eq!(ba.intersection_cardinality(&bb).unwrap(), inter.len() as u64);
        prop_assert_eq!(ba.difference_cardinality(&bb).unwrap(), diff.len() as u64);
        prop_assert_eq!(ba.symmetric_difference_cardinality(&bb).unwrap(), sym.len() as u64);
        prop_assert_eq!(ba.intersect(&bb).unwrap(), !inter.is_empty());
        prop_assert_eq!(ba.is_subset(&bb).unwrap(), a.is_subset(&b));
    }

    #[test]
    fn test_inplace_operations_match(a in arb_values(), b in arb_values()) {
        let bb = bitmap(&b);
        let mut union = incremental(&a);
        union.union_inplace(&bb).unwrap();
        let mut inter = incremental(&a);
        inter.intersection_inplace(&bb).unwrap();
        let mut diff = incremental(&a);
        diff.difference_inplace(&bb).unwrap();
        let mut sym = incremental(&a);
        sym.symmetric_difference_inplace(&bb).unwrap();

        prop_assert!(union.iter().eq(a.union(&b).copied()));
        prop_assert!(inter.iter().eq(a.intersection(&b).copied()));
        prop_assert!(diff.iter().eq(a.difference(&b).copied()));
        prop_assert!(sym.iter().eq(a.symmetric_difference(&b).copied()));
    }

    #[test]
    fn test_equality_follows_values(a in arb_values(), b in arb_values()) {
        prop_assert_eq!(bitmap(&a) == bitmap(&b), a == b);
        prop_assert_eq!(bitmap(&a), incremental(&a));
        prop_assert_eq!(bitmap(&a).len(), a.len() as u64);
    }

    #[test]
    fn test_frozen_hash_depends_on_values_only(a in arb_values()) {
        let optimized = FrozenBitmap::from(bitmap(&a));
        let raw = FrozenBitmap::from(incremental(&a));
        prop_assert_eq!(&optimized, &raw);
        prop_assert_eq!(hash_of(&optimized), hash_of(&raw));
    }

    #[test]
    fn test_serialization_roundtrip(a in arb_values(), optimize in any::<bool>()) {
        let original = BitmapOptions::new().optimize(optimize).copy_of(&incremental(&a));
        let bytes = original.serialize();
        prop_assert_eq!(bytes.len(), original.serialized_size());
        let decoded = Bitmap::deserialize(&bytes).unwrap();
        prop_assert_eq!(decoded.get_statistics(), original.get_statistics());
        prop_assert_eq!(decoded, original);
    }

    #[test]
    fn test_rank_select_consistency(a in arb_values(), probe in 0u32..(5 << 16)) {
        let b = bitmap(&a);
        let expected_rank = a.range(..=probe).count() as u64;
        prop_assert_eq!(b.rank(probe), expected_rank);
        if let Some(&max) = a.iter().next_back() {
            prop_assert_eq!(b.rank(max), b.len());
        }
        for (i, &v) in a.iter().enumerate().step_by(37) {
            prop_assert_eq!(b.select(i as i64).unwrap(), v);
        }
    }

    #[test]
    fn test_flip_twice_is_identity(a in arb_values(), start in 0u64..(5 << 16), len in 0u64..(3 << 16)) {
        let b = bitmap(&a);
        let end = start + len;
        let flipped = b.flip(start, end);
        let (s, e) = (start as u32, end as u32);
        let outside = a.range(..s).count() + a.range(e..).count();
        let inside = a.range(s..e).count();
        let expected = outside as u64 + len - inside as u64;
        prop_assert_eq!(flipped.len(), expected);
        prop_assert_eq!(flipped.flip(start, end), b);
    }

    #[test]
    fn test_run_optimize_is_idempotent(a in arb_values()) {
        let mut b = incremental(&a);
        b.run_optimize();
        let stats = b.get_statistics();
        prop_assert!(!b.run_optimize());
        prop_assert_eq!(b.get_statistics(), stats);
        b.shrink_to_fit();
        prop_assert_eq!(b.shrink_to_fit(), 0);
        prop_assert!(b.iter().eq(a.iter().copied()));
    }

    #[test]
    fn test_range_mutations(a in arb_values(), start in 0u64..(5 << 16), len in 0u64..(2 << 16)) {
        let end = start + len;
        let mut added = bitmap(&a);
        added.add_range(start, end);
        let mut removed = bitmap(&a);
        removed.remove_range(start, end);

        let mut expected_added = a.clone();
        expected_added.extend(start as u32..end as u32);
        let expected_removed: BTreeSet<u32> = a
            .iter()
            .copied()
            .filter(|&v| !(start..end).contains(&u64::from(v)))
            .collect();
        prop_assert!(added.iter().eq(expected_added.iter().copied()));
        prop_assert!(removed.iter().eq(expected_removed.iter().copied()));
    }
}
