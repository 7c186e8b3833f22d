//! Advanced usage patterns and features

use serde::{Deserialize, Serialize};
use smol_roaring::{Bitmap, BitmapOptions, FrozenBitmap, Result};
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize)]
struct Index {
    name: String,
    // Plain list of integers
    postings: Bitmap,
    // Compact binary encoding, base64 in human-readable formats
    #[serde(with = "smol_roaring::serde::bytes")]
    deleted: Bitmap,
}

fn main() -> Result<()> {
    println!("=== Bitmap Advanced Features ===\n");

    // Container layouts and statistics
    println!("Container layouts:");
    let mut bitmap = Bitmap::new();
    bitmap.extend((0..1000u32).map(|v| v * 7));
    bitmap.extend((1 << 16)..(1 << 16) + 10_000u32);
    bitmap.extend(((2 << 16)..(3 << 16)).step_by(2));
    let stats = bitmap.get_statistics();
    println!(
        "  before run_optimize: {} array, {} bitset, {} run",
        stats.n_array_containers, stats.n_bitset_containers, stats.n_run_containers
    );
    bitmap.run_optimize();
    let stats = bitmap.get_statistics();
    println!(
        "  after run_optimize:  {} array, {} bitset, {} run",
        stats.n_array_containers, stats.n_bitset_containers, stats.n_run_containers
    );
    println!("  released {} bytes of spare capacity", bitmap.shrink_to_fit());
    for (name, value) in stats.to_map() {
        println!("  {name}: {value}");
    }
    println!();

    // Python-style slicing
    println!("Slicing:");
    let values = Bitmap::from_range(0, 100, 5)?;
    println!("  values       = {values}");
    println!("  values[2:6]  = {}", values.slice(Some(2), Some(6), None)?);
    println!("  values[::-4] = {}", values.slice(None, None, Some(-4))?);
    println!();

    // Copy-on-write sharing
    println!("Copy-on-write:");
    let options = BitmapOptions::new().copy_on_write(true);
    let original = options.range(0, 1 << 20, 1)?;
    let mut copy = original.clone();
    copy.add(1 << 21);
    println!("  original has {} values", original.len());
    println!("  modified copy has {} values", copy.len());
    println!();

    // Frozen bitmaps are hashable
    println!("Frozen bitmaps as map keys:");
    let mut groups: HashMap<FrozenBitmap, &str> = HashMap::new();
    groups.insert(FrozenBitmap::try_from_iter([1u32, 2, 3])?, "small");
    groups.insert(FrozenBitmap::from_range(0, 1 << 20, 1)?, "large");
    let probe: FrozenBitmap = Bitmap::try_from_iter([3u32, 2, 1])?.into();
    println!("  lookup {probe} -> {:?}", groups.get(&probe));
    let mut thawed = probe.thaw();
    thawed.add(4);
    println!("  thawed and modified: {thawed}");
    println!();

    // Binary encoding
    println!("Binary encoding:");
    let bytes = bitmap.serialize();
    println!("  {} values encode to {} bytes", bitmap.len(), bytes.len());
    let decoded = Bitmap::deserialize(&bytes)?;
    println!("  decoded equal: {}", decoded == bitmap);
    println!("  truncated input: {:?}", Bitmap::deserialize(&bytes[..5]).err());
    println!();

    // Serde
    println!("Serde:");
    let index = Index {
        name: "docs".to_owned(),
        postings: Bitmap::try_from_iter([1u32, 5, 9, 100_000])?,
        deleted: Bitmap::from_range(0, 1000, 1)?,
    };
    match serde_json::to_string(&index) {
        Ok(json) => {
            println!("  JSON: {json}");
            if let Ok(back) = serde_json::from_str::<Index>(&json) {
                println!("  round trip: {} / {}", back.postings, back.deleted.len());
            }
        }
        Err(err) => println!("  JSON error: {err}"),
    }
    if let Ok(encoded) = postcard::to_allocvec(&index) {
        println!("  postcard: {} bytes", encoded.len());
    }

    Ok(())
}
