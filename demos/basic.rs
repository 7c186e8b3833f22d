//! Basic usage examples for `Bitmap`

use smol_roaring::{Bitmap, Result};

fn main() -> Result<()> {
    println!("=== Bitmap Basic Usage ===\n");

    // Create a new empty bitmap
    let mut bitmap = Bitmap::new();
    println!("Created new bitmap: {bitmap}");
    println!("Is empty? {}\n", bitmap.is_empty());

    // Add some values, including one in a far away chunk
    for v in [5, 10, 15, 100, 3_000_000_000] {
        bitmap.add(v);
    }
    println!("Added 5, 10, 15, 100 and 3_000_000_000");
    println!("Bitmap: {bitmap}");
    println!("Number of values: {}\n", bitmap.len());

    // Membership
    println!("Checking individual values:");
    for v in [0, 5, 10, 20, 100, 3_000_000_000] {
        println!("  {v}: {}", if bitmap.contains(v) { "present" } else { "absent" });
    }
    println!();

    // Checked variants reject values outside the u32 range
    println!("try_add(-1): {:?}", bitmap.try_add(-1));
    println!("try_add(1 << 32): {:?}\n", bitmap.try_add(1 << 32));

    // Removal
    bitmap.discard(10);
    println!("After discard(10): {bitmap}");
    println!("remove(10) again: {:?}\n", bitmap.remove(10));

    // Order statistics
    println!("min: {}, max: {}", bitmap.min()?, bitmap.max()?);
    println!("select(1): {}", bitmap.select(1)?);
    println!("select(-1): {}", bitmap.select(-1)?);
    println!("rank(100): {}\n", bitmap.rank(100));

    // Ranges
    let mut ranged = Bitmap::from_range(0, 20, 3)?;
    println!("from_range(0, 20, 3): {ranged}");
    ranged.add_range(100, 105);
    println!("After add_range(100, 105): {ranged}");
    ranged.remove_range(0, 10);
    println!("After remove_range(0, 10): {ranged}");
    ranged.flip_inplace(100, 110);
    println!("After flip_inplace(100, 110): {ranged}\n");

    // Text round trip
    let parsed: Bitmap = "Bitmap([1, 2, 3])".parse()?;
    println!("Parsed from text: {parsed}");

    Ok(())
}
