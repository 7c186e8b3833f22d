//! Set operations with `Bitmap`

use smol_roaring::{Bitmap, BitmapOptions, Error, Result};

fn main() -> Result<()> {
    println!("=== Bitmap Set Operations ===\n");

    let a = Bitmap::try_from_iter([1u32, 2, 3, 100_000])?;
    let b = Bitmap::try_from_iter([3u32, 100_000, 100_001])?;
    println!("A = {a}");
    println!("B = {b}\n");

    // Binary operations return a new bitmap
    println!("A | B = {}", (&a | &b)?);
    println!("A & B = {}", (&a & &b)?);
    println!("A - B = {}", (&a - &b)?);
    println!("A ^ B = {}\n", (&a ^ &b)?);

    // Cardinalities without materializing the result
    println!("|A | B| = {}", a.union_cardinality(&b)?);
    println!("|A & B| = {}", a.intersection_cardinality(&b)?);
    println!("jaccard(A, B) = {:.2}\n", a.jaccard_index(&b)?);

    // In-place variants
    let mut c = a.clone();
    c.union_inplace(&b)?;
    println!("A |= B  -> {c}");
    c.difference_inplace(&b)?;
    println!("then -= B -> {c}\n");

    // Comparisons
    let small = Bitmap::try_from_iter([1u32, 100_000])?;
    println!("{small} <= A? {}", small.is_subset(&a)?);
    println!("{small} < A?  {}", small.is_proper_subset(&a)?);
    println!("A intersects B? {}\n", a.intersect(&b)?);

    // n-ary operations
    let third = Bitmap::from_range(0, 10, 1)?;
    println!("union_all(A, B, 0..10) = {}", Bitmap::union_all([&a, &b, &third])?);
    println!("intersection_all(A, B, 0..10) = {}", Bitmap::intersection_all([&a, &b, &third])?);

    let mut d = a.clone();
    d.update([vec![7u32, 8], vec![9]])?;
    println!("A.update([7, 8], [9]) = {d}\n");

    // Copy-on-write bitmaps only mix with copy-on-write bitmaps
    let shared = BitmapOptions::new().copy_on_write(true).copy_of(&a);
    match a.union(&shared) {
        Err(Error::Incompatible) => println!("Mixing copy-on-write settings is rejected"),
        other => println!("Unexpected: {other:?}"),
    }

    Ok(())
}
