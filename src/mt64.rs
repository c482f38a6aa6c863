//! MT19937-64 index draws.
//!
//! The engine is seeded exactly like `std::mt19937_64`, and bounded draws follow
//! the libstdc++ `uniform_int_distribution` algorithm for a 64-bit engine:
//! Lemire's nearly-divisionless method on the 128-bit product. Passwords from
//! programs built against libstdc++ (GCC 11 or later) are reproduced exactly.

use rand_mt::Mt64;

/// Draw a uniformly distributed value in `[0, range)`.
///
/// `range` must be non-zero.
pub fn uniform_index(rng: &mut Mt64, range: u64) -> u64 {
    let mut product = u128::from(rng.next_u64()) * u128::from(range);
    let mut low = product as u64;

    if low < range {
        // 2^64 mod range
        let threshold = range.wrapping_neg() % range;
        while low < threshold {
            product = u128::from(rng.next_u64()) * u128::from(range);
            low = product as u64;
        }
    }

    (product >> 64) as u64
}

/// Fill `out` with alphabet indices drawn from an engine seeded with `seed`.
pub fn fill_indices(seed: u64, alphabet_size: u32, out: &mut [u32]) {
    let mut rng = Mt64::new(seed);
    for slot in out.iter_mut() {
        *slot = uniform_index(&mut rng, u64::from(alphabet_size)) as u32;
    }
}
