//! 64-bit Linear Congruential Generator (LCG) index draws.
//!
//! next = (a * prev + c) mod 2^64, index = (next >> 33) mod size.
//!
//! This is the generator class GPU password kernels typically use instead of a
//! full Mersenne Twister. It is weak and biased for sizes that do not divide
//! 2^31; it exists to reproduce such kernels, not as a recommendation.

/// Multiplier (Knuth's MMIX).
pub const LCG_A: u64 = 6364136223846793005;

/// Increment (Knuth's MMIX).
pub const LCG_C: u64 = 1442695040888963407;

/// Compute next LCG state.
#[inline]
pub fn lcg_next(state: u64) -> u64 {
    LCG_A.wrapping_mul(state).wrapping_add(LCG_C)
}

/// Fill `out` with alphabet indices drawn from an LCG seeded with `seed`.
pub fn fill_indices(seed: u64, alphabet_size: u32, out: &mut [u32]) {
    let mut state = seed;
    for slot in out.iter_mut() {
        state = lcg_next(state);
        *slot = ((state >> 33) % u64::from(alphabet_size)) as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mmix_sequence() {
        let mut state = 1u64;
        state = lcg_next(state);
        assert_eq!(state, 7806831264735756412);

        state = lcg_next(state);
        assert_eq!(state, 9396908728118811419);

        state = lcg_next(state);
        assert_eq!(state, 11960119808228829710);
    }

    #[test]
    fn test_zero_seed_yields_increment() {
        assert_eq!(lcg_next(0), LCG_C);
    }

    #[test]
    fn test_constants_match_kernel_words() {
        // seed_search.wgsl stores each constant as (lo, hi) u32 words
        assert_eq!(LCG_A, 0x5851F42D_4C957F2D);
        assert_eq!(LCG_C, 0x14057B7E_F767814F);
    }

    #[test]
    fn test_fill_uses_high_bits() {
        let mut out = [0u32; 3];
        fill_indices(1, u32::MAX, &mut out);
        assert_eq!(out, [908834774, 1093944153, 1392341196]);
    }

    #[test]
    fn test_fill_deterministic() {
        let mut a = [0u32; 12];
        let mut b = [0u32; 12];
        fill_indices(42, 94, &mut a);
        fill_indices(42, 94, &mut b);
        assert_eq!(a, b);
        assert!(a.iter().all(|&i| i < 94));
    }
}
