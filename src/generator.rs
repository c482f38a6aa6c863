//! Candidate generation: seed -> password.
//!
//! A generator owns its alphabet and maps every seed to one password of the
//! requested length. Search backends only see the [`CandidateGenerator`] trait,
//! so the same scan runs against the real engines or an instrumented stub.

use std::sync::Arc;

use crate::alphabet::Alphabet;

/// Seed-to-candidate mapping used by search backends.
pub trait CandidateGenerator: Send + Sync {
    /// Human-readable name of the generator
    fn name(&self) -> &'static str;

    /// Alphabet the generated indices refer to
    fn alphabet(&self) -> &Alphabet;

    /// Write the alphabet indices of the candidate for `seed` into `out`.
    ///
    /// The candidate length is `out.len()`.
    fn fill_indices(&self, seed: u64, out: &mut [u32]);

    /// Generate the candidate string for `seed`.
    fn generate(&self, seed: u64, length: usize) -> String {
        let mut indices = vec![0u32; length];
        self.fill_indices(seed, &mut indices);
        self.alphabet().render(&indices)
    }
}

/// Available pseudo-random engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorKind {
    /// MT19937-64 with libstdc++ bounded draws
    #[default]
    Mt64,
    /// 64-bit LCG, high bits modulo alphabet size
    Lcg,
}

impl GeneratorKind {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "mt64" | "mt19937_64" => Ok(GeneratorKind::Mt64),
            "lcg" => Ok(GeneratorKind::Lcg),
            _ => Err(format!("Unknown generator: {}. Valid: mt64, lcg", s)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GeneratorKind::Mt64 => "mt64",
            GeneratorKind::Lcg => "lcg",
        }
    }

    /// Fill `out` with indices in `[0, alphabet_size)` for `seed`.
    pub fn fill_indices(&self, seed: u64, alphabet_size: u32, out: &mut [u32]) {
        match self {
            GeneratorKind::Mt64 => crate::mt64::fill_indices(seed, alphabet_size, out),
            GeneratorKind::Lcg => crate::lcg::fill_indices(seed, alphabet_size, out),
        }
    }
}

/// Password generator: an engine kind bound to an alphabet.
#[derive(Debug, Clone)]
pub struct PasswordGenerator {
    kind: GeneratorKind,
    alphabet: Arc<Alphabet>,
}

impl PasswordGenerator {
    pub fn new(kind: GeneratorKind, alphabet: Arc<Alphabet>) -> Self {
        Self { kind, alphabet }
    }

    pub fn kind(&self) -> GeneratorKind {
        self.kind
    }
}

impl CandidateGenerator for PasswordGenerator {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn fill_indices(&self, seed: u64, out: &mut [u32]) {
        self.kind.fill_indices(seed, self.alphabet.size(), out);
    }
}

/// Generate the password for `seed` without building a generator first.
pub fn generate(kind: GeneratorKind, seed: u64, length: usize, alphabet: &Alphabet) -> String {
    let mut indices = vec![0u32; length];
    kind.fill_indices(seed, alphabet.size(), &mut indices);
    alphabet.render(&indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printable(kind: GeneratorKind) -> PasswordGenerator {
        PasswordGenerator::new(kind, Arc::new(Alphabet::printable()))
    }

    #[test]
    fn test_two_letter_fixture() {
        let alphabet = Alphabet::new("AB").unwrap();
        assert_eq!(generate(GeneratorKind::Mt64, 42, 3, &alphabet), "BBB");
        assert_eq!(generate(GeneratorKind::Lcg, 42, 3, &alphabet), "AAA");
    }

    #[test]
    fn test_reference_passwords() {
        let generator = printable(GeneratorKind::Mt64);
        assert_eq!(generator.generate(42, 12), ")8)m[i2JzKbX");
        assert_eq!(generator.generate(1000, 8), "n}:PJj#x");
        assert_eq!(generator.generate(u64::MAX, 6), "c&dW_X");
    }

    #[test]
    fn test_classic_alphabet_password() {
        let generator = PasswordGenerator::new(GeneratorKind::Mt64, Arc::new(Alphabet::classic()));
        assert_eq!(generator.generate(42, 12), "&6&m:i0HyJbV");
    }

    #[test]
    fn test_lcg_password() {
        assert_eq!(printable(GeneratorKind::Lcg).generate(42, 12), "k%av;O|QcXIo");
    }

    #[test]
    fn test_deterministic() {
        for kind in [GeneratorKind::Mt64, GeneratorKind::Lcg] {
            let generator = printable(kind);
            for seed in [0u64, 1, 42, 1_700_000_000_000_000_000, u64::MAX] {
                assert_eq!(generator.generate(seed, 16), generator.generate(seed, 16));
            }
        }
    }

    #[test]
    fn test_length_and_containment() {
        for kind in [GeneratorKind::Mt64, GeneratorKind::Lcg] {
            let generator = printable(kind);
            for length in [0usize, 1, 7, 20, 32] {
                let candidate = generator.generate(987654321, length);
                assert_eq!(candidate.chars().count(), length);
                assert!(candidate.chars().all(|c| generator.alphabet().contains(c)));
            }
        }
    }

    #[test]
    fn test_prefix_stable_across_lengths() {
        let generator = printable(GeneratorKind::Mt64);
        let long = generator.generate(31337, 20);
        let short = generator.generate(31337, 8);
        assert!(long.starts_with(&short));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(GeneratorKind::from_str("mt64"), Ok(GeneratorKind::Mt64));
        assert_eq!(GeneratorKind::from_str("MT19937_64"), Ok(GeneratorKind::Mt64));
        assert_eq!(GeneratorKind::from_str("lcg"), Ok(GeneratorKind::Lcg));
        assert!(GeneratorKind::from_str("xorshift").is_err());
    }
}
