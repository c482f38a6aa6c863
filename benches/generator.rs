use criterion::{black_box, criterion_group, criterion_main, Criterion};
use devil_breaker::{Alphabet, CandidateGenerator, GeneratorKind};

fn bench_mt64_indices(c: &mut Criterion) {
    let size = Alphabet::printable().size();
    let mut out = [0u32; 12];

    c.bench_function("mt64_fill_indices", |b| {
        b.iter(|| {
            for seed in 0..1000u64 {
                devil_breaker::mt64::fill_indices(black_box(seed), size, &mut out);
            }
        })
    });
}

fn bench_lcg_indices(c: &mut Criterion) {
    let size = Alphabet::printable().size();
    let mut out = [0u32; 12];

    c.bench_function("lcg_fill_indices", |b| {
        b.iter(|| {
            for seed in 0..1000u64 {
                devil_breaker::lcg::fill_indices(black_box(seed), size, &mut out);
            }
        })
    });
}

fn bench_generate_string(c: &mut Criterion) {
    let generator = devil_breaker::PasswordGenerator::new(
        GeneratorKind::Mt64,
        std::sync::Arc::new(Alphabet::printable()),
    );

    c.bench_function("mt64_generate_string", |b| {
        b.iter(|| generator.generate(black_box(1_700_000_000_000_000_000), 12))
    });
}

criterion_group!(
    benches,
    bench_mt64_indices,
    bench_lcg_indices,
    bench_generate_string,
);
criterion_main!(benches);
