use commonware_cryptography::{ed25519::PrivateKey, sha256::Sha256, Hasher, Signer};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wheelhouse_types::spin::{commitment, prize_for_draw, secret_digest, tier_for_draw, DRAW_SPAN};

fn draw_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("draw_resolution");

    // One representative draw per tier.
    for draw in [0u64, 600, 900, 950, 980, 995] {
        group.bench_function(BenchmarkId::new("tier_for_draw", draw), |b| {
            b.iter(|| black_box(tier_for_draw(black_box(draw))))
        });
    }

    group.bench_function("prize_for_full_span", |b| {
        b.iter(|| {
            let mut total = 0u64;
            for draw in 0..DRAW_SPAN {
                total = total.wrapping_add(prize_for_draw(black_box(draw)));
            }
            black_box(total)
        })
    });

    group.finish();
}

fn commitment_derivation(c: &mut Criterion) {
    let player = PrivateKey::from_seed(1).public_key();
    let secret = Sha256::hash(b"secret");
    let secret_hash = secret_digest(&secret);

    c.bench_function("commitment_derivation", |b| {
        b.iter(|| {
            black_box(commitment(
                black_box(&secret_hash),
                black_box(&player),
                black_box(1_700_000_000),
                black_box(42),
            ))
        })
    });
}

criterion_group!(benches, draw_resolution, commitment_derivation);
criterion_main!(benches);
