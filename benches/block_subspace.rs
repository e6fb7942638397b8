use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use subspace_eig::{backend::NativeBackend, block_subspace, Pencil, SubspaceConfig};

fn bench_bar(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_subspace_bar");
    group.sample_size(10);

    for &n in &[50usize, 100, 200] {
        let pencil = Pencil::bar(n);
        let config = SubspaceConfig::new(n, 4).maxiter(500);
        group.bench_with_input(BenchmarkId::new("nev4", n), &pencil, |b, pencil| {
            b.iter(|| {
                let res = block_subspace(
                    &NativeBackend,
                    pencil.stiffness.view(),
                    pencil.mass.view(),
                    &config,
                );
                black_box(res.is_ok())
            })
        });
    }
    group.finish();
}

criterion_group!(subspace_benches, bench_bar);
criterion_main!(subspace_benches);
