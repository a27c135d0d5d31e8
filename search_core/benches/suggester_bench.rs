use criterion::{black_box, criterion_group, criterion_main, Criterion};
use search_core::{DMat, DVec, GaussianBank, RawArray, Suggester, SuggesterConfig};

fn make_suggester(n_states: usize, n_samples: usize, parallel: bool) -> Suggester {
    let start = RawArray::vector((0..n_states).map(|i| if i == 0 { 1.0 } else { 0.0 }).collect());
    let stay = 0.6;
    let leave = (1.0 - stay) / (n_states - 1) as f64;
    let transition = RawArray::matrix(
        n_states,
        n_states,
        (0..n_states * n_states)
            .map(|k| if k / n_states == k % n_states { stay } else { leave })
            .collect(),
    );
    let bank = GaussianBank::new(
        (0..n_states)
            .map(|i| DVec::from_vec(vec![i as f32 * 5.0, 0.0]))
            .collect(),
        (0..n_states).map(|_| DMat::identity(2, 2)).collect(),
    )
    .unwrap();
    let samples = RawArray::matrix(
        n_samples,
        n_states,
        (0..n_samples * n_states)
            .map(|k| 0.05 + 0.9 * ((k as f64 * 0.618_034).fract()))
            .collect(),
    );
    let densities = RawArray::vector(vec![1.0; n_samples]);
    Suggester::new(
        &start,
        &transition,
        &bank,
        &samples,
        &densities,
        SuggesterConfig {
            parallel,
            ..SuggesterConfig::default()
        },
    )
    .unwrap()
}

fn bench_suggester(c: &mut Criterion) {
    let mut group = c.benchmark_group("suggester");
    let x = DVec::from_vec(vec![3.0, 0.5]);

    for (n_states, n_samples) in [(3, 100), (4, 1000), (8, 1000)] {
        for parallel in [false, true] {
            let mode = if parallel { "par" } else { "seq" };
            let s = make_suggester(n_states, n_samples, parallel);
            group.bench_function(format!("suggest_{n_states}x{n_samples}_{mode}"), |b| {
                b.iter(|| black_box(s.suggest(&x).unwrap()));
            });
            group.bench_function(format!("update_{n_states}x{n_samples}_{mode}"), |b| {
                b.iter(|| {
                    let mut s = s.clone();
                    black_box(s.update(&x).unwrap())
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_suggester);
criterion_main!(benches);
