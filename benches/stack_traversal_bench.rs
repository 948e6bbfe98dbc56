use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use strata_sieve::prelude::*;

fn names_stack(nb_horizons: usize) -> HorizonsStack {
    let horizons: Vec<String> = (0..nb_horizons).map(|i| format!("h{i}")).collect();
    let units: Vec<String> = (0..=nb_horizons).map(|i| format!("u{i}")).collect();
    horizons_stack_from_bottom_to_top_names(&horizons, &units).expect("valid names")
}

fn bench_stack_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("stack_traversal");

    for &nb_horizons in &[16usize, 256] {
        group.bench_with_input(
            BenchmarkId::new("from_names", nb_horizons),
            &nb_horizons,
            |b, &n| {
                b.iter(|| black_box(names_stack(n)));
            },
        );

        let stack = names_stack(nb_horizons);
        group.bench_with_input(
            BenchmarkId::new("bottom_to_top_units", nb_horizons),
            &nb_horizons,
            |b, _| {
                b.iter(|| black_box(stack.bottom_to_top_units().count()));
            },
        );

        let (bottom, top) = (
            stack.bottom_horizon().expect("computed"),
            stack.top_horizon().expect("computed"),
        );
        group.bench_with_input(
            BenchmarkId::new("is_above_in_stack", nb_horizons),
            &nb_horizons,
            |b, _| {
                b.iter(|| black_box(stack.is_above_in_stack(top, bottom).ok()));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_stack_traversal);
criterion_main!(benches);
