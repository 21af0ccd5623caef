use criterion::{Criterion, black_box, criterion_group, criterion_main};
use refine_ode::{Method, Problem, Settings};

fn arctan_rhs(x: f64, _y: f64) -> f64 {
    4. / (1. + x * x)
}

fn bench_methods(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrate 1000 steps");
    for method in Method::ALL {
        group.bench_function(method.name(), |b| {
            b.iter(|| {
                method
                    .integrate(&arctan_rhs, black_box(0.), 0., black_box(1e-3), 1.)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_refinement(c: &mut Criterion) {
    let problem = Problem::new(arctan_rhs, 0., 0., 1., 3.14159265359).unwrap();
    let mut group = c.benchmark_group("refine pi");
    for method in Method::ALL {
        let settings = Settings::for_method(method);
        group.bench_function(method.name(), |b| {
            b.iter(|| settings.approximate(black_box(&problem)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_methods, bench_refinement);
criterion_main!(benches);
