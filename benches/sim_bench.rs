use attach_simulation::{Simulation, utils};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("attach_simulation_step");
    group.sample_size(20);

    // 1. Hanging chain: springs only, every link dynamic.
    {
        let mut sim = utils::hanging_chain(10_000, 0.1, 500.0, Simulation::DEFAULT_DT).expect("chain scene");
        // Warmup
        sim.step();

        group.throughput(Throughput::Elements(sim.bodies.len() as u64));
        group.bench_function("hanging_chain", |b| {
            b.iter(|| sim.step());
        });
    }

    // 2. Scattered balls with a share of attached followers.
    {
        let mut sim = utils::uniform_scatter(10_000, 100.0, 1e-3).expect("scatter scene");
        sim.step();

        group.throughput(Throughput::Elements(sim.bodies.len() as u64));
        group.bench_function("uniform_scatter", |b| {
            b.iter(|| sim.step());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
