//! Tick throughput with the brute force and grid neighbour indices.
//!
//! Run with: `cargo bench -p flock-core`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flock_core::pathfinding::Graph;
use flock_core::{find_path, FlockConfig, FlockSimulation, LinearIndex, Position3, UniformGridIndex};

fn config(count: usize) -> FlockConfig {
    FlockConfig {
        target_population: count,
        seed: Some(1),
        world_extents: Position3::new(400.0, 400.0, 0.0),
        sight_radius: 10.0,
        ..FlockConfig::default()
    }
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for count in [100usize, 500, 2000] {
        group.bench_with_input(BenchmarkId::new("linear", count), &count, |b, &n| {
            let mut sim = FlockSimulation::with_index(config(n), LinearIndex::new()).unwrap();
            sim.tick(0.02);
            b.iter(|| sim.tick(black_box(0.02)));
        });

        group.bench_with_input(BenchmarkId::new("grid", count), &count, |b, &n| {
            let index = UniformGridIndex::new(10.0).unwrap();
            let mut sim = FlockSimulation::with_index(config(n), index).unwrap();
            sim.tick(0.02);
            b.iter(|| sim.tick(black_box(0.02)));
        });
    }

    group.finish();
}

fn bench_astar(c: &mut Criterion) {
    let graph = Graph::grid(128, 128, true, |x, y| !(x == 64 && y < 120));
    let start = graph.node_at(0, 0).unwrap();
    let goal = graph.node_at(127, 0).unwrap();

    c.bench_function("astar_128x128_wall", |b| {
        b.iter(|| black_box(find_path(&graph, start, goal)))
    });
}

criterion_group!(benches, bench_tick, bench_astar);
criterion_main!(benches);
