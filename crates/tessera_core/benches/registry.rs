//! Registry throughput benchmarks
//!
//! Run with: `cargo bench --package tessera_core`

use bytemuck::{Pod, Zeroable};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::define_component;
use tessera_core::ecs::{Registry, RegistryConfig};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}
define_component!(Position, 1, "Position");

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}
define_component!(Velocity, 2, "Velocity");

fn config(count: usize) -> RegistryConfig {
    RegistryConfig {
        entity_capacity: count,
        component_capacity: count,
    }
}

/// Every entity has a Position; every other entity also has a Velocity.
fn populated(count: usize) -> Registry {
    let mut registry = Registry::with_config(config(count));
    for i in 0..count {
        let entity = registry.create();
        let f = i as f32;
        registry.add_component(entity, Position { x: f, y: f, z: f });
        if i % 2 == 0 {
            registry.add_component(entity, Velocity { x: 0.1, y: 0.2, z: 0.3 });
        }
    }
    registry
}

/// Create, attach and destroy: exercises swap-pop removal in every pool.
fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_destroy");

    for count in [1_000, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut registry = Registry::with_config(config(count));
                for _ in 0..count {
                    let entity = registry.create();
                    registry.add_component(entity, Position { x: 0.0, y: 0.0, z: 0.0 });
                    registry.destroy(entity);
                }
                black_box(registry.remove_requested_entities())
            });
        });
    }

    group.finish();
}

fn bench_view_each(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_each");

    for count in [10_000, 100_000, 1_000_000] {
        let mut registry = populated(count);
        group.bench_with_input(BenchmarkId::new("position_velocity", count), &count, |b, _| {
            b.iter(|| {
                registry.view::<(Position, Velocity)>().each(|p, v| {
                    p.x += v.x;
                    p.y += v.y;
                    p.z += v.z;
                });
            });
        });
        group.bench_with_input(BenchmarkId::new("position_only", count), &count, |b, _| {
            b.iter(|| {
                registry.view::<Position>().each(|p| p.y -= 9.81);
            });
        });
    }

    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let registry = populated(100_000);
    let mut buffer = Vec::new();
    registry.serialize(&mut buffer).unwrap();
    let capacity = buffer.len();

    c.bench_function("serialize_100k", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(capacity);
            registry.serialize(&mut out).unwrap();
            black_box(out.len())
        });
    });

    c.bench_function("deserialize_100k", |b| {
        let mut target = Registry::new();
        target.register_set::<(Position, Velocity)>();
        b.iter(|| {
            target.deserialize(buffer.as_slice()).unwrap();
            black_box(target.len())
        });
    });
}

criterion_group!(benches, bench_churn, bench_view_each, bench_serialize);
criterion_main!(benches);
