// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Benchmarks for the collision predicate and the collision pass
//!
//! These benchmarks measure:
//! - Raw predicate throughput on overlapping and disjoint pairs
//! - Pair gathering over worlds of increasing size
//! - A full scene tick with every entity colliding-capable

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use entity_runtime::collision::{colliding_pairs, is_colliding, CollisionType};
use entity_runtime::ecs::EntityRecord;
use entity_runtime::properties::Properties;
use entity_runtime::{Scene, World};

/// Entities on a loose grid, so roughly one in four touches a neighbour
fn grid_world(count: usize) -> World {
    let mut world = World::new();
    let columns = (count as f64).sqrt().ceil() as usize;
    for i in 0..count {
        let x = (i % columns) as f64 * 20.0;
        let y = (i / columns) as f64 * 14.0;
        world.spawn(EntityRecord::new("box", x, y, 16, 16).with_collision(CollisionType::Solid));
    }
    world
}

/// Benchmark: the predicate on its own
fn bench_predicate(c: &mut Criterion) {
    let a = EntityRecord::new("a", 10.0, 10.0, 16, 16).with_collision(CollisionType::Solid);
    let near = EntityRecord::new("b", 20.0, 10.0, 16, 16).with_collision(CollisionType::Trigger);
    let far = EntityRecord::new("c", 400.0, 10.0, 16, 16).with_collision(CollisionType::Trigger);

    c.bench_function("is_colliding_overlap", |b| {
        b.iter(|| is_colliding(black_box(&a), black_box(&near)))
    });
    c.bench_function("is_colliding_disjoint", |b| {
        b.iter(|| is_colliding(black_box(&a), black_box(&far)))
    });
}

/// Benchmark: gather every colliding pair
fn bench_colliding_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("colliding_pairs");

    for entity_count in [100, 500, 1000].iter() {
        let world = grid_world(*entity_count);
        group.throughput(Throughput::Elements(*entity_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(entity_count),
            &world,
            |b, world| b.iter(|| black_box(colliding_pairs(world))),
        );
    }

    group.finish();
}

/// Benchmark: one full tick, update plus collision plus cleanup
fn bench_scene_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_tick");

    for entity_count in [100, 500].iter() {
        let mut scene = Scene::default();
        let columns = (*entity_count as f64).sqrt().ceil() as usize;
        for i in 0..*entity_count {
            scene.spawn(
                &Properties::new()
                    .with("x", (i % columns) as f64 * 20.0)
                    .with("y", (i / columns) as f64 * 14.0)
                    .with("collisionType", "SOLID"),
            );
        }
        group.throughput(Throughput::Elements(*entity_count as u64));
        group.bench_function(BenchmarkId::from_parameter(entity_count), |b| {
            b.iter(|| scene.tick())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_predicate, bench_colliding_pairs, bench_scene_tick);
criterion_main!(benches);
