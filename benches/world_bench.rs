//! Benchmarks for impulse2d
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use impulse2d::{Body, BodyType, Material, Ray, Shape, Vec2, World};

fn falling_boxes_world(count: usize) -> World {
    let mut world: World = World::new(Vec2::new(0.0, 9.8), 2.0).unwrap();

    let floor = Shape::rectangle(Material::default(), 100.0, 1.0).unwrap();
    world
        .add_body(Body::with_shape(BodyType::Static, Vec2::new(0.0, 20.0), floor))
        .unwrap();

    let shape = Shape::rectangle(Material::default(), 1.0, 1.0).unwrap();
    for i in 0..count {
        let x = (i % 10) as f32 * 1.5 - 7.5;
        let y = (i / 10) as f32 * 1.5;
        world
            .add_body(Body::with_shape(BodyType::Dynamic, Vec2::new(x, y), shape))
            .unwrap();
    }
    world
}

// ============================================================================
// World step benchmarks
// ============================================================================

fn bench_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");

    group.bench_function("single_body_60_steps", |b| {
        b.iter(|| {
            let mut world = falling_boxes_world(1);
            for _ in 0..60 {
                world.step(black_box(1.0 / 60.0));
            }
            world.body_count()
        });
    });

    group.bench_function("fifty_boxes_60_steps", |b| {
        b.iter(|| {
            let mut world = falling_boxes_world(50);
            for _ in 0..60 {
                world.step(black_box(1.0 / 60.0));
            }
            world.contact_count()
        });
    });

    group.bench_function("stack_settled_step", |b| {
        let mut world = falling_boxes_world(30);
        for _ in 0..300 {
            world.step(1.0 / 60.0);
        }
        b.iter(|| {
            world.step(black_box(1.0 / 60.0));
            world.contact_count()
        });
    });

    group.finish();
}

// ============================================================================
// Raycast benchmarks
// ============================================================================

fn bench_raycast(c: &mut Criterion) {
    let mut group = c.benchmark_group("raycast");

    group.bench_function("ray_through_100_circles", |b| {
        let mut world: World = World::new(Vec2::ZERO, 2.0).unwrap();
        let shape = Shape::circle(Material::default(), 0.4).unwrap();
        for i in 0..100 {
            world
                .add_body(Body::with_shape(
                    BodyType::Static,
                    Vec2::new(i as f32, ((i * 7) % 5) as f32 - 2.0),
                    shape,
                ))
                .unwrap();
        }

        let ray = Ray::new(Vec2::new(-1.0, 0.0), Vec2::UNIT_X, 120.0);
        b.iter(|| {
            let mut hits = 0u32;
            world.raycast(black_box(ray), |_, _| {
                hits += 1;
            });
            hits
        });
    });

    group.finish();
}

criterion_group!(benches, bench_world_step, bench_raycast);
criterion_main!(benches);
