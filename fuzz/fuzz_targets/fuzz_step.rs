#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use impulse2d::{Body, BodyType, Material, Shape, Vec2, World, DEFAULT_GRAVITY};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Number of bodies to add (capped)
    body_count: u8,
    /// Position components
    positions: Vec<(i16, i16)>,
    /// Per-body type selector and shape size
    kinds: Vec<(u8, u8)>,
    /// Number of simulation steps (capped)
    step_count: u8,
}

// Build a world from arbitrary bodies and step it. Must never panic
// regardless of input, and body state must stay finite.
fuzz_target!(|input: FuzzInput| {
    let mut world: World = World::new(DEFAULT_GRAVITY, 1.0).unwrap();

    let body_count = (input.body_count as usize).min(16);
    for i in 0..body_count {
        let (px, py) = input.positions.get(i).copied().unwrap_or((0, 0));
        let (kind, dim) = input.kinds.get(i).copied().unwrap_or((0, 4));

        let size = 0.25 + f32::from(dim) * 0.02;
        let shape = if kind % 2 == 0 {
            Shape::circle(Material::default(), size).unwrap()
        } else {
            Shape::rectangle(Material::default(), size, size).unwrap()
        };

        let body_type = match kind % 3 {
            0 => BodyType::Dynamic,
            1 => BodyType::Static,
            _ => BodyType::Kinematic,
        };

        let position = Vec2::new(f32::from(px) * 0.05, f32::from(py) * 0.05);
        let _ = world.add_body(Body::with_shape(body_type, position, shape));
    }

    let steps = (input.step_count as usize).min(32);
    for _ in 0..steps {
        world.step(1.0 / 60.0);
    }

    for (_, body) in world.bodies() {
        assert!(body.position().x.is_finite());
        assert!(body.position().y.is_finite());
        assert!(body.velocity().x.is_finite());
        assert!(body.velocity().y.is_finite());
    }
});
