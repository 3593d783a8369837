#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use impulse2d::{compute_collision, Material, Shape, Transform, Vec2};

#[derive(Debug, Arbitrary)]
struct CollisionInput {
    /// Positions and angles of the two shapes (small integers keep the
    /// pairs close enough to actually overlap)
    x1: i8,
    y1: i8,
    angle1: i8,
    x2: i8,
    y2: i8,
    angle2: i8,
    /// Shape selectors: even = circle, odd = box
    kind1: u8,
    kind2: u8,
    /// Raw dimensions, mapped into a positive range
    dim1: u8,
    dim2: u8,
    /// Extra polygon points for the polygon path
    points: Vec<(i8, i8)>,
}

fn make_shape(kind: u8, dim: u8, points: &[(i8, i8)]) -> Option<Shape> {
    let size = 0.25 + f32::from(dim) * 0.05;
    let material = Material::default();
    if kind % 2 == 0 {
        Shape::circle(material, size).ok()
    } else if points.len() >= 3 {
        let vertices: Vec<Vec2> = points
            .iter()
            .take(8)
            .map(|&(x, y)| Vec2::new(f32::from(x) * 0.1, f32::from(y) * 0.1))
            .collect();
        Shape::polygon(material, &vertices)
            .or_else(|_| Shape::rectangle(material, size, size))
            .ok()
    } else {
        Shape::rectangle(material, size, size).ok()
    }
}

// Collision detection over arbitrary close-together shape pairs, in both
// argument orders. Must never panic, and every reported manifold must be
// well-formed.
fuzz_target!(|input: CollisionInput| {
    let Some(s1) = make_shape(input.kind1, input.dim1, &input.points) else {
        return;
    };
    let Some(s2) = make_shape(input.kind2, input.dim2, &input.points) else {
        return;
    };

    let tx1 = Transform::with_angle(
        Vec2::new(f32::from(input.x1) * 0.1, f32::from(input.y1) * 0.1),
        f32::from(input.angle1) * 0.05,
    );
    let tx2 = Transform::with_angle(
        Vec2::new(f32::from(input.x2) * 0.1, f32::from(input.y2) * 0.1),
        f32::from(input.angle2) * 0.05,
    );

    for manifold in [
        compute_collision(&s1, tx1, &s2, tx2),
        compute_collision(&s2, tx2, &s1, tx1),
    ]
    .into_iter()
    .flatten()
    {
        assert!(manifold.count >= 1 && manifold.count <= 2);
        for contact in &manifold.contacts[..manifold.count] {
            assert!(contact.point.x.is_finite());
            assert!(contact.point.y.is_finite());
            assert!(contact.depth.is_finite());
        }
    }
});
