//! Sequential-Impulse Contact Solver
//!
//! Velocity-level constraint resolution. Each solver iteration walks every
//! cached contact and applies a normal impulse that cancels the closing
//! velocity (plus a Baumgarte bias that bleeds off penetration) and a
//! tangent impulse clamped to the Coulomb friction cone. Impulse
//! magnitudes accumulate in the per-contact cache; on the next step the
//! accumulated impulses are re-applied once before the iterative loop
//! (warm starting), which is what lets stacks come to rest.

use crate::body::{Body, BodyType};
use crate::collision::Manifold;
use crate::math::Vec2;

/// Bias factor of the Baumgarte stabilization scheme.
pub const BAUMGARTE_FACTOR: f32 = 0.24;

/// Penetration slop tolerated before the Baumgarte bias kicks in.
pub const BAUMGARTE_SLOP: f32 = 0.01;

/// Solver iterations per step.
pub const SOLVER_ITERATIONS: usize = 12;

/// Velocity of the contact point relative to body 1.
#[inline]
fn relative_velocity<U>(b1: &Body<U>, b2: &Body<U>, r1: Vec2, r2: Vec2) -> Vec2 {
    // In 2D, omega x r is the scaled left-perpendicular of r.
    let w1 = Vec2::new(-r1.y, r1.x) * b1.angular_velocity();
    let w2 = Vec2::new(-r2.y, r2.x) * b2.angular_velocity();
    b2.velocity() + w2 - b1.velocity() - w1
}

/// Re-apply the accumulated impulses of every contact once, before the
/// iterative loop (warm starting). Contacts that were not matched in the
/// cache carry zero impulse, so this is a no-op for them.
pub fn apply_accumulated_impulses<U>(b1: &mut Body<U>, b2: &mut Body<U>, manifold: &Manifold) {
    let normal = manifold.direction;
    let tangent = Vec2::new(normal.y, -normal.x);

    for contact in &manifold.contacts[..manifold.count] {
        let r1 = contact.point - b1.position();
        let r2 = contact.point - b2.position();

        let impulse =
            normal * contact.cache.normal_impulse + tangent * contact.cache.tangent_impulse;

        b1.apply_impulse(r1, -impulse);
        b2.apply_impulse(r2, impulse);
    }
}

/// Run one solver iteration over a manifold's contacts.
pub fn resolve_collision<U>(
    b1: &mut Body<U>,
    b2: &mut Body<U>,
    manifold: &mut Manifold,
    inverse_dt: f32,
) {
    if b1.inverse_mass() + b2.inverse_mass() <= 0.0 {
        // Nothing to solve; just keep static bodies pinned in case user
        // code set a velocity on one.
        if b1.body_type() == BodyType::Static {
            b1.set_velocity(Vec2::ZERO);
            b1.set_angular_velocity(0.0);
        }
        if b2.body_type() == BodyType::Static {
            b2.set_velocity(Vec2::ZERO);
            b2.set_angular_velocity(0.0);
        }
        return;
    }

    let normal = manifold.direction;
    let tangent = Vec2::new(normal.y, -normal.x);

    for contact in manifold.contacts[..manifold.count].iter_mut() {
        let r1 = contact.point - b1.position();
        let r2 = contact.point - b2.position();

        let normal_dot = relative_velocity(b1, b2, r1, r2).dot(normal);

        // Already separating at this point; leave it to restitution from
        // earlier iterations.
        if normal_dot > 0.0 {
            continue;
        }

        let r1_cross_n = r1.cross(normal);
        let r2_cross_n = r2.cross(normal);

        let normal_mass = (b1.inverse_mass() + b2.inverse_mass())
            + b1.inverse_inertia() * (r1_cross_n * r1_cross_n)
            + b2.inverse_inertia() * (r2_cross_n * r2_cross_n);
        if normal_mass <= 0.0 {
            continue;
        }

        let bias = -(BAUMGARTE_FACTOR * inverse_dt)
            * (-contact.depth + BAUMGARTE_SLOP).min(0.0);

        let normal_scalar =
            (-(1.0 + manifold.restitution) * normal_dot + bias) / normal_mass;
        contact.cache.normal_impulse += normal_scalar;

        let normal_impulse = normal * normal_scalar;
        b1.apply_impulse(r1, -normal_impulse);
        b2.apply_impulse(r2, normal_impulse);

        // Friction sees the velocities left after the normal impulse.
        let tangent_dot = relative_velocity(b1, b2, r1, r2).dot(tangent);

        let r1_cross_t = r1.cross(tangent);
        let r2_cross_t = r2.cross(tangent);

        let tangent_mass = (b1.inverse_mass() + b2.inverse_mass())
            + b1.inverse_inertia() * (r1_cross_t * r1_cross_t)
            + b2.inverse_inertia() * (r2_cross_t * r2_cross_t);
        if tangent_mass <= 0.0 {
            continue;
        }

        let max_tangent_scalar = manifold.friction * normal_scalar;
        let tangent_scalar =
            (-tangent_dot / tangent_mass).clamp(-max_tangent_scalar, max_tangent_scalar);
        contact.cache.tangent_impulse += tangent_scalar;

        let tangent_impulse = tangent * tangent_scalar;
        b1.apply_impulse(r1, -tangent_impulse);
        b2.apply_impulse(r2, tangent_impulse);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Body, BodyType};
    use crate::collision::compute_collision;
    use crate::material::Material;
    use crate::shape::Shape;

    fn dynamic_circle(x: f32, y: f32, restitution: f32) -> Body {
        Body::with_shape(
            BodyType::Dynamic,
            Vec2::new(x, y),
            Shape::circle(Material::new(1.0, 0.0, restitution), 0.5).unwrap(),
        )
    }

    fn collide(b1: &Body, b2: &Body) -> Manifold {
        let mut m = compute_collision(
            b1.shape().unwrap(),
            b1.transform(),
            b2.shape().unwrap(),
            b2.transform(),
        )
        .expect("bodies must overlap");
        m.friction = 0.0;
        m.restitution = b1
            .shape()
            .unwrap()
            .restitution()
            .min(b2.shape().unwrap().restitution());
        m
    }

    #[test]
    fn test_elastic_head_on_swaps_velocities() {
        // Barely touching, so the Baumgarte bias stays silent and the
        // whole exchange is restitution.
        let mut b1 = dynamic_circle(-0.4975, 0.0, 1.0);
        let mut b2 = dynamic_circle(0.4975, 0.0, 1.0);
        b1.set_velocity(Vec2::new(1.0, 0.0));
        b2.set_velocity(Vec2::new(-1.0, 0.0));

        let mut manifold = collide(&b1, &b2);
        for _ in 0..SOLVER_ITERATIONS {
            resolve_collision(&mut b1, &mut b2, &mut manifold, 60.0);
        }

        assert!((b1.velocity().x + 1.0).abs() < 1e-3);
        assert!((b2.velocity().x - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_relative_velocity_stays_put() {
        // Touching, e = 0, mu = 0, depth within the slop: nothing happens.
        let mut b1 = dynamic_circle(-0.499, 0.0, 0.0);
        let mut b2 = dynamic_circle(0.499, 0.0, 0.0);

        let mut manifold = collide(&b1, &b2);
        for _ in 0..SOLVER_ITERATIONS {
            resolve_collision(&mut b1, &mut b2, &mut manifold, 60.0);
        }

        assert!(b1.velocity().length() < 1e-6);
        assert!(b2.velocity().length() < 1e-6);
    }

    #[test]
    fn test_separating_contact_is_skipped() {
        let mut b1 = dynamic_circle(-0.45, 0.0, 1.0);
        let mut b2 = dynamic_circle(0.45, 0.0, 1.0);
        b1.set_velocity(Vec2::new(-1.0, 0.0));
        b2.set_velocity(Vec2::new(1.0, 0.0));

        let mut manifold = collide(&b1, &b2);
        resolve_collision(&mut b1, &mut b2, &mut manifold, 60.0);

        assert_eq!(b1.velocity(), Vec2::new(-1.0, 0.0));
        assert_eq!(b2.velocity(), Vec2::new(1.0, 0.0));
        assert_eq!(manifold.contacts[0].cache.normal_impulse, 0.0);
    }

    #[test]
    fn test_warm_start_applies_cached_impulses() {
        let mut b1 = dynamic_circle(-0.45, 0.0, 0.0);
        let mut b2 = dynamic_circle(0.45, 0.0, 0.0);
        let m1 = b1.mass();

        let mut manifold = collide(&b1, &b2);
        manifold.contacts[0].cache.normal_impulse = 2.0;
        // Single contact stored twice; only the first `count` entries apply
        apply_accumulated_impulses(&mut b1, &mut b2, &manifold);

        assert!((b1.velocity().x + 2.0 / m1).abs() < 1e-5);
        assert!((b2.velocity().x - 2.0 / m1).abs() < 1e-5);
    }

    #[test]
    fn test_infinite_mass_pair_pins_static_velocity() {
        let shape = Shape::circle(Material::default(), 0.5).unwrap();
        let mut b1: Body = Body::with_shape(BodyType::Static, Vec2::new(-0.4, 0.0), shape);
        let mut b2: Body = Body::with_shape(BodyType::Static, Vec2::new(0.4, 0.0), shape);
        b1.set_velocity(Vec2::new(5.0, 0.0));

        let mut manifold = collide(&b1, &b2);
        resolve_collision(&mut b1, &mut b2, &mut manifold, 60.0);
        assert_eq!(b1.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_baumgarte_bias_pushes_apart() {
        // Deep overlap, zero velocity: only the bias produces impulse.
        let mut b1 = dynamic_circle(-0.25, 0.0, 0.0);
        let mut b2 = dynamic_circle(0.25, 0.0, 0.0);

        let mut manifold = collide(&b1, &b2);
        resolve_collision(&mut b1, &mut b2, &mut manifold, 60.0);

        assert!(b1.velocity().x < 0.0);
        assert!(b2.velocity().x > 0.0);
        assert!(manifold.contacts[0].cache.normal_impulse > 0.0);
    }
}
