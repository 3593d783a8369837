//! Rigid Bodies
//!
//! A [`Body`] owns a collision shape, a transform, and its motion state
//! (mass, inertia, velocity, force accumulators). Mass and inertia are
//! derived from the shape's material and recomputed whenever the body
//! type, the property flags, or the shape change; the bounding box is
//! refreshed on every transform or shape mutation.
//!
//! Bodies are generic over an opaque user payload `U` that the engine
//! never inspects.

use crate::aabb::Aabb;
use crate::math::{Transform, Vec2};
use crate::shape::{Shape, ShapeKind};

/// Type of a rigid body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyType {
    /// Immovable: velocity pinned to zero, mass treated as infinite.
    Static,
    /// User-controlled velocity; pushes dynamic bodies but is unaffected
    /// by forces, gravity, and impulses.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

/// Property flag bits of a rigid body.
pub type BodyFlags = u8;

/// No flags set.
pub const FLAG_NONE: BodyFlags = 0;
/// Treat the body's mass as infinite even when dynamic.
pub const FLAG_INFINITE_MASS: BodyFlags = 1 << 0;
/// Treat the body's moment of inertia as infinite even when dynamic.
pub const FLAG_INFINITE_INERTIA: BodyFlags = 1 << 1;

/// Motion state of a rigid body.
///
/// Inverse fields are zero exactly when the positive field is zero, which
/// is how infinite mass and inertia are represented throughout the solver.
#[derive(Clone, Copy, Debug)]
struct Motion {
    mass: f32,
    inverse_mass: f32,
    inertia: f32,
    inverse_inertia: f32,
    gravity_scale: f32,
    velocity: Vec2,
    angular_velocity: f32,
    force: Vec2,
    torque: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            mass: 0.0,
            inverse_mass: 0.0,
            inertia: 0.0,
            inverse_inertia: 0.0,
            gravity_scale: 1.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
        }
    }
}

/// A rigid body with an optional collision shape and an opaque user
/// payload.
#[derive(Clone, Debug)]
pub struct Body<U = ()> {
    body_type: BodyType,
    flags: BodyFlags,
    shape: Option<Shape>,
    transform: Transform,
    motion: Motion,
    aabb: Aabb,
    user: Option<U>,
}

impl<U> Body<U> {
    /// Create a body of the given type at `position`, with no shape.
    #[must_use]
    pub fn new(body_type: BodyType, position: Vec2) -> Self {
        Self {
            body_type,
            flags: FLAG_NONE,
            shape: None,
            transform: Transform::new(position),
            motion: Motion::default(),
            aabb: Aabb::default(),
            user: None,
        }
    }

    /// Create a body at `position` with `shape` already attached.
    #[must_use]
    pub fn with_shape(body_type: BodyType, position: Vec2, shape: Shape) -> Self {
        let mut body = Self::new(body_type, position);
        body.set_shape(Some(shape));
        body
    }

    /// Body type.
    #[inline]
    #[must_use]
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Change the body type, recomputing mass and inertia.
    pub fn set_body_type(&mut self, body_type: BodyType) {
        self.body_type = body_type;
        self.compute_mass();
    }

    /// Property flags.
    #[inline]
    #[must_use]
    pub fn flags(&self) -> BodyFlags {
        self.flags
    }

    /// Replace the property flags, recomputing mass and inertia.
    pub fn set_flags(&mut self, flags: BodyFlags) {
        self.flags = flags;
        self.compute_mass();
    }

    /// Attached shape, if any.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    /// Attach a shape, or detach with `None`. Refreshes the bounding box
    /// and recomputes mass and inertia.
    pub fn set_shape(&mut self, shape: Option<Shape>) {
        self.shape = shape;
        self.aabb = match &self.shape {
            Some(s) => s.aabb(self.transform),
            None => Aabb::default(),
        };
        self.compute_mass();
    }

    /// Current transform.
    #[inline]
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Replace the transform and refresh the bounding box.
    pub fn set_transform(&mut self, tx: Transform) {
        self.transform = tx;
        self.refresh_aabb();
    }

    /// World-space position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.transform.position
    }

    /// Move the body and refresh the bounding box.
    pub fn set_position(&mut self, position: Vec2) {
        self.transform.position = position;
        self.refresh_aabb();
    }

    /// Rotation angle in radians, normalized to `[0, 2π)`.
    #[inline]
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.transform.angle()
    }

    /// Rotate the body and refresh the bounding box.
    pub fn set_angle(&mut self, angle: f32) {
        self.transform.set_angle(angle);
        self.refresh_aabb();
    }

    /// Mass (zero means infinite).
    #[inline]
    #[must_use]
    pub fn mass(&self) -> f32 {
        self.motion.mass
    }

    /// Inverse mass (zero means infinite mass).
    #[inline]
    #[must_use]
    pub fn inverse_mass(&self) -> f32 {
        self.motion.inverse_mass
    }

    /// Moment of inertia (zero means infinite).
    #[inline]
    #[must_use]
    pub fn inertia(&self) -> f32 {
        self.motion.inertia
    }

    /// Inverse moment of inertia (zero means infinite inertia).
    #[inline]
    #[must_use]
    pub fn inverse_inertia(&self) -> f32 {
        self.motion.inverse_inertia
    }

    /// Gravity multiplier (1 = normal gravity).
    #[inline]
    #[must_use]
    pub fn gravity_scale(&self) -> f32 {
        self.motion.gravity_scale
    }

    /// Set the gravity multiplier.
    #[inline]
    pub fn set_gravity_scale(&mut self, scale: f32) {
        self.motion.gravity_scale = scale;
    }

    /// Linear velocity.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.motion.velocity
    }

    /// Set the linear velocity.
    #[inline]
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.motion.velocity = velocity;
    }

    /// Angular velocity in radians per second (positive = CCW).
    #[inline]
    #[must_use]
    pub fn angular_velocity(&self) -> f32 {
        self.motion.angular_velocity
    }

    /// Set the angular velocity.
    #[inline]
    pub fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.motion.angular_velocity = angular_velocity;
    }

    /// Bounding box of the attached shape under the current transform.
    #[inline]
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        if self.shape.is_some() {
            self.aabb
        } else {
            Aabb::default()
        }
    }

    /// User payload, if any.
    #[inline]
    #[must_use]
    pub fn user_data(&self) -> Option<&U> {
        self.user.as_ref()
    }

    /// Mutable user payload, if any.
    #[inline]
    pub fn user_data_mut(&mut self) -> Option<&mut U> {
        self.user.as_mut()
    }

    /// Replace the user payload.
    #[inline]
    pub fn set_user_data(&mut self, user: Option<U>) {
        self.user = user;
    }

    /// Check whether a world-space point lies inside the body's shape.
    /// Bodies without a shape contain nothing.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        let Some(shape) = &self.shape else {
            return false;
        };
        match shape.kind() {
            ShapeKind::Circle { radius } => {
                self.transform.position.distance_squared(point) <= radius * radius
            }
            ShapeKind::Polygon { .. } => {
                let local =
                    (point - self.transform.position).rotate(-self.transform.angle());
                let vertices = shape.vertices();
                let normals = shape.normals();
                for (i, &n) in normals.iter().enumerate() {
                    if n.dot(local - vertices[i]) > 0.0 {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Zero the force and torque accumulators.
    #[inline]
    pub fn clear_forces(&mut self) {
        self.motion.force = Vec2::ZERO;
        self.motion.torque = 0.0;
    }

    /// Accumulate a force applied at offset `point` from the center of
    /// mass. Bodies with infinite mass ignore forces.
    pub fn apply_force(&mut self, point: Vec2, force: Vec2) {
        if self.motion.inverse_mass <= 0.0 {
            return;
        }
        self.motion.force += force;
        self.motion.torque += point.cross(force);
    }

    /// Accumulate the gravity force `g * gravity_scale * mass`.
    pub fn apply_gravity(&mut self, gravity: Vec2) {
        if self.motion.mass <= 0.0 {
            return;
        }
        self.motion.force += gravity * (self.motion.gravity_scale * self.motion.mass);
    }

    /// Apply an impulse at offset `point` from the center of mass,
    /// changing velocity immediately. Bodies with infinite mass ignore
    /// impulses.
    pub fn apply_impulse(&mut self, point: Vec2, impulse: Vec2) {
        if self.motion.inverse_mass <= 0.0 {
            return;
        }
        self.motion.velocity += impulse * self.motion.inverse_mass;
        self.motion.angular_velocity += self.motion.inverse_inertia * point.cross(impulse);
    }

    /// Integrate accumulated forces into velocity over `dt`
    /// (semi-implicit Euler, velocity half).
    pub fn integrate_velocity(&mut self, dt: f32) {
        if self.motion.inverse_mass <= 0.0 || dt <= 0.0 {
            return;
        }
        self.motion.velocity += self.motion.force * (self.motion.inverse_mass * dt);
        self.motion.angular_velocity += self.motion.torque * self.motion.inverse_inertia * dt;
    }

    /// Integrate velocity into position over `dt` (semi-implicit Euler,
    /// position half). Static bodies never move.
    pub fn integrate_position(&mut self, dt: f32) {
        if self.body_type == BodyType::Static || dt <= 0.0 {
            return;
        }
        self.transform.position += self.motion.velocity * dt;
        self.transform
            .set_angle(self.transform.angle() + self.motion.angular_velocity * dt);
        self.refresh_aabb();
    }

    fn refresh_aabb(&mut self) {
        if let Some(shape) = &self.shape {
            self.aabb = shape.aabb(self.transform);
        }
    }

    /// Recompute mass and inertia from type, flags, and shape.
    fn compute_mass(&mut self) {
        self.motion.mass = 0.0;
        self.motion.inverse_mass = 0.0;
        self.motion.inertia = 0.0;
        self.motion.inverse_inertia = 0.0;

        match self.body_type {
            BodyType::Static => {
                self.motion.velocity = Vec2::ZERO;
                self.motion.angular_velocity = 0.0;
            }
            BodyType::Dynamic => {
                if let Some(shape) = &self.shape {
                    if self.flags & FLAG_INFINITE_MASS == 0 {
                        self.motion.mass = shape.mass();
                        if self.motion.mass > 0.0 {
                            self.motion.inverse_mass = 1.0 / self.motion.mass;
                        }
                    }
                    if self.flags & FLAG_INFINITE_INERTIA == 0 {
                        self.motion.inertia = shape.inertia();
                        if self.motion.inertia > 0.0 {
                            self.motion.inverse_inertia = 1.0 / self.motion.inertia;
                        }
                    }
                }
            }
            // Kinematic bodies keep zero mass and inertia but retain their
            // user-set velocity.
            BodyType::Kinematic => {}
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;

    const EPS: f32 = 1e-6;

    fn square(side: f32) -> Shape {
        Shape::rectangle(Material::new(2.0, 0.5, 0.0), side, side).unwrap()
    }

    #[test]
    fn test_dynamic_mass_from_shape() {
        let body: Body = Body::with_shape(BodyType::Dynamic, Vec2::ZERO, square(2.0));
        assert!((body.mass() - 8.0).abs() < EPS);
        assert!((body.inverse_mass() - 0.125).abs() < EPS);
        assert!(body.inertia() > 0.0);
        assert!((body.inverse_inertia() - 1.0 / body.inertia()).abs() < EPS);
    }

    #[test]
    fn test_static_and_kinematic_have_infinite_mass() {
        let s: Body = Body::with_shape(BodyType::Static, Vec2::ZERO, square(2.0));
        assert_eq!(s.mass(), 0.0);
        assert_eq!(s.inverse_mass(), 0.0);

        let mut k: Body = Body::with_shape(BodyType::Kinematic, Vec2::ZERO, square(2.0));
        k.set_velocity(Vec2::new(1.0, 0.0));
        assert_eq!(k.inverse_mass(), 0.0);
        // Kinematic bodies keep their velocity through mass recomputation
        k.set_flags(FLAG_NONE);
        assert_eq!(k.velocity(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_infinite_mass_flags() {
        let mut body: Body = Body::with_shape(BodyType::Dynamic, Vec2::ZERO, square(1.0));
        body.set_flags(FLAG_INFINITE_MASS);
        assert_eq!(body.inverse_mass(), 0.0);
        assert!(body.inverse_inertia() > 0.0);
        body.set_flags(FLAG_INFINITE_MASS | FLAG_INFINITE_INERTIA);
        assert_eq!(body.inverse_inertia(), 0.0);
    }

    #[test]
    fn test_force_integration() {
        let mut body: Body = Body::with_shape(BodyType::Dynamic, Vec2::ZERO, square(1.0));
        let m = body.mass();
        body.apply_force(Vec2::ZERO, Vec2::new(2.0 * m, 0.0));
        body.integrate_velocity(0.5);
        assert!((body.velocity().x - 1.0).abs() < EPS);
        body.clear_forces();
        body.integrate_velocity(0.5);
        assert!((body.velocity().x - 1.0).abs() < EPS);
    }

    #[test]
    fn test_impulse_at_offset_spins() {
        let mut body: Body = Body::with_shape(BodyType::Dynamic, Vec2::ZERO, square(1.0));
        body.apply_impulse(Vec2::new(0.5, 0.0), Vec2::new(0.0, 1.0));
        assert!(body.angular_velocity() > 0.0);
        assert!(body.velocity().y > 0.0);
    }

    #[test]
    fn test_static_skips_position_integration() {
        let mut body: Body = Body::with_shape(BodyType::Static, Vec2::new(1.0, 1.0), square(1.0));
        body.integrate_position(1.0);
        assert_eq!(body.position(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_kinematic_integrates_position() {
        let mut body: Body =
            Body::with_shape(BodyType::Kinematic, Vec2::ZERO, square(1.0));
        body.set_velocity(Vec2::new(2.0, 0.0));
        body.apply_gravity(Vec2::new(0.0, 9.8));
        body.integrate_velocity(1.0);
        body.integrate_position(0.5);
        // Gravity and forces are ignored, user velocity is not
        assert_eq!(body.velocity(), Vec2::new(2.0, 0.0));
        assert!((body.position().x - 1.0).abs() < EPS);
    }

    #[test]
    fn test_aabb_follows_transform() {
        let mut body: Body = Body::with_shape(BodyType::Dynamic, Vec2::ZERO, square(2.0));
        body.set_position(Vec2::new(10.0, 0.0));
        let aabb = body.aabb();
        assert!((aabb.x - 9.0).abs() < EPS);
        // A detached shape leaves an empty box
        body.set_shape(None);
        assert_eq!(body.aabb(), Aabb::default());
    }

    #[test]
    fn test_contains_point() {
        let mut body: Body = Body::with_shape(BodyType::Dynamic, Vec2::ZERO, square(2.0));
        assert!(body.contains_point(Vec2::new(0.9, 0.9)));
        assert!(!body.contains_point(Vec2::new(1.1, 0.0)));
        body.set_angle(core::f32::consts::FRAC_PI_4);
        // Rotated square: the old corner direction now pokes out further
        assert!(body.contains_point(Vec2::new(1.3, 0.0)));
        assert!(!body.contains_point(Vec2::new(1.3, 1.3)));

        let circle: Body = Body::with_shape(
            BodyType::Dynamic,
            Vec2::new(5.0, 0.0),
            Shape::circle(Material::default(), 1.0).unwrap(),
        );
        assert!(circle.contains_point(Vec2::new(5.5, 0.0)));
        assert!(!circle.contains_point(Vec2::new(6.5, 0.0)));
    }

    #[test]
    fn test_user_data_round_trip() {
        let mut body: Body<&'static str> = Body::new(BodyType::Dynamic, Vec2::ZERO);
        assert!(body.user_data().is_none());
        body.set_user_data(Some("player"));
        assert_eq!(body.user_data(), Some(&"player"));
    }
}
