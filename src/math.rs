//! 2D Vector and Transform Math
//!
//! Plain `f32` primitives for the simulation core: a 2D vector with full
//! operator overloading, a rotation with cached sine/cosine, and a rigid
//! transform (position + rotation).
//!
//! # Types
//!
//! - [`Vec2`]: 2D vector with dot/cross products and geometric helpers
//! - [`Rot2`]: rotation stored as `(sin, cos)` so hot paths never call trig
//! - [`Transform`]: position + rotation, angle normalized to `[0, 2π)`
//!
//! # Units
//!
//! Lengths are in meters. [`PIXELS_PER_UNIT`] converts to and from screen
//! pixels for callers that work in pixel coordinates.

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// How many pixels represent one unit of length (one meter).
pub const PIXELS_PER_UNIT: f32 = 16.0;

const TWO_PI: f32 = 2.0 * core::f32::consts::PI;
const INV_TWO_PI: f32 = 1.0 / TWO_PI;

// ============================================================================
// Vec2
// ============================================================================

/// 2D vector with `f32` components.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Zero vector (0, 0)
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Unit X vector (1, 0)
    pub const UNIT_X: Self = Self { x: 1.0, y: 0.0 };

    /// Unit Y vector (0, 1)
    pub const UNIT_Y: Self = Self { x: 0.0, y: 1.0 };

    /// Create a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// 2D cross product (returns a scalar: `a.x * b.y - a.y * b.x`).
    ///
    /// This is the z-component of the 3D cross product when both vectors
    /// are embedded in the XY plane, also known as the perpendicular dot
    /// product.
    #[inline]
    #[must_use]
    pub fn cross(self, rhs: Self) -> f32 {
        self.x * rhs.y - self.y * rhs.x
    }

    /// Squared length (avoids sqrt).
    #[inline]
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Length (magnitude).
    #[inline]
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Squared distance to another point.
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        (other - self).length_squared()
    }

    /// Normalize to unit length. Zero-length vectors are returned unchanged.
    #[inline]
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self * (1.0 / len)
        } else {
            self
        }
    }

    /// Unit left-perpendicular: `normalize((-y, x))`.
    #[inline]
    #[must_use]
    pub fn left_normal(self) -> Self {
        Self::new(-self.y, self.x).normalize()
    }

    /// Unit right-perpendicular: `normalize((y, -x))`.
    #[inline]
    #[must_use]
    pub fn right_normal(self) -> Self {
        Self::new(self.y, -self.x).normalize()
    }

    /// Rotate by an angle in radians, counter-clockwise about the origin.
    #[must_use]
    pub fn rotate(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Rotate by a cached rotation.
    #[inline]
    #[must_use]
    pub fn rotate_rot(self, rot: Rot2) -> Self {
        Self {
            x: self.x * rot.cos - self.y * rot.sin,
            y: self.x * rot.sin + self.y * rot.cos,
        }
    }

    /// Apply a full transform: rotate, then translate.
    #[inline]
    #[must_use]
    pub fn transform(self, tx: Transform) -> Self {
        tx.position + self.rotate_rot(tx.rotation)
    }

    /// Convert each component from pixels to units.
    #[inline]
    #[must_use]
    pub fn pixels_to_units(self) -> Self {
        self * (1.0 / PIXELS_PER_UNIT)
    }

    /// Convert each component from units to pixels.
    #[inline]
    #[must_use]
    pub fn units_to_pixels(self) -> Self {
        self * PIXELS_PER_UNIT
    }
}

/// Orientation of the triangle `(v1, v2, v3)`.
///
/// Returns a positive value for a counter-clockwise turn, a negative value
/// for a clockwise turn, and zero when the three points are collinear.
#[inline]
#[must_use]
pub fn counter_clockwise(v1: Vec2, v2: Vec2, v3: Vec2) -> i32 {
    let lhs = (v2.y - v1.y) * (v3.x - v1.x);
    let rhs = (v3.y - v1.y) * (v2.x - v1.x);
    ((lhs > rhs) as i32) - ((lhs < rhs) as i32)
}

/// Convert a scalar from pixels to units.
#[inline]
#[must_use]
pub fn pixels_to_units(k: f32) -> f32 {
    k / PIXELS_PER_UNIT
}

/// Convert a scalar from units to pixels.
#[inline]
#[must_use]
pub fn units_to_pixels(k: f32) -> f32 {
    k * PIXELS_PER_UNIT
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

// ============================================================================
// Rot2
// ============================================================================

/// Rotation stored as cached `(sin, cos)` of the angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rot2 {
    /// Sine of the angle
    pub sin: f32,
    /// Cosine of the angle
    pub cos: f32,
}

impl Rot2 {
    /// Identity rotation (angle 0)
    pub const IDENTITY: Self = Self { sin: 0.0, cos: 1.0 };

    /// Build from an angle in radians.
    #[inline]
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { sin, cos }
    }
}

impl Default for Rot2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ============================================================================
// Transform
// ============================================================================

/// Rigid transform: a position in meters plus a rotation.
///
/// `rotation` always holds the cached sine/cosine of `angle`, and `angle`
/// stays normalized to `[0, 2π)`; both invariants are maintained by
/// [`Transform::set_angle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World-space position
    pub position: Vec2,
    /// Cached rotation of `angle`
    pub rotation: Rot2,
    angle: f32,
}

impl Transform {
    /// Transform at `position` with no rotation.
    #[inline]
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            rotation: Rot2::IDENTITY,
            angle: 0.0,
        }
    }

    /// Transform at `position` rotated by `angle` radians.
    #[must_use]
    pub fn with_angle(position: Vec2, angle: f32) -> Self {
        let mut tx = Self::new(position);
        tx.set_angle(angle);
        tx
    }

    /// Rotation angle in radians, in `[0, 2π)`.
    #[inline]
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Set the rotation angle, normalizing it and refreshing the cached
    /// sine/cosine.
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = normalize_angle(angle);
        self.rotation = Rot2::from_angle(self.angle);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

/// Normalize an angle to the range `[0, 2π)`.
#[inline]
#[must_use]
pub fn normalize_angle(angle: f32) -> f32 {
    angle - TWO_PI * (angle * INV_TWO_PI).floor()
}

// ============================================================================
// Tests
// ============================================================================
