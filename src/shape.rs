//! Collision Shapes
//!
//! A [`Shape`] is an immutable-after-construction description of a convex
//! collider: either a circle or a convex polygon of at most
//! [`MAX_POLYGON_VERTICES`] vertices. Construction reduces arbitrary point
//! sets to their counter-clockwise convex hull (gift wrapping), derives
//! outward edge normals, and caches the area so mass and inertia queries
//! are cheap.
//!
//! Shapes are `Copy`: a body holds its shape by value, and "sharing" a
//! shape between bodies is just copying it.

use crate::aabb::Aabb;
use crate::error::PhysicsError;
use crate::material::Material;
use crate::math::{counter_clockwise, Transform, Vec2};

/// Maximum number of vertices for a convex polygon.
pub const MAX_POLYGON_VERTICES: usize = 8;

// ============================================================================
// Vertices
// ============================================================================

/// Inline vertex storage for a convex polygon (at most
/// [`MAX_POLYGON_VERTICES`] entries).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertices {
    data: [Vec2; MAX_POLYGON_VERTICES],
    len: usize,
}

impl Vertices {
    /// Empty vertex list.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: [Vec2::ZERO; MAX_POLYGON_VERTICES],
            len: 0,
        }
    }

    /// Build from a slice. Returns `None` if the slice has more than
    /// [`MAX_POLYGON_VERTICES`] entries.
    #[must_use]
    pub fn from_slice(points: &[Vec2]) -> Option<Self> {
        if points.len() > MAX_POLYGON_VERTICES {
            return None;
        }
        let mut v = Self::new();
        for &p in points {
            v.data[v.len] = p;
            v.len += 1;
        }
        Some(v)
    }

    /// Number of stored vertices.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when no vertices are stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stored vertices as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Vec2] {
        &self.data[..self.len]
    }

    /// Append a vertex. Silently ignored when full.
    #[inline]
    pub fn push(&mut self, p: Vec2) {
        if self.len < MAX_POLYGON_VERTICES {
            self.data[self.len] = p;
            self.len += 1;
        }
    }
}

impl core::ops::Index<usize> for Vertices {
    type Output = Vec2;

    #[inline]
    fn index(&self, i: usize) -> &Vec2 {
        &self.data[..self.len][i]
    }
}

// ============================================================================
// Shape
// ============================================================================

/// Geometry variant of a shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeKind {
    /// Circle centered on the body origin.
    Circle {
        /// Radius, `> 0`
        radius: f32,
    },
    /// Convex polygon in counter-clockwise winding.
    Polygon {
        /// Hull vertices in CCW order
        vertices: Vertices,
        /// `normals[i]` is the unit left-perpendicular of the edge
        /// `vertices[i - 1] -> vertices[i]` (indices mod count)
        normals: Vertices,
    },
}

/// Convex collision shape with material and cached area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shape {
    material: Material,
    area: f32,
    kind: ShapeKind,
}

impl Shape {
    /// Create a circle shape. Fails unless `radius > 0`.
    pub fn circle(material: Material, radius: f32) -> Result<Self, PhysicsError> {
        if !(radius > 0.0) {
            return Err(PhysicsError::InvalidShape {
                reason: "circle radius must be positive",
            });
        }
        Ok(Self {
            material,
            area: core::f32::consts::PI * radius * radius,
            kind: ShapeKind::Circle { radius },
        })
    }

    /// Create an axis-aligned rectangle shape of the given full extents.
    /// Fails unless both extents are positive.
    pub fn rectangle(material: Material, width: f32, height: f32) -> Result<Self, PhysicsError> {
        if !(width > 0.0) || !(height > 0.0) {
            return Err(PhysicsError::InvalidShape {
                reason: "rectangle extents must be positive",
            });
        }
        let hw = 0.5 * width;
        let hh = 0.5 * height;
        Self::polygon(
            material,
            &[
                Vec2::new(-hw, -hh),
                Vec2::new(-hw, hh),
                Vec2::new(hw, hh),
                Vec2::new(hw, -hh),
            ],
        )
    }

    /// Create a convex polygon shape from an unordered point set.
    ///
    /// The points are reduced to their CCW convex hull; at least three
    /// non-collinear points (and at most [`MAX_POLYGON_VERTICES`]) are
    /// required.
    pub fn polygon(material: Material, points: &[Vec2]) -> Result<Self, PhysicsError> {
        let mut shape = Self {
            material,
            area: 0.0,
            kind: ShapeKind::Polygon {
                vertices: Vertices::new(),
                normals: Vertices::new(),
            },
        };
        shape.set_vertices(points)?;
        Ok(shape)
    }

    /// Shape material.
    #[inline]
    #[must_use]
    pub fn material(&self) -> Material {
        self.material
    }

    /// Geometry variant.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// Mass per unit of area.
    #[inline]
    #[must_use]
    pub fn density(&self) -> f32 {
        self.material.density
    }

    /// Coulomb friction coefficient.
    #[inline]
    #[must_use]
    pub fn friction(&self) -> f32 {
        self.material.friction
    }

    /// Restitution coefficient.
    #[inline]
    #[must_use]
    pub fn restitution(&self) -> f32 {
        self.material.restitution
    }

    /// Cached area.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f32 {
        self.area
    }

    /// Mass: `density * area`.
    #[inline]
    #[must_use]
    pub fn mass(&self) -> f32 {
        self.material.density * self.area
    }

    /// Moment of inertia about the body origin.
    ///
    /// Circle: `0.5 * m * r^2`. Polygon: the standard edge-sum formula;
    /// degenerate (zero-area) polygons yield zero.
    #[must_use]
    pub fn inertia(&self) -> f32 {
        if self.material.density <= 0.0 {
            return 0.0;
        }
        match &self.kind {
            ShapeKind::Circle { radius } => 0.5 * self.mass() * radius * radius,
            ShapeKind::Polygon { vertices, .. } => {
                let n = vertices.len();
                let mut numerator = 0.0f32;
                let mut denominator = 0.0f32;
                let mut j = n - 1;
                for i in 0..n {
                    let v1 = vertices[j];
                    let v2 = vertices[i];
                    let cross = v1.cross(v2);
                    let dot_sum = v1.dot(v1) + v1.dot(v2) + v2.dot(v2);
                    numerator += cross * dot_sum;
                    denominator += cross;
                    j = i;
                }
                if denominator == 0.0 {
                    return 0.0;
                }
                self.material.density * (numerator / (6.0 * denominator))
            }
        }
    }

    /// Circle radius, or 0 for polygons.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> f32 {
        match self.kind {
            ShapeKind::Circle { radius } => radius,
            ShapeKind::Polygon { .. } => 0.0,
        }
    }

    /// Hull vertices, or an empty slice for circles.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        match &self.kind {
            ShapeKind::Polygon { vertices, .. } => vertices.as_slice(),
            ShapeKind::Circle { .. } => &[],
        }
    }

    /// Outward edge normals, or an empty slice for circles.
    #[inline]
    #[must_use]
    pub fn normals(&self) -> &[Vec2] {
        match &self.kind {
            ShapeKind::Polygon { normals, .. } => normals.as_slice(),
            ShapeKind::Circle { .. } => &[],
        }
    }

    /// Bounding box of the shape under a transform.
    #[must_use]
    pub fn aabb(&self, tx: Transform) -> Aabb {
        match &self.kind {
            ShapeKind::Circle { radius } => Aabb::new(
                tx.position.x - radius,
                tx.position.y - radius,
                2.0 * radius,
                2.0 * radius,
            ),
            ShapeKind::Polygon { vertices, .. } => {
                let mut min = Vec2::new(f32::MAX, f32::MAX);
                let mut max = Vec2::new(f32::MIN, f32::MIN);
                for &v in vertices.as_slice() {
                    let w = v.transform(tx);
                    min.x = min.x.min(w.x);
                    min.y = min.y.min(w.y);
                    max.x = max.x.max(w.x);
                    max.y = max.y.max(w.y);
                }
                Aabb::new(min.x, min.y, max.x - min.x, max.y - min.y)
            }
        }
    }

    /// Replace the material.
    #[inline]
    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    /// Replace the density.
    #[inline]
    pub fn set_density(&mut self, density: f32) {
        self.material.density = density;
    }

    /// Replace the friction coefficient.
    #[inline]
    pub fn set_friction(&mut self, friction: f32) {
        self.material.friction = friction;
    }

    /// Replace the restitution coefficient.
    #[inline]
    pub fn set_restitution(&mut self, restitution: f32) {
        self.material.restitution = restitution;
    }

    /// Resize a circle. Fails on polygons and non-positive radii.
    pub fn set_radius(&mut self, radius: f32) -> Result<(), PhysicsError> {
        if !(radius > 0.0) {
            return Err(PhysicsError::InvalidShape {
                reason: "circle radius must be positive",
            });
        }
        match &mut self.kind {
            ShapeKind::Circle { radius: r } => {
                *r = radius;
                self.area = core::f32::consts::PI * radius * radius;
                Ok(())
            }
            ShapeKind::Polygon { .. } => Err(PhysicsError::InvalidShape {
                reason: "set_radius requires a circle shape",
            }),
        }
    }

    /// Resize a rectangle (any polygon is replaced by the new box hull).
    pub fn set_rectangle_dimensions(
        &mut self,
        width: f32,
        height: f32,
    ) -> Result<(), PhysicsError> {
        if !(width > 0.0) || !(height > 0.0) {
            return Err(PhysicsError::InvalidShape {
                reason: "rectangle extents must be positive",
            });
        }
        let hw = 0.5 * width;
        let hh = 0.5 * height;
        self.set_vertices(&[
            Vec2::new(-hw, -hh),
            Vec2::new(-hw, hh),
            Vec2::new(hw, hh),
            Vec2::new(hw, -hh),
        ])
    }

    /// Replace a polygon's vertices with the convex hull of `points`,
    /// re-deriving normals and area. Fails on circles, on fewer than three
    /// points, on more than [`MAX_POLYGON_VERTICES`], and on point sets
    /// whose hull collapses to a segment.
    pub fn set_vertices(&mut self, points: &[Vec2]) -> Result<(), PhysicsError> {
        if matches!(self.kind, ShapeKind::Circle { .. }) {
            return Err(PhysicsError::InvalidShape {
                reason: "set_vertices requires a polygon shape",
            });
        }
        let input = Vertices::from_slice(points).ok_or(PhysicsError::InvalidShape {
            reason: "too many polygon vertices",
        })?;
        if input.len() < 3 {
            return Err(PhysicsError::InvalidShape {
                reason: "a polygon needs at least three vertices",
            });
        }

        let hull = jarvis_march(&input);
        if hull.len() < 3 {
            return Err(PhysicsError::InvalidShape {
                reason: "polygon vertices are collinear",
            });
        }

        let mut normals = Vertices::new();
        let n = hull.len();
        let mut j = n - 1;
        for i in 0..n {
            normals.push((hull[i] - hull[j]).left_normal());
            j = i;
        }

        // Fan the hull into triangles from vertex 0 and sum the signed
        // doubled areas.
        let mut twice_area_sum = 0.0f32;
        for i in 1..n - 1 {
            twice_area_sum += (hull[i] - hull[0]).cross(hull[i + 1] - hull[0]);
        }

        self.kind = ShapeKind::Polygon {
            vertices: hull,
            normals,
        };
        self.area = (0.5 * twice_area_sum).abs();
        Ok(())
    }
}

/// Convex hull of the input point set by gift wrapping (Jarvis march),
/// in the engine's CCW winding.
///
/// Input sizes are tiny (at most 8 points), so the quadratic march beats
/// fancier hull algorithms here. Collinear candidates resolve to the
/// farther point so duplicated and on-edge points are dropped.
fn jarvis_march(input: &Vertices) -> Vertices {
    let mut output = Vertices::new();
    let count = input.len();

    let mut lowest = 0;
    for i in 1..count {
        if input[lowest].x > input[i].x {
            lowest = i;
        }
    }

    output.push(input[lowest]);

    let mut current = lowest;
    loop {
        let mut next = usize::MAX;
        for i in 0..count {
            if i != current {
                next = i;
                break;
            }
        }

        for i in 0..count {
            if i == current || i == next {
                continue;
            }
            let direction = counter_clockwise(input[current], input[i], input[next]);
            if direction < 0 {
                continue;
            }
            let to_candidate = input[current].distance_squared(input[i]);
            let to_next = input[current].distance_squared(input[next]);
            if direction != 0 || to_candidate > to_next {
                next = i;
            }
        }

        if next == lowest {
            break;
        }
        current = next;
        output.push(input[next]);
    }

    output
}

// ============================================================================
// Tests
// ============================================================================
