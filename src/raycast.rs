//! Raycasting
//!
//! Segment queries against single bodies: the classic quadratic for
//! circles, a parametric ray/edge walk for polygons. Directions need not
//! be unit length at the call site; they are normalized here. Distances
//! in the hit record are measured in units along the normalized
//! direction.
//!
//! A hit is reported whenever the segment intersects the shape within
//! `max_distance`; the `inside` flag (origin inside the shape) is
//! advisory.

use crate::body::Body;
use crate::math::Vec2;
use crate::shape::ShapeKind;

/// A ray segment: origin, direction, and reach.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    /// Start point
    pub origin: Vec2,
    /// Direction; normalized by the raycaster
    pub direction: Vec2,
    /// Maximum distance along the direction, `>= 0`
    pub max_distance: f32,
}

impl Ray {
    /// Create a ray.
    #[inline]
    #[must_use]
    pub const fn new(origin: Vec2, direction: Vec2, max_distance: f32) -> Self {
        Self {
            origin,
            direction,
            max_distance,
        }
    }
}

/// Result of a raycast against one body.
#[derive(Clone, Copy, Debug)]
pub struct RaycastHit {
    /// World-space hit point
    pub point: Vec2,
    /// Surface normal at the hit point
    pub normal: Vec2,
    /// Distance from the ray origin to the hit point
    pub distance: f32,
    /// Whether the ray origin lies inside the shape (advisory)
    pub inside: bool,
}

/// Cast a ray against a body's shape.
///
/// Returns `None` for bodies without a shape, zero-length directions, and
/// misses.
#[must_use]
pub fn compute_raycast<U>(body: &Body<U>, ray: Ray) -> Option<RaycastHit> {
    let shape = body.shape()?;
    let direction = ray.direction.normalize();
    if direction.length_squared() == 0.0 {
        return None;
    }
    let tx = body.transform();

    match shape.kind() {
        ShapeKind::Circle { radius } => {
            let (near, far) = intersect_circle_line(tx.position, *radius, ray.origin, direction)?;

            // Prefer the near root; fall back to the far root when the
            // origin is inside the circle.
            let (lambda, inside) = if near >= 0.0 && near <= ray.max_distance {
                (near, false)
            } else if far >= 0.0 && far <= ray.max_distance && near < 0.0 {
                (far, true)
            } else {
                return None;
            };

            let point = ray.origin + direction * lambda;
            Some(RaycastHit {
                point,
                normal: (ray.origin - point).normalize(),
                distance: lambda,
                inside,
            })
        }
        ShapeKind::Polygon { .. } => {
            let vertices = shape.vertices();
            let count = vertices.len();

            let mut intersection_count = 0usize;
            let mut min_lambda = f32::MAX;
            let mut hit_point = Vec2::ZERO;
            let mut hit_normal = Vec2::ZERO;

            let mut j = count - 1;
            for i in 0..count {
                let v1 = vertices[i].transform(tx);
                let v2 = vertices[j].transform(tx);

                // Edge vector oriented so its left-perpendicular is the
                // polygon's outward normal for this edge.
                let edge_vector = v1 - v2;

                if let Some(lambda) = intersect_ray_segment(ray.origin, direction, v2, edge_vector)
                {
                    if lambda <= ray.max_distance {
                        if min_lambda > lambda {
                            min_lambda = lambda;
                            hit_point = ray.origin + direction * lambda;
                            hit_normal = edge_vector.left_normal();
                        }
                        intersection_count += 1;
                    }
                }
                j = i;
            }

            if intersection_count == 0 {
                return None;
            }

            Some(RaycastHit {
                point: hit_point,
                normal: hit_normal,
                distance: min_lambda,
                inside: intersection_count % 2 == 1,
            })
        }
    }
}

/// Intersect an infinite line `origin + t * direction` (unit direction)
/// with a circle. Returns the near and far parameters, or `None` when the
/// line misses.
fn intersect_circle_line(
    center: Vec2,
    radius: f32,
    origin: Vec2,
    direction: Vec2,
) -> Option<(f32, f32)> {
    let origin_to_center = center - origin;

    let dot = origin_to_center.dot(direction);
    let height_sqr = origin_to_center.length_squared() - dot * dot;
    let base_sqr = radius * radius - height_sqr;

    if base_sqr < 0.0 {
        return None;
    }

    let base = base_sqr.sqrt();
    Some((dot - base, dot + base))
}

/// Intersect a ray (`t >= 0`, unbounded above) with a segment
/// (`seg_origin + u * seg_vector`, `u` in `[0, 1]`). Returns the ray
/// parameter `t` of the intersection.
fn intersect_ray_segment(origin: Vec2, direction: Vec2, seg_origin: Vec2, seg_vector: Vec2) -> Option<f32> {
    let r_cross_s = direction.cross(seg_vector);
    let qp = seg_origin - origin;

    if r_cross_s != 0.0 {
        let inverse = 1.0 / r_cross_s;
        let t = qp.cross(seg_vector) * inverse;
        let u = qp.cross(direction) * inverse;
        if t >= 0.0 && (0.0..=1.0).contains(&u) {
            return Some(t);
        }
        return None;
    }

    // Parallel lines: only collinear overlap ahead of the origin counts.
    if qp.cross(direction) != 0.0 {
        return None;
    }
    let t0 = qp.dot(direction);
    let t1 = t0 + seg_vector.dot(direction);
    let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
    if hi < 0.0 {
        return None;
    }
    Some(lo.max(0.0))
}

// ============================================================================
// Tests
// ============================================================================
