//! Narrow-Phase Collision Detection
//!
//! Convex pair tests producing contact manifolds:
//!
//! - Circle vs. circle: analytic center distance test
//! - Circle vs. polygon: closest-edge search with Voronoi regions
//! - Polygon vs. polygon: SAT over face normals, reference/incident edge
//!   selection, and Sutherland-Hodgman clipping of the incident edge
//!
//! A manifold holds at most two contact points. Every contact carries an
//! id derived from the incident-edge vertex indices so the contact cache
//! can match points across steps and carry their accumulated impulses
//! over (warm starting).
//!
//! The manifold direction always points from the first shape toward the
//! second; each computation ends with a `dot(p2 - p1, direction)` check
//! that flips the direction when needed.

use crate::math::{Transform, Vec2};
use crate::shape::{Shape, ShapeKind, MAX_POLYGON_VERTICES};

// ============================================================================
// Contact and Manifold
// ============================================================================

/// Accumulated solver impulses for one contact, preserved across steps
/// when contact ids match.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ImpulseCache {
    /// Accumulated impulse along the manifold direction
    pub normal_impulse: f32,
    /// Accumulated impulse along the contact tangent
    pub tangent_impulse: f32,
}

/// One contact point of a manifold.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Contact {
    /// Identity of the contact, stable across steps while the same
    /// incident-edge vertices stay in contact
    pub id: u32,
    /// World-space contact point
    pub point: Vec2,
    /// Penetration depth (positive = overlapping)
    pub depth: f32,
    /// Warm-starting state
    pub cache: ImpulseCache,
}

/// Contact manifold between two shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Manifold {
    /// Unit direction from the first body toward the second
    pub direction: Vec2,
    /// Contact points; only the first `count` entries are meaningful
    pub contacts: [Contact; 2],
    /// Number of active contacts (0, 1, or 2). A pre-step callback may
    /// zero this to suppress constraint solving for the pair.
    pub count: usize,
    /// Combined friction coefficient for the pair
    pub friction: f32,
    /// Combined restitution coefficient for the pair
    pub restitution: f32,
}

impl Default for Manifold {
    fn default() -> Self {
        Self {
            direction: Vec2::ZERO,
            contacts: [Contact::default(); 2],
            count: 0,
            friction: 0.0,
            restitution: 0.0,
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Test two shapes for overlap and build the contact manifold.
///
/// Returns `None` when the shapes are separated. The manifold's friction
/// and restitution are left at zero; the contact cache fills them in.
#[must_use]
pub fn compute_collision(
    s1: &Shape,
    tx1: Transform,
    s2: &Shape,
    tx2: Transform,
) -> Option<Manifold> {
    match (s1.kind(), s2.kind()) {
        (ShapeKind::Circle { .. }, ShapeKind::Circle { .. }) => {
            collide_circles(s1, tx1, s2, tx2)
        }
        (ShapeKind::Circle { .. }, ShapeKind::Polygon { .. })
        | (ShapeKind::Polygon { .. }, ShapeKind::Circle { .. }) => {
            collide_circle_polygon(s1, tx1, s2, tx2)
        }
        (ShapeKind::Polygon { .. }, ShapeKind::Polygon { .. }) => {
            collide_polygons(s1, tx1, s2, tx2)
        }
    }
}

// ============================================================================
// Circle vs. circle
// ============================================================================

fn collide_circles(s1: &Shape, tx1: Transform, s2: &Shape, tx2: Transform) -> Option<Manifold> {
    let delta = tx2.position - tx1.position;

    let radius_sum = s1.radius() + s2.radius();
    let magnitude_sqr = delta.length_squared();

    if radius_sum * radius_sum < magnitude_sqr {
        return None;
    }

    let magnitude = magnitude_sqr.sqrt();

    // Coincident centers leave the separation direction arbitrary.
    let direction = if magnitude > 0.0 {
        delta * (1.0 / magnitude)
    } else {
        Vec2::UNIT_X
    };

    let mut manifold = Manifold {
        direction,
        ..Manifold::default()
    };
    manifold.contacts[0] = Contact {
        id: 0,
        point: tx1.position + direction * s1.radius(),
        depth: if magnitude > 0.0 {
            radius_sum - magnitude
        } else {
            s1.radius()
        },
        cache: ImpulseCache::default(),
    };
    manifold.contacts[1] = manifold.contacts[0];
    manifold.count = 1;

    Some(manifold)
}

// ============================================================================
// Circle vs. polygon
// ============================================================================

fn collide_circle_polygon(
    s1: &Shape,
    tx1: Transform,
    s2: &Shape,
    tx2: Transform,
) -> Option<Manifold> {
    let circle_first = matches!(s1.kind(), ShapeKind::Circle { .. });
    let (circle, circle_tx, poly, poly_tx) = if circle_first {
        (s1, tx1, s2, tx2)
    } else {
        (s2, tx2, s1, tx1)
    };

    let vertices = poly.vertices();
    let normals = poly.normals();
    let radius = circle.radius();

    // Circle center in the polygon's local frame.
    let center = (circle_tx.position - poly_tx.position).rotate(-poly_tx.angle());

    // Closest polygon edge to the center; any edge further away than the
    // radius is a separating axis.
    let mut max_dot = f32::MIN;
    let mut max_index = usize::MAX;
    for (i, &normal) in normals.iter().enumerate() {
        let dot = normal.dot(center - vertices[i]);
        if dot > radius {
            return None;
        }
        if max_dot < dot {
            max_dot = dot;
            max_index = i;
        }
    }
    if max_index == usize::MAX {
        return None;
    }

    let delta = tx2.position - tx1.position;
    let mut manifold = Manifold::default();

    if max_dot < 0.0 {
        // Center inside the polygon; push out along the closest face.
        let mut direction = -normals[max_index].rotate_rot(poly_tx.rotation);
        if delta.dot(direction) < 0.0 {
            direction = -direction;
        }
        manifold.direction = direction;
        manifold.contacts[0] = Contact {
            id: 0,
            point: circle_tx.position + direction * radius,
            depth: radius - max_dot,
            cache: ImpulseCache::default(),
        };
    } else {
        let v1 = if max_index > 0 {
            vertices[max_index - 1]
        } else {
            vertices[vertices.len() - 1]
        };
        let v2 = vertices[max_index];

        let edge = v2 - v1;
        let v1_to_center = center - v1;
        let v2_to_center = center - v2;

        let v1_dot = v1_to_center.dot(edge);
        let v2_dot = v2_to_center.dot(-edge);

        if v1_dot <= 0.0 || v2_dot <= 0.0 {
            // Center projects past an endpoint: circle vs. vertex.
            let local = if v1_dot <= 0.0 {
                v1_to_center
            } else {
                v2_to_center
            };
            let magnitude_sqr = local.length_squared();
            if magnitude_sqr > radius * radius {
                return None;
            }
            let magnitude = magnitude_sqr.sqrt();

            let mut direction = if magnitude > 0.0 {
                (-local).rotate_rot(poly_tx.rotation) * (1.0 / magnitude)
            } else {
                Vec2::ZERO
            };
            if delta.dot(direction) < 0.0 {
                direction = -direction;
            }
            manifold.direction = direction;
            manifold.contacts[0] = Contact {
                id: 0,
                point: circle_tx.position + direction * radius,
                depth: if magnitude > 0.0 {
                    radius - magnitude
                } else {
                    radius
                },
                cache: ImpulseCache::default(),
            };
        } else {
            // Center projects onto the edge: circle vs. face.
            let mut direction = -normals[max_index].rotate_rot(poly_tx.rotation);
            if delta.dot(direction) < 0.0 {
                direction = -direction;
            }
            manifold.direction = direction;
            manifold.contacts[0] = Contact {
                id: 0,
                point: circle_tx.position + direction * radius,
                depth: radius - max_dot,
                cache: ImpulseCache::default(),
            };
        }
    }

    manifold.contacts[1] = manifold.contacts[0];
    manifold.count = 1;
    Some(manifold)
}

// ============================================================================
// Polygon vs. polygon
// ============================================================================

/// A polygon edge in world space with the vertex indices it came from.
#[derive(Clone, Copy, Debug)]
struct Edge {
    points: [Vec2; 2],
    indexes: [usize; 2],
}

fn collide_polygons(s1: &Shape, tx1: Transform, s2: &Shape, tx2: Transform) -> Option<Manifold> {
    let (max_depth1, index1) = separating_axis(s1, tx1, s2, tx2);
    if max_depth1 >= 0.0 {
        return None;
    }

    let (max_depth2, index2) = separating_axis(s2, tx2, s1, tx1);
    if max_depth2 >= 0.0 {
        return None;
    }

    // Least-penetrating face of the two queries sets the contact direction.
    let mut direction = if max_depth1 > max_depth2 {
        s1.normals()[index1].rotate_rot(tx1.rotation)
    } else {
        s2.normals()[index2].rotate_rot(tx2.rotation)
    };

    let delta = tx2.position - tx1.position;
    if delta.dot(direction) < 0.0 {
        direction = -direction;
    }

    let edge1 = contact_edge(s1, tx1, direction);
    let edge2 = contact_edge(s2, tx2, -direction);

    // The reference edge is the one more perpendicular to the contact
    // direction; the other polygon supplies the incident edge.
    let edge_dot1 = (edge1.points[1] - edge1.points[0]).dot(direction);
    let edge_dot2 = (edge2.points[1] - edge2.points[0]).dot(direction);

    let (ref_edge, mut inc_edge, inc_edge_flipped) = if edge_dot1.abs() > edge_dot2.abs() {
        (edge2, edge1, true)
    } else {
        (edge1, edge2, false)
    };

    let ref_edge_vector = (ref_edge.points[1] - ref_edge.points[0]).normalize();

    let ref_dot1 = ref_edge.points[0].dot(ref_edge_vector);
    let ref_dot2 = ref_edge.points[1].dot(ref_edge_vector);

    // Clip the incident edge between the reference edge's side planes.
    if !clip_edge(&mut inc_edge, ref_edge_vector, ref_dot1) {
        return None;
    }
    if !clip_edge(&mut inc_edge, -ref_edge_vector, -ref_dot2) {
        return None;
    }

    let ref_edge_normal = ref_edge_vector.right_normal();

    let max_depth = ref_edge.points[0].dot(ref_edge_normal);
    let depth1 = inc_edge.points[0].dot(ref_edge_normal) - max_depth;
    let depth2 = inc_edge.points[1].dot(ref_edge_normal) - max_depth;

    let mut manifold = Manifold {
        direction,
        ..Manifold::default()
    };

    // Ids encode the incident vertex index plus which body owned the
    // incident edge, so the same physical contact keeps its id while the
    // pair stays in contact.
    manifold.contacts[0].id = if inc_edge_flipped {
        inc_edge.indexes[0] as u32
    } else {
        (MAX_POLYGON_VERTICES + inc_edge.indexes[0]) as u32
    };
    manifold.contacts[1].id = if inc_edge_flipped {
        inc_edge.indexes[1] as u32
    } else {
        (MAX_POLYGON_VERTICES + inc_edge.indexes[1]) as u32
    };

    if depth1 < 0.0 {
        manifold.contacts[0].point = inc_edge.points[1];
        manifold.contacts[0].depth = depth2;
        manifold.contacts[1].point = manifold.contacts[0].point;
        manifold.contacts[1].depth = manifold.contacts[0].depth;
        manifold.count = 1;
    } else if depth2 < 0.0 {
        manifold.contacts[0].point = inc_edge.points[0];
        manifold.contacts[0].depth = depth1;
        manifold.contacts[1].point = manifold.contacts[0].point;
        manifold.contacts[1].depth = manifold.contacts[0].depth;
        manifold.count = 1;
    } else {
        manifold.contacts[0].point = inc_edge.points[0];
        manifold.contacts[0].depth = depth1;
        manifold.contacts[1].point = inc_edge.points[1];
        manifold.contacts[1].depth = depth2;
        manifold.count = 2;
    }

    Some(manifold)
}

/// Maximum separation of `s2` over the face normals of `s1`, with the
/// index of the face that attains it. A non-negative result means a
/// separating axis exists.
fn separating_axis(s1: &Shape, tx1: Transform, s2: &Shape, tx2: Transform) -> (f32, usize) {
    let vertices1 = s1.vertices();
    let normals1 = s1.normals();
    let vertices2 = s2.vertices();

    let mut max_depth = f32::MIN;
    let mut max_index = 0;

    for i in 0..normals1.len() {
        let vertex = vertices1[i].transform(tx1);
        let normal = normals1[i].rotate_rot(tx1.rotation);

        let support_index = support_point_index(vertices2, tx2, -normal);
        let support_point = vertices2[support_index].transform(tx2);

        let depth = normal.dot(support_point - vertex);
        if max_depth < depth {
            max_depth = depth;
            max_index = i;
        }
    }

    (max_depth, max_index)
}

/// Index of the vertex farthest along `v` (world direction).
fn support_point_index(vertices: &[Vec2], tx: Transform, v: Vec2) -> usize {
    let local = v.rotate(-tx.angle());

    let mut max_dot = f32::MIN;
    let mut max_index = 0;
    for (i, &vertex) in vertices.iter().enumerate() {
        let dot = vertex.dot(local);
        if max_dot < dot {
            max_dot = dot;
            max_index = i;
        }
    }
    max_index
}

/// The edge of `s` most perpendicular to `v`: of the two edges adjacent
/// to the support vertex along `v`, the one whose direction is least
/// aligned with `v`.
fn contact_edge(s: &Shape, tx: Transform, v: Vec2) -> Edge {
    let vertices = s.vertices();
    let count = vertices.len();

    let support = support_point_index(vertices, tx, v);
    let prev = if support == 0 { count - 1 } else { support - 1 };
    let next = if support == count - 1 { 0 } else { support + 1 };

    let prev_edge_vector = (vertices[support] - vertices[prev]).normalize();
    let next_edge_vector = (vertices[support] - vertices[next]).normalize();

    let local = v.rotate(-tx.angle());

    if prev_edge_vector.dot(local) < next_edge_vector.dot(local) {
        Edge {
            points: [vertices[prev].transform(tx), vertices[support].transform(tx)],
            indexes: [prev, support],
        }
    } else {
        Edge {
            points: [vertices[support].transform(tx), vertices[next].transform(tx)],
            indexes: [support, next],
        }
    }
}

/// Clip `e` so that the projection of each endpoint onto `v` is at least
/// `dot`. Returns `false` when the whole edge is clipped away.
fn clip_edge(e: &mut Edge, v: Vec2, dot: f32) -> bool {
    let dot1 = e.points[0].dot(v) - dot;
    let dot2 = e.points[1].dot(v) - dot;

    if dot1 >= 0.0 && dot2 >= 0.0 {
        return true;
    }

    let edge_vector = e.points[1] - e.points[0];
    let midpoint = e.points[0] + edge_vector * (dot1 / (dot1 - dot2));

    if dot1 > 0.0 && dot2 < 0.0 {
        e.points[1] = midpoint;
        true
    } else if dot1 < 0.0 && dot2 > 0.0 {
        e.points[0] = e.points[1];
        e.points[1] = midpoint;
        true
    } else {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
