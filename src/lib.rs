//! Impulse2D: 2D Impulse-Based Rigid-Body Physics
//!
//! A compact 2D physics engine that advances a population of rigid
//! bodies in fixed-size time steps, detecting contacts and resolving them
//! with sequential impulses.
//!
//! # Features
//!
//! - **Shapes**: circles and convex polygons (up to 8 vertices, convex
//!   hull enforced at construction)
//! - **Broad Phase**: uniform spatial hash over body bounding boxes
//! - **Narrow Phase**: SAT with Sutherland-Hodgman contact clipping,
//!   two-point manifolds, stable contact ids
//! - **Solver**: sequential impulses with contact caching, warm starting,
//!   Baumgarte position stabilization, and Coulomb friction
//! - **Fixed-Step Driver**: wall-clock accumulator for frame-rate
//!   independent stepping
//!
//! # Example
//!
//! ```rust
//! use impulse2d::{Body, BodyType, Material, Shape, Vec2, World, DEFAULT_GRAVITY};
//!
//! let mut world: World = World::new(DEFAULT_GRAVITY, 2.0).unwrap();
//!
//! // A static floor and a box falling onto it.
//! let floor = Shape::rectangle(Material::default(), 20.0, 1.0).unwrap();
//! world
//!     .add_body(Body::with_shape(BodyType::Static, Vec2::new(0.0, 10.0), floor))
//!     .unwrap();
//!
//! let crate_shape = Shape::rectangle(Material::default(), 1.0, 1.0).unwrap();
//! let crate_body = world
//!     .add_body(Body::with_shape(BodyType::Dynamic, Vec2::new(0.0, 0.0), crate_shape))
//!     .unwrap();
//!
//! for _ in 0..300 {
//!     world.step(1.0 / 60.0);
//! }
//!
//! let resting = world.body(crate_body).unwrap();
//! assert!(resting.position().y < 10.0);
//! ```
//!
//! # Modules
//!
//! - [`math`]: `Vec2`, cached-trig transforms, pixel/unit conversion
//! - [`aabb`]: axis-aligned bounding boxes
//! - [`material`]: densities, friction, restitution, combine rules
//! - [`shape`]: circle and convex-polygon shapes, mass properties
//! - [`body`]: rigid bodies and integration
//! - [`spatial`]: uniform-grid broad phase
//! - [`collision`]: narrow-phase manifold computation
//! - [`raycast`]: segment queries against bodies
//! - [`contact_cache`]: persistent pair-keyed manifolds
//! - [`solver`]: sequential-impulse contact resolution
//! - [`world`]: the simulation container and step driver
//! - [`error`]: the unified error type

pub mod aabb;
pub mod body;
pub mod collision;
pub mod contact_cache;
pub mod error;
pub mod material;
pub mod math;
pub mod raycast;
pub mod shape;
pub mod solver;
pub mod spatial;
pub mod world;

// Re-export commonly used types
pub use aabb::Aabb;
pub use body::{
    Body, BodyFlags, BodyType, FLAG_INFINITE_INERTIA, FLAG_INFINITE_MASS, FLAG_NONE,
};
pub use collision::{compute_collision, Contact, ImpulseCache, Manifold};
pub use contact_cache::{BodyPairKey, ContactCache};
pub use error::PhysicsError;
pub use material::{combine_friction, combine_restitution, Material};
pub use math::{
    normalize_angle, pixels_to_units, units_to_pixels, Rot2, Transform, Vec2, PIXELS_PER_UNIT,
};
pub use raycast::{compute_raycast, Ray, RaycastHit};
pub use shape::{Shape, ShapeKind, Vertices, MAX_POLYGON_VERTICES};
pub use solver::{BAUMGARTE_FACTOR, BAUMGARTE_SLOP, SOLVER_ITERATIONS};
pub use spatial::SpatialHash;
pub use world::{
    BodyHandle, CollisionEventFn, CollisionHandler, World, DEFAULT_GRAVITY, MAX_WORLD_BODIES,
};
