//! Simulation World
//!
//! A [`World`] owns its bodies (in a generational slot arena, so handles
//! stay valid across removals), the broad-phase spatial hash, and the
//! persistent contact cache. [`World::step`] advances the simulation by
//! one fixed time step; [`World::update`] wraps it in a wall-clock
//! accumulator so render-rate callers get deterministic fixed-size steps.
//!
//! # Step pipeline
//!
//! 1. Rebuild the spatial hash and enumerate candidate pairs
//! 2. Narrow-phase each candidate; insert/refresh/evict contact-cache
//!    entries, carrying accumulated impulses across matching contact ids
//! 3. Fire `pre_step` callbacks (a callback may zero a manifold's `count`
//!    to turn the pair into a sensor for this step)
//! 4. Apply gravity and integrate velocities
//! 5. Warm-start: re-apply cached impulses once
//! 6. Run the iterative contact solver
//! 7. Integrate positions, fire `post_step` callbacks, clear forces and
//!    the broad-phase index

use std::time::Instant;

use crate::aabb::Aabb;
use crate::body::Body;
use crate::collision::{compute_collision, Manifold};
use crate::contact_cache::{BodyPairKey, ContactCache};
use crate::error::PhysicsError;
use crate::material::{combine_friction, combine_restitution};
use crate::math::Vec2;
use crate::raycast::{compute_raycast, Ray, RaycastHit};
use crate::solver::{apply_accumulated_impulses, resolve_collision, SOLVER_ITERATIONS};
use crate::spatial::SpatialHash;

/// Maximum number of bodies a world can hold.
pub const MAX_WORLD_BODIES: usize = 4096;

/// Default gravity acceleration vector, in units per second squared
/// (y grows downward in screen coordinates).
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, 9.8);

// ============================================================================
// Body handles
// ============================================================================

/// Stable identity of a body inside a world.
///
/// Handles are generational: removing a body invalidates its handle even
/// though the slot index is reused later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    #[inline]
    pub(crate) fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index of the handle. Only meaningful inside the world that
    /// minted it.
    #[inline]
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }
}

struct Slot<U> {
    generation: u32,
    body: Option<Body<U>>,
}

// ============================================================================
// Collision handler
// ============================================================================

/// Collision event callback: the two touching bodies plus their manifold.
pub type CollisionEventFn<U> = Box<dyn FnMut(&mut Body<U>, &mut Body<U>, &mut Manifold)>;

/// Pre/post-step collision callbacks stored on a world.
pub struct CollisionHandler<U = ()> {
    /// Runs after pair enumeration, before the solver. May mutate the
    /// manifold; setting `count` to zero suppresses constraint solving
    /// for the pair this step (sensor semantics).
    pub pre_step: Option<CollisionEventFn<U>>,
    /// Runs after position integration.
    pub post_step: Option<CollisionEventFn<U>>,
}

impl<U> Default for CollisionHandler<U> {
    fn default() -> Self {
        Self {
            pre_step: None,
            post_step: None,
        }
    }
}

// ============================================================================
// World
// ============================================================================

/// Simulation container: bodies, broad phase, contact cache, callbacks.
pub struct World<U = ()> {
    gravity: Vec2,
    slots: Vec<Slot<U>>,
    free: Vec<u32>,
    body_count: usize,
    hash: SpatialHash,
    cache: ContactCache,
    handler: CollisionHandler<U>,
    accumulator: f32,
    timestamp: Option<Instant>,
}

impl<U> World<U> {
    /// Create a world with the given gravity and broad-phase cell size.
    /// Fails unless `cell_size > 0`.
    pub fn new(gravity: Vec2, cell_size: f32) -> Result<Self, PhysicsError> {
        Ok(Self {
            gravity,
            slots: Vec::new(),
            free: Vec::new(),
            body_count: 0,
            hash: SpatialHash::new(cell_size)?,
            cache: ContactCache::new(),
            handler: CollisionHandler::default(),
            accumulator: 0.0,
            timestamp: None,
        })
    }

    /// Gravity acceleration vector.
    #[inline]
    #[must_use]
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Replace the gravity acceleration vector.
    #[inline]
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Number of bodies currently in the world.
    #[inline]
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.body_count
    }

    /// Number of body pairs currently in the contact cache.
    #[inline]
    #[must_use]
    pub fn contact_count(&self) -> usize {
        self.cache.len()
    }

    /// Install the collision event callbacks.
    pub fn set_collision_handler(&mut self, handler: CollisionHandler<U>) {
        self.handler = handler;
    }

    /// Take ownership of a body. Fails fast when the world is at
    /// capacity.
    pub fn add_body(&mut self, body: Body<U>) -> Result<BodyHandle, PhysicsError> {
        if self.body_count >= MAX_WORLD_BODIES {
            return Err(PhysicsError::CapacityExceeded {
                resource: "bodies",
                limit: MAX_WORLD_BODIES,
            });
        }

        let handle = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            BodyHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                body: Some(body),
            });
            BodyHandle {
                index,
                generation: 0,
            }
        };

        self.body_count += 1;
        Ok(handle)
    }

    /// Remove a body, returning it to the caller. `None` for handles that
    /// are absent or stale.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<Body<U>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let body = slot.body.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.body_count -= 1;
        self.cache.evict_body(handle);
        Some(body)
    }

    /// Borrow a body.
    #[must_use]
    pub fn body(&self, handle: BodyHandle) -> Option<&Body<U>> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_ref()
    }

    /// Mutably borrow a body.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body<U>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_mut()
    }

    /// Iterate all bodies with their handles.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body<U>)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.body.as_ref().map(|body| {
                (
                    BodyHandle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    body,
                )
            })
        })
    }

    /// Drop every body and all cached state. Handles minted before the
    /// call become stale.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.body_count = 0;
        self.hash.clear();
        self.cache.clear();
    }

    /// Advance the simulation by one step of `dt` seconds. No-op for
    /// `dt <= 0`.
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        self.enumerate_pairs();
        self.run_handler(true);

        for slot in &mut self.slots {
            if let Some(body) = &mut slot.body {
                body.apply_gravity(self.gravity);
                body.integrate_velocity(dt);
            }
        }

        // Warm start, then iterate.
        {
            let Self { slots, cache, .. } = self;
            for (pair, manifold) in cache.iter_mut() {
                if manifold.count == 0 {
                    continue;
                }
                if let Some((b1, b2)) = pair_bodies_mut(slots, pair) {
                    apply_accumulated_impulses(b1, b2, manifold);
                }
            }

            let inverse_dt = 1.0 / dt;
            for _ in 0..SOLVER_ITERATIONS {
                for (pair, manifold) in cache.iter_mut() {
                    if manifold.count == 0 {
                        continue;
                    }
                    if let Some((b1, b2)) = pair_bodies_mut(slots, pair) {
                        resolve_collision(b1, b2, manifold, inverse_dt);
                    }
                }
            }
        }

        for slot in &mut self.slots {
            if let Some(body) = &mut slot.body {
                body.integrate_position(dt);
            }
        }

        self.run_handler(false);

        for slot in &mut self.slots {
            if let Some(body) = &mut slot.body {
                body.clear_forces();
            }
        }
        self.hash.clear();
    }

    /// Advance the simulation in fixed steps of `dt`, consuming the wall
    /// time elapsed since the previous call. No-op for `dt <= 0`.
    ///
    /// The first call only records the clock; subsequent calls run zero
    /// or more steps depending on how much real time has passed.
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let now = Instant::now();
        let elapsed = match self.timestamp {
            Some(previous) => now.duration_since(previous).as_secs_f32(),
            None => 0.0,
        };
        self.timestamp = Some(now);
        self.accumulate(elapsed, dt);
    }

    /// Feed `elapsed` seconds into the fixed-step accumulator and run
    /// `step(dt)` while a full step fits. This is the clock-free seam
    /// behind [`World::update`].
    pub fn accumulate(&mut self, elapsed: f32, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.accumulator += elapsed.max(0.0);
        while self.accumulator >= dt {
            self.step(dt);
            self.accumulator -= dt;
        }
    }

    /// Cast a ray against every body, invoking `f` for each hit. Hit
    /// order across bodies is unspecified.
    pub fn raycast<F>(&mut self, ray: Ray, mut f: F)
    where
        F: FnMut(BodyHandle, RaycastHit),
    {
        let Self { slots, hash, .. } = self;

        hash.clear();
        for (i, slot) in slots.iter().enumerate() {
            if let Some(body) = &slot.body {
                if body.shape().is_some() {
                    hash.insert(body.aabb(), i as u32);
                }
            }
        }

        let reach = ray.origin + ray.direction.normalize() * ray.max_distance;
        let span = Aabb::from_corners(ray.origin, reach);

        hash.query(span, |i| {
            let slot = &slots[i as usize];
            let Some(body) = &slot.body else {
                return false;
            };
            match compute_raycast(body, ray) {
                Some(hit) => {
                    f(
                        BodyHandle {
                            index: i,
                            generation: slot.generation,
                        },
                        hit,
                    );
                    true
                }
                None => false,
            }
        });

        hash.clear();
    }

    /// Broad-phase rebuild plus narrow phase over the candidate pairs,
    /// refreshing the contact cache.
    fn enumerate_pairs(&mut self) {
        let Self {
            slots, hash, cache, ..
        } = self;

        for (i, slot) in slots.iter().enumerate() {
            if let Some(body) = &slot.body {
                if body.shape().is_some() {
                    hash.insert(body.aabb(), i as u32);
                }
            }
        }

        cache.begin_step();

        for i in 0..slots.len() {
            let Some(body) = &slots[i].body else {
                continue;
            };
            if body.shape().is_none() {
                continue;
            }
            let aabb = body.aabb();

            hash.query(aabb, |j| {
                let j = j as usize;
                // Each unordered pair is visited once, from its smaller
                // index.
                if j <= i {
                    return false;
                }

                let (Some(b1), Some(b2)) = (&slots[i].body, &slots[j].body) else {
                    return false;
                };
                let (Some(s1), Some(s2)) = (b1.shape(), b2.shape()) else {
                    return false;
                };
                if b1.inverse_mass() + b2.inverse_mass() <= 0.0 {
                    return false;
                }

                let pair = BodyPairKey::new(
                    BodyHandle {
                        index: i as u32,
                        generation: slots[i].generation,
                    },
                    BodyHandle {
                        index: j as u32,
                        generation: slots[j].generation,
                    },
                );

                match compute_collision(s1, b1.transform(), s2, b2.transform()) {
                    Some(manifold) => {
                        cache.refresh(
                            pair,
                            manifold,
                            combine_friction(s1.friction(), s2.friction()),
                            combine_restitution(s1.restitution(), s2.restitution()),
                        );
                        true
                    }
                    None => {
                        cache.evict(pair);
                        false
                    }
                }
            });
        }

        cache.sweep();
    }

    /// Fire the pre- or post-step callback for every cached manifold.
    fn run_handler(&mut self, pre: bool) {
        let Self {
            slots,
            cache,
            handler,
            ..
        } = self;
        let callback = if pre {
            handler.pre_step.as_mut()
        } else {
            handler.post_step.as_mut()
        };
        let Some(callback) = callback else {
            return;
        };

        for (pair, manifold) in cache.iter_mut() {
            if let Some((b1, b2)) = pair_bodies_mut(slots, pair) {
                callback(b1, b2, manifold);
            }
        }
    }
}

/// Mutably borrow both bodies of a pair. The canonical key order
/// guarantees `first.index < second.index`, which makes the split safe.
fn pair_bodies_mut<U>(
    slots: &mut [Slot<U>],
    pair: BodyPairKey,
) -> Option<(&mut Body<U>, &mut Body<U>)> {
    let i = pair.first.index as usize;
    let j = pair.second.index as usize;
    debug_assert!(i < j);
    if j >= slots.len() {
        return None;
    }

    let (left, right) = slots.split_at_mut(j);
    let slot_i = left.get_mut(i)?;
    let slot_j = right.get_mut(0)?;
    if slot_i.generation != pair.first.generation || slot_j.generation != pair.second.generation {
        return None;
    }
    match (slot_i.body.as_mut(), slot_j.body.as_mut()) {
        (Some(b1), Some(b2)) => Some((b1, b2)),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Body, BodyType};
    use crate::material::Material;
    use crate::shape::Shape;

    fn ball(x: f32, y: f32) -> Body {
        Body::with_shape(
            BodyType::Dynamic,
            Vec2::new(x, y),
            Shape::circle(Material::default(), 0.5).unwrap(),
        )
    }

    #[test]
    fn test_world_creation() {
        let world: World = World::new(DEFAULT_GRAVITY, 1.0).unwrap();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.gravity(), DEFAULT_GRAVITY);
        assert!(World::<()>::new(DEFAULT_GRAVITY, 0.0).is_err());
    }

    #[test]
    fn test_add_remove_round_trip() {
        let mut world: World = World::new(DEFAULT_GRAVITY, 1.0).unwrap();
        let handle = world.add_body(ball(1.0, 2.0)).unwrap();
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.body(handle).unwrap().position(), Vec2::new(1.0, 2.0));

        let body = world.remove_body(handle).expect("body comes back");
        assert_eq!(body.position(), Vec2::new(1.0, 2.0));
        assert_eq!(world.body_count(), 0);
        // The handle is stale now
        assert!(world.body(handle).is_none());
        assert!(world.remove_body(handle).is_none());
    }

    #[test]
    fn test_slot_reuse_invalidates_old_handles() {
        let mut world: World = World::new(DEFAULT_GRAVITY, 1.0).unwrap();
        let first = world.add_body(ball(0.0, 0.0)).unwrap();
        world.remove_body(first).unwrap();
        let second = world.add_body(ball(5.0, 5.0)).unwrap();

        assert_eq!(first.index(), second.index(), "slot is reused");
        assert!(world.body(first).is_none());
        assert!(world.body(second).is_some());
    }

    #[test]
    fn test_capacity_limit() {
        let mut world: World = World::new(DEFAULT_GRAVITY, 10.0).unwrap();
        for i in 0..MAX_WORLD_BODIES {
            world
                .add_body(ball((i % 64) as f32 * 2.0, (i / 64) as f32 * 2.0))
                .unwrap();
        }
        let err = world.add_body(ball(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, PhysicsError::CapacityExceeded { .. }));
        assert_eq!(world.body_count(), MAX_WORLD_BODIES);
    }

    #[test]
    fn test_step_ignores_non_positive_dt() {
        let mut world: World = World::new(DEFAULT_GRAVITY, 1.0).unwrap();
        let handle = world.add_body(ball(0.0, 0.0)).unwrap();
        world.step(0.0);
        world.step(-1.0);
        assert_eq!(world.body(handle).unwrap().position(), Vec2::ZERO);
    }

    #[test]
    fn test_gravity_accelerates_dynamic_bodies() {
        let mut world: World = World::new(Vec2::new(0.0, 10.0), 1.0).unwrap();
        let handle = world.add_body(ball(0.0, 0.0)).unwrap();
        world.step(0.1);
        let body = world.body(handle).unwrap();
        assert!((body.velocity().y - 1.0).abs() < 1e-5);
        assert!(body.position().y > 0.0);
    }

    #[test]
    fn test_accumulate_runs_fixed_steps() {
        let mut world: World = World::new(Vec2::new(0.0, 10.0), 1.0).unwrap();
        let handle = world.add_body(ball(0.0, 0.0)).unwrap();

        // 0.05 s at dt = 0.02 runs two steps and banks 0.01 s
        world.accumulate(0.05, 0.02);
        let v = world.body(handle).unwrap().velocity().y;
        assert!((v - 0.4).abs() < 1e-5);

        // The banked remainder completes a third step
        world.accumulate(0.01, 0.02);
        let v = world.body(handle).unwrap().velocity().y;
        assert!((v - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_contact_cache_follows_collisions() {
        let mut world: World = World::new(Vec2::ZERO, 1.0).unwrap();
        let a = world.add_body(ball(0.0, 0.0)).unwrap();
        let _b = world.add_body(ball(0.8, 0.0)).unwrap();
        world.step(1.0 / 60.0);
        assert_eq!(world.contact_count(), 1);

        // Move the pair apart; the cache entry must go away
        world.body_mut(a).unwrap().set_position(Vec2::new(50.0, 0.0));
        world.step(1.0 / 60.0);
        assert_eq!(world.contact_count(), 0);
    }

    #[test]
    fn test_static_pairs_are_not_cached() {
        let mut world: World = World::new(Vec2::ZERO, 1.0).unwrap();
        let shape = Shape::circle(Material::default(), 0.5).unwrap();
        world
            .add_body(Body::with_shape(BodyType::Static, Vec2::ZERO, shape))
            .unwrap();
        world
            .add_body(Body::with_shape(
                BodyType::Static,
                Vec2::new(0.5, 0.0),
                shape,
            ))
            .unwrap();
        world.step(1.0 / 60.0);
        assert_eq!(world.contact_count(), 0);
    }

    #[test]
    fn test_removed_body_leaves_cache() {
        let mut world: World = World::new(Vec2::ZERO, 1.0).unwrap();
        let a = world.add_body(ball(0.0, 0.0)).unwrap();
        let _b = world.add_body(ball(0.8, 0.0)).unwrap();
        world.step(1.0 / 60.0);
        assert_eq!(world.contact_count(), 1);

        world.remove_body(a).unwrap();
        assert_eq!(world.contact_count(), 0);
        world.step(1.0 / 60.0);
    }

    #[test]
    fn test_pre_step_sensor_suppression() {
        let mut world: World = World::new(Vec2::ZERO, 1.0).unwrap();
        let a = world.add_body(ball(0.0, 0.0)).unwrap();
        let b = world.add_body(ball(0.8, 0.0)).unwrap();
        world.body_mut(a).unwrap().set_velocity(Vec2::new(1.0, 0.0));
        world
            .body_mut(b)
            .unwrap()
            .set_velocity(Vec2::new(-1.0, 0.0));

        world.set_collision_handler(CollisionHandler {
            pre_step: Some(Box::new(|_, _, manifold| {
                manifold.count = 0;
            })),
            post_step: None,
        });

        world.step(1.0 / 60.0);
        // Suppressed pairs get no impulses: velocities unchanged
        assert_eq!(world.body(a).unwrap().velocity(), Vec2::new(1.0, 0.0));
        assert_eq!(world.body(b).unwrap().velocity(), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_post_step_callback_fires() {
        let mut world: World = World::new(Vec2::ZERO, 1.0).unwrap();
        world.add_body(ball(0.0, 0.0)).unwrap();
        world.add_body(ball(0.8, 0.0)).unwrap();

        use std::cell::Cell;
        use std::rc::Rc;
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        world.set_collision_handler(CollisionHandler {
            pre_step: None,
            post_step: Some(Box::new(move |_, _, _| {
                counter.set(counter.get() + 1);
            })),
        });

        world.step(1.0 / 60.0);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_world_raycast() {
        let mut world: World = World::new(Vec2::ZERO, 1.0).unwrap();
        let target = world.add_body(ball(5.0, 0.0)).unwrap();
        world.add_body(ball(0.0, 30.0)).unwrap();

        let mut hits = Vec::new();
        world.raycast(Ray::new(Vec2::ZERO, Vec2::UNIT_X, 10.0), |handle, hit| {
            hits.push((handle, hit));
        });

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, target);
        assert!((hits[0].1.distance - 4.5).abs() < 1e-5);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut world: World = World::new(Vec2::ZERO, 1.0).unwrap();
        let a = world.add_body(ball(0.0, 0.0)).unwrap();
        world.add_body(ball(0.8, 0.0)).unwrap();
        world.step(1.0 / 60.0);

        world.clear();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.contact_count(), 0);
        assert!(world.body(a).is_none());
    }
}
