//! Pair-Keyed Contact Cache
//!
//! Persistent contact manifolds that survive across steps. When a pair is
//! refreshed and a new contact's id matches a cached one, the cached
//! accumulated impulses carry over, which is what makes warm starting
//! work; the pair's combined friction and restitution are computed once
//! on first insertion and kept for the life of the entry.
//!
//! Entries live in an insertion-ordered vector with a `HashMap` index for
//! O(1) lookup. The solver iterates the vector, so solve order (and with
//! it the whole simulation) stays deterministic across runs.

use std::collections::HashMap;

use crate::collision::Manifold;
use crate::world::BodyHandle;

/// Canonical (ordered) body pair used as the cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyPairKey {
    /// Smaller handle of the pair
    pub first: BodyHandle,
    /// Larger handle of the pair
    pub second: BodyHandle,
}

impl BodyPairKey {
    /// Build the canonical key for two handles, in either order.
    #[inline]
    #[must_use]
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        if a <= b {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }
}

struct CacheEntry {
    pair: BodyPairKey,
    manifold: Manifold,
    /// Cleared on refresh; entries still stale at sweep time no longer
    /// collide and are evicted.
    stale: bool,
}

/// Pair-keyed set of persistent contact manifolds.
#[derive(Default)]
pub struct ContactCache {
    entries: Vec<CacheEntry>,
    index: HashMap<BodyPairKey, usize>,
}

impl ContactCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Number of cached pairs.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is cached.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached manifold for a pair.
    #[must_use]
    pub fn get(&self, pair: BodyPairKey) -> Option<&Manifold> {
        self.index.get(&pair).map(|&i| &self.entries[i].manifold)
    }

    /// Mark every entry as potentially stale. Call once per step before
    /// refreshing the colliding pairs.
    pub fn begin_step(&mut self) {
        for entry in &mut self.entries {
            entry.stale = true;
        }
    }

    /// Insert or refresh the manifold for a pair.
    ///
    /// On refresh the entry keeps its combined friction and restitution,
    /// and contacts whose ids match the previous manifold inherit its
    /// accumulated impulses. On first insertion the pair's coefficients
    /// are set to `friction` and `restitution`.
    pub fn refresh(
        &mut self,
        pair: BodyPairKey,
        mut manifold: Manifold,
        friction: f32,
        restitution: f32,
    ) {
        if let Some(&i) = self.index.get(&pair) {
            let entry = &mut self.entries[i];
            let old = &entry.manifold;

            manifold.friction = old.friction;
            manifold.restitution = old.restitution;
            for contact in manifold.contacts[..manifold.count].iter_mut() {
                if let Some(previous) = old.contacts[..old.count]
                    .iter()
                    .find(|previous| previous.id == contact.id)
                {
                    contact.cache = previous.cache;
                }
            }

            entry.manifold = manifold;
            entry.stale = false;
        } else {
            manifold.friction = friction;
            manifold.restitution = restitution;
            self.index.insert(pair, self.entries.len());
            self.entries.push(CacheEntry {
                pair,
                manifold,
                stale: false,
            });
        }
    }

    /// Remove the entry for a pair. Returns whether one existed.
    pub fn evict(&mut self, pair: BodyPairKey) -> bool {
        let Some(i) = self.index.remove(&pair) else {
            return false;
        };
        self.entries.swap_remove(i);
        if i < self.entries.len() {
            self.index.insert(self.entries[i].pair, i);
        }
        true
    }

    /// Remove every entry involving `handle`.
    pub fn evict_body(&mut self, handle: BodyHandle) {
        self.entries
            .retain(|e| e.pair.first != handle && e.pair.second != handle);
        self.rebuild_index();
    }

    /// Remove entries whose pairs were not refreshed since
    /// [`ContactCache::begin_step`]; those pairs stopped colliding.
    pub fn sweep(&mut self) {
        if self.entries.iter().any(|e| e.stale) {
            self.entries.retain(|e| !e.stale);
            self.rebuild_index();
        }
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Iterate the cached pairs and manifolds in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyPairKey, &mut Manifold)> {
        self.entries.iter_mut().map(|e| (e.pair, &mut e.manifold))
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            self.index.insert(entry.pair, i);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Contact, Manifold};
    use crate::math::Vec2;
    use crate::world::BodyHandle;

    fn handle(index: u32) -> BodyHandle {
        BodyHandle::from_raw_parts(index, 0)
    }

    fn manifold_with_ids(ids: &[u32]) -> Manifold {
        let mut m = Manifold {
            direction: Vec2::UNIT_X,
            ..Manifold::default()
        };
        for (i, &id) in ids.iter().enumerate().take(2) {
            m.contacts[i] = Contact {
                id,
                ..Contact::default()
            };
            m.count = i + 1;
        }
        m
    }

    #[test]
    fn test_pair_key_is_unordered() {
        let a = handle(1);
        let b = handle(2);
        assert_eq!(BodyPairKey::new(a, b), BodyPairKey::new(b, a));
    }

    #[test]
    fn test_first_insertion_sets_coefficients() {
        let mut cache = ContactCache::new();
        let pair = BodyPairKey::new(handle(0), handle(1));
        cache.refresh(pair, manifold_with_ids(&[8]), 0.4, 0.2);
        let m = cache.get(pair).unwrap();
        assert_eq!(m.friction, 0.4);
        assert_eq!(m.restitution, 0.2);
    }

    #[test]
    fn test_refresh_preserves_coefficients_and_impulses() {
        let mut cache = ContactCache::new();
        let pair = BodyPairKey::new(handle(0), handle(1));

        let mut first = manifold_with_ids(&[8, 9]);
        first.contacts[0].cache.normal_impulse = 1.5;
        first.contacts[1].cache.tangent_impulse = -0.5;
        cache.refresh(pair, first, 0.4, 0.2);

        // Mutate the cached entry the way the solver would
        cache.iter_mut().for_each(|(_, m)| {
            m.contacts[0].cache.normal_impulse = 2.0;
        });

        // Same ids in a different order still match
        cache.refresh(pair, manifold_with_ids(&[9, 8]), 0.9, 0.9);
        let m = cache.get(pair).unwrap();
        assert_eq!(m.friction, 0.4, "coefficients survive refresh");
        assert_eq!(m.contacts[1].cache.normal_impulse, 2.0);
        assert_eq!(m.contacts[0].cache.tangent_impulse, -0.5);
    }

    #[test]
    fn test_unmatched_ids_start_cold() {
        let mut cache = ContactCache::new();
        let pair = BodyPairKey::new(handle(0), handle(1));

        let mut first = manifold_with_ids(&[8]);
        first.contacts[0].cache.normal_impulse = 3.0;
        cache.refresh(pair, first, 0.5, 0.0);

        cache.refresh(pair, manifold_with_ids(&[11]), 0.5, 0.0);
        let m = cache.get(pair).unwrap();
        assert_eq!(m.contacts[0].cache.normal_impulse, 0.0);
    }

    #[test]
    fn test_evict_and_sweep() {
        let mut cache = ContactCache::new();
        let ab = BodyPairKey::new(handle(0), handle(1));
        let cd = BodyPairKey::new(handle(2), handle(3));
        cache.refresh(ab, manifold_with_ids(&[8]), 0.5, 0.0);
        cache.refresh(cd, manifold_with_ids(&[8]), 0.5, 0.0);

        cache.begin_step();
        cache.refresh(cd, manifold_with_ids(&[8]), 0.5, 0.0);
        cache.sweep();

        assert!(cache.get(ab).is_none(), "stale pair swept");
        assert!(cache.get(cd).is_some());

        assert!(cache.evict(cd));
        assert!(!cache.evict(cd));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evict_body_removes_all_pairs() {
        let mut cache = ContactCache::new();
        cache.refresh(
            BodyPairKey::new(handle(0), handle(1)),
            manifold_with_ids(&[8]),
            0.5,
            0.0,
        );
        cache.refresh(
            BodyPairKey::new(handle(1), handle(2)),
            manifold_with_ids(&[8]),
            0.5,
            0.0,
        );
        cache.refresh(
            BodyPairKey::new(handle(2), handle(3)),
            manifold_with_ids(&[8]),
            0.5,
            0.0,
        );

        cache.evict_body(handle(1));
        assert_eq!(cache.len(), 1);
        assert!(cache
            .get(BodyPairKey::new(handle(2), handle(3)))
            .is_some());
    }
}
