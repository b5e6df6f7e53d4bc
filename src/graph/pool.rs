//! Candidate pool - bricks eligible for random selection
//!
//! Outer and inner bricks are kept in two pools so the merge and hollowing
//! loops can pick a random member in O(1) and drop members in O(1) when a
//! brick is destroyed.

use std::collections::HashMap;

use rand::Rng;

use crate::brick::BrickId;

/// Unordered set of brick ids with O(1) insert, remove and random pick
#[derive(Clone, Debug, Default)]
pub struct CandidatePool {
    /// Members, order only changes on removal (swap-remove)
    items: Vec<BrickId>,
    /// Map from brick id -> index in `items`
    positions: HashMap<BrickId, usize>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a brick. Returns false if it was already present.
    pub fn insert(&mut self, id: BrickId) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }
        self.positions.insert(id, self.items.len());
        self.items.push(id);
        true
    }

    /// Remove a brick. Returns false if it was not present.
    pub fn remove(&mut self, id: BrickId) -> bool {
        let Some(index) = self.positions.remove(&id) else {
            return false;
        };
        self.items.swap_remove(index);
        if let Some(&moved) = self.items.get(index) {
            self.positions.insert(moved, index);
        }
        true
    }

    pub fn contains(&self, id: BrickId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Uniformly random member, `None` if the pool is empty
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<BrickId> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items[rng.gen_range(0..self.items.len())])
    }
}
