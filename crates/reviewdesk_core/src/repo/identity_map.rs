//! Per-session identity map for hydrated reviews.
//!
//! # Invariants
//! - At most one live `ReviewRef` per `ReviewId`.
//! - Entries are only removed by explicit eviction; the map never expires
//!   anything on its own.

use crate::model::review::{Review, ReviewId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a live review. Identity is `Rc::ptr_eq`.
pub type ReviewRef = Rc<RefCell<Review>>;

#[derive(Debug, Default)]
pub struct IdentityMap {
    entries: HashMap<ReviewId, ReviewRef>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new handle to the cached instance for `id`.
    pub fn get(&self, id: ReviewId) -> Option<ReviewRef> {
        self.entries.get(&id).map(Rc::clone)
    }

    /// Registers `review` under `id`, returning any instance it displaced.
    pub fn insert(&mut self, id: ReviewId, review: ReviewRef) -> Option<ReviewRef> {
        self.entries.insert(id, review)
    }

    pub fn remove(&mut self, id: ReviewId) -> Option<ReviewRef> {
        self.entries.remove(&id)
    }

    pub fn contains(&self, id: ReviewId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Whether `review` is the exact instance registered under `id`.
    pub fn holds(&self, id: ReviewId, review: &ReviewRef) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|cached| Rc::ptr_eq(cached, review))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
