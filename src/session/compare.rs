//! Side-by-side instructor comparison

use serde::{Deserialize, Serialize};

use crate::models::InstructorCard;

pub const MAX_COMPARED: usize = 3;

/// Up to three distinct instructors, in the order they were added
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComparisonList {
    entries: Vec<InstructorCard>,
}

impl ComparisonList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instructor. Returns false, leaving the list untouched, when
    /// the instructor is already present or the list is full.
    pub fn add(&mut self, card: InstructorCard) -> bool {
        if self.entries.len() >= MAX_COMPARED || self.contains(&card.id) {
            return false;
        }
        self.entries.push(card);
        true
    }

    pub fn remove(&mut self, id: &str) {
        self.entries.retain(|c| c.id != id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|c| c.id == id)
    }

    pub fn entries(&self) -> &[InstructorCard] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_COMPARED
    }
}
