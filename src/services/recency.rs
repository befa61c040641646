use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

use crate::models::{DishId, UserId};

/// Selections remembered per user
pub const RECENCY_CAPACITY: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentSelection {
    pub dish_id: DishId,
    pub selected_at: DateTime<Utc>,
}

/// Per-user bounded FIFO of recently chosen dishes, oldest first
#[derive(Debug, Default)]
pub struct RecencyTracker {
    entries: HashMap<UserId, VecDeque<RecentSelection>>,
}

impl RecencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, user: UserId, dish_id: DishId) {
        self.record_at(user, dish_id, Utc::now());
    }

    pub fn record_at(&mut self, user: UserId, dish_id: DishId, selected_at: DateTime<Utc>) {
        let recent = self.entries.entry(user).or_default();
        recent.push_back(RecentSelection {
            dish_id,
            selected_at,
        });
        while recent.len() > RECENCY_CAPACITY {
            recent.pop_front();
        }
    }

    /// Recently selected dish ids, oldest first
    pub fn recent(&self, user: UserId) -> Vec<DishId> {
        self.selections(user).map(|s| s.dish_id).collect()
    }

    pub fn selections(&self, user: UserId) -> impl Iterator<Item = &RecentSelection> {
        self.entries.get(&user).into_iter().flatten()
    }
}
