use std::collections::HashMap;

use super::UserId;
use crate::services::engine::EngineError;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// One rating per dish, aligned with the catalog positions
pub type RatingVector = Vec<f64>;

/// Clamps into [1.0, 5.0] and rounds to one decimal
pub fn clamp_rating(value: f64) -> f64 {
    (value.clamp(MIN_RATING, MAX_RATING) * 10.0).round() / 10.0
}

/// User × dish rating matrix, rows kept in insertion order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RatingTable {
    dish_names: Vec<String>,
    users: Vec<UserId>,
    rows: Vec<RatingVector>,
    index: HashMap<UserId, usize>,
}

impl RatingTable {
    pub fn new(dish_names: Vec<String>) -> Self {
        Self {
            dish_names,
            ..Default::default()
        }
    }

    pub fn dish_names(&self) -> &[String] {
        &self.dish_names
    }

    pub fn dish_count(&self) -> usize {
        self.dish_names.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.index.contains_key(&user)
    }

    pub fn row(&self, user: UserId) -> Option<&RatingVector> {
        self.index.get(&user).map(|&i| &self.rows[i])
    }

    pub fn row_mut(&mut self, user: UserId) -> Option<&mut RatingVector> {
        self.index.get(&user).map(|&i| &mut self.rows[i])
    }

    /// Writes a user's row, appending the user if absent
    pub fn set_row(&mut self, user: UserId, ratings: RatingVector) -> Result<(), EngineError> {
        if ratings.len() != self.dish_count() {
            return Err(EngineError::InvalidInput(format!(
                "user {} has {} ratings, expected {}",
                user,
                ratings.len(),
                self.dish_count()
            )));
        }

        match self.index.get(&user) {
            Some(&i) => self.rows[i] = ratings,
            None => {
                self.index.insert(user, self.rows.len());
                self.users.push(user);
                self.rows.push(ratings);
            }
        }
        Ok(())
    }

    /// Users in insertion order
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn rows(&self) -> &[RatingVector] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = (UserId, &RatingVector)> {
        self.users.iter().copied().zip(self.rows.iter())
    }

    /// Ratings of one dish across all users, in insertion order
    pub fn column(&self, dish: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |row| row[dish])
    }
}
