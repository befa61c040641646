use std::collections::HashMap;

use thiserror::Error;

use crate::models::{
    AvailableIngredients, Catalog, DishId, MealTime, RatingChange, RatingTable, RatingVector,
    RecommendationQuality, Recommendations, UserId,
};

use super::cold_start::ColdStartPredictor;
use super::feedback::apply_selection;
use super::planner::{RecommendationPlanner, RecommendationRequest};
use super::recency::{RecencyTracker, RecentSelection};
use super::similarity::SimilarityMatrix;

/// Error types for the recommendation engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Dish {0} is not in the catalog")]
    InvalidDish(DishId),
    #[error("{0}")]
    InsufficientData(String),
    #[error("User {0} does not exist")]
    UnknownUser(UserId),
    #[error("User {0} already exists")]
    UserExists(UserId),
}

/// Tunables of the engine
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub recommendation_limit: usize,
    pub neighborhood_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            recommendation_limit: 5,
            neighborhood_size: 5,
        }
    }
}

/// Recently selected dish with its display name
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RecentDish {
    pub dish_id: DishId,
    pub name: String,
    pub selected_at: chrono::DateTime<chrono::Utc>,
}

/// Owns every piece of mutable recommendation state
///
/// The rating table, similarity matrix and recency history are only reachable
/// through the operations below, so callers serialize mutations by holding
/// one lock around the engine.
pub struct RecommendationEngine {
    catalog: Catalog,
    ratings: RatingTable,
    similarity: SimilarityMatrix,
    recency: RecencyTracker,
    cold_start: ColdStartPredictor,
    names: HashMap<UserId, String>,
    settings: EngineSettings,
}

impl RecommendationEngine {
    /// Builds the similarity matrix and fits the cold-start model
    pub fn new(
        catalog: Catalog,
        ratings: RatingTable,
        settings: EngineSettings,
    ) -> Result<Self, EngineError> {
        if catalog.len() != ratings.dish_count() {
            return Err(EngineError::InvalidInput(format!(
                "catalog has {} dishes but the rating table has {}",
                catalog.len(),
                ratings.dish_count()
            )));
        }

        let similarity = SimilarityMatrix::build(&ratings)?;
        let cold_start = ColdStartPredictor::fit(&ratings)?;
        let names = ratings
            .users()
            .iter()
            .map(|user| (*user, user.to_string()))
            .collect();

        Ok(Self {
            catalog,
            ratings,
            similarity,
            recency: RecencyTracker::new(),
            cold_start,
            names,
            settings,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ratings(&self) -> &RatingTable {
        &self.ratings
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn validate_user(&self, user: UserId) -> bool {
        self.ratings.contains(user)
    }

    pub fn user_name(&self, user: UserId) -> Option<&str> {
        self.names.get(&user).map(String::as_str)
    }

    /// Registers a new user with cold-start ratings
    pub fn create_user(&mut self, user: UserId, name: &str) -> Result<RatingVector, EngineError> {
        if self.ratings.contains(user) {
            return Err(EngineError::UserExists(user));
        }

        let ratings = self.cold_start.predict(user);
        self.ratings.set_row(user, ratings.clone())?;
        self.names.insert(user, name.to_string());

        tracing::info!(user_id = %user, name = %name, "Account created");

        Ok(ratings)
    }

    pub fn recommend(
        &self,
        user: UserId,
        available: &AvailableIngredients,
        meal_time: MealTime,
    ) -> Result<Recommendations, EngineError> {
        let ratings = self.ratings.row(user).ok_or(EngineError::UnknownUser(user))?;
        let recent = self.recency.recent(user);

        let planner = RecommendationPlanner::new(
            &self.catalog,
            &self.similarity,
            self.settings.neighborhood_size,
        );
        let recommendations = planner.plan(&RecommendationRequest {
            ratings,
            recent: &recent,
            available,
            meal_time,
            limit: self.settings.recommendation_limit,
        });

        tracing::info!(
            user_id = %user,
            meal_time = %meal_time,
            ingredients = available.len(),
            recommended = recommendations.dishes.len(),
            source = ?recommendations.source,
            "Recommendations generated"
        );

        Ok(recommendations)
    }

    /// Adapts similarity and the user's ratings to a chosen dish.
    /// Nothing is mutated when the user or dish is unknown.
    pub fn select_dish(
        &mut self,
        user: UserId,
        dish: DishId,
        quality: Option<RecommendationQuality>,
    ) -> Result<Vec<RatingChange>, EngineError> {
        let selected = self.catalog.position(dish).ok_or(EngineError::InvalidDish(dish))?;
        let ratings = self
            .ratings
            .row_mut(user)
            .ok_or(EngineError::UnknownUser(user))?;

        let adjustments = apply_selection(
            &mut self.similarity,
            ratings,
            selected,
            self.settings.neighborhood_size,
            quality,
        );
        self.recency.record(user, dish);

        let changes: Vec<RatingChange> = adjustments
            .into_iter()
            .map(|adjustment| {
                let neighbor = self.catalog.dish_at(adjustment.position);
                tracing::debug!(
                    user_id = %user,
                    dish = %neighbor.name,
                    previous = adjustment.previous,
                    updated = adjustment.updated,
                    "Rating adjusted"
                );
                RatingChange {
                    dish_id: neighbor.id,
                    previous: adjustment.previous,
                    updated: adjustment.updated,
                }
            })
            .collect();

        tracing::info!(
            user_id = %user,
            dish_id = %dish,
            neighbors = changes.len(),
            "Dish selected"
        );

        Ok(changes)
    }

    /// Applies a quality-rated selection to every dish of a shown list.
    /// All ids are validated before any of them is applied.
    pub fn rate_recommendations(
        &mut self,
        user: UserId,
        dishes: &[DishId],
        quality: RecommendationQuality,
    ) -> Result<Vec<RatingChange>, EngineError> {
        if !self.ratings.contains(user) {
            return Err(EngineError::UnknownUser(user));
        }
        if let Some(unknown) = dishes.iter().find(|d| self.catalog.position(**d).is_none()) {
            return Err(EngineError::InvalidDish(*unknown));
        }

        let mut changes = Vec::new();
        for dish in dishes {
            changes.extend(self.select_dish(user, *dish, Some(quality))?);
        }
        Ok(changes)
    }

    /// Recently selected dishes, oldest first
    pub fn recent_selections(&self, user: UserId) -> Vec<RecentDish> {
        self.recency
            .selections(user)
            .filter_map(|selection: &RecentSelection| {
                self.catalog.dish(selection.dish_id).map(|dish| RecentDish {
                    dish_id: dish.id,
                    name: dish.name.clone(),
                    selected_at: selection.selected_at,
                })
            })
            .collect()
    }
}
