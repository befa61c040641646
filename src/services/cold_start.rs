use crate::models::{clamp_rating, RatingTable, RatingVector, UserId};

use super::engine::EngineError;

/// Linear extrapolation of a full rating vector for a never-seen user
///
/// Fitted once at startup: one least-squares line per dish, mapping each
/// existing user's insertion position (0..M-1) to their rating of that dish.
/// Prediction feeds the raw numeric user id into those lines, not a
/// position, so ids far from the row count extrapolate to the clamp bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ColdStartPredictor {
    intercepts: Vec<f64>,
    slopes: Vec<f64>,
}

impl ColdStartPredictor {
    pub fn fit(table: &RatingTable) -> Result<Self, EngineError> {
        let users = table.user_count();
        if users < 2 {
            return Err(EngineError::InsufficientData(format!(
                "cold start needs at least 2 existing users, found {}",
                users
            )));
        }

        let mean_x = (users - 1) as f64 / 2.0;
        let variance: f64 = (0..users).map(|i| (i as f64 - mean_x).powi(2)).sum();

        let mut intercepts = Vec::with_capacity(table.dish_count());
        let mut slopes = Vec::with_capacity(table.dish_count());

        for dish in 0..table.dish_count() {
            let column: Vec<f64> = table.column(dish).collect();
            let mean_y = column.iter().sum::<f64>() / users as f64;
            let covariance: f64 = column
                .iter()
                .enumerate()
                .map(|(i, y)| (i as f64 - mean_x) * (y - mean_y))
                .sum();

            let slope = covariance / variance;
            slopes.push(slope);
            intercepts.push(mean_y - slope * mean_x);
        }

        tracing::info!(users, dishes = table.dish_count(), "Cold-start model fitted");

        Ok(Self { intercepts, slopes })
    }

    /// Initial ratings for `user`, clamped to [1, 5] and rounded to one decimal
    pub fn predict(&self, user: UserId) -> RatingVector {
        let x = user.0 as f64;
        self.intercepts
            .iter()
            .zip(&self.slopes)
            .map(|(intercept, slope)| clamp_rating(intercept + slope * x))
            .collect()
    }
}
