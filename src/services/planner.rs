use std::collections::HashSet;

use crate::models::{
    AvailableIngredients, Catalog, DishId, MealTime, RecommendationSource, Recommendations,
    RecommendedDish,
};

use super::similarity::SimilarityMatrix;

/// Ratings below this make a dish worth surfacing
const UNDER_RATED_THRESHOLD: f64 = 3.0;

/// Inputs of one recommendation request
#[derive(Debug)]
pub struct RecommendationRequest<'r> {
    pub ratings: &'r [f64],
    pub recent: &'r [DishId],
    pub available: &'r AvailableIngredients,
    /// Accepted for interface fidelity; no filtering is applied on it yet
    pub meal_time: MealTime,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    position: usize,
    score: f64,
}

/// Candidate generation over one user's ratings
///
/// 1. under-rated dishes (rating < 3), highest rating first, minus recent picks
/// 2. keep those whose ingredients are all available
/// 3. if none survive, expand each under-rated dish to its nearest neighbors
///    and keep the neighbors whose ingredients are available
pub struct RecommendationPlanner<'a> {
    catalog: &'a Catalog,
    similarity: &'a SimilarityMatrix,
    neighborhood_size: usize,
}

impl<'a> RecommendationPlanner<'a> {
    pub fn new(
        catalog: &'a Catalog,
        similarity: &'a SimilarityMatrix,
        neighborhood_size: usize,
    ) -> Self {
        Self {
            catalog,
            similarity,
            neighborhood_size,
        }
    }

    pub fn plan(&self, request: &RecommendationRequest<'_>) -> Recommendations {
        let candidates = self.under_rated(request.ratings, request.recent);
        if candidates.is_empty() {
            return Recommendations {
                dishes: Vec::new(),
                source: RecommendationSource::NoCandidates,
            };
        }

        let strict: Vec<Candidate> = candidates
            .iter()
            .copied()
            .filter(|c| self.is_available(c.position, request.available))
            .collect();

        let (selected, source) = if strict.is_empty() {
            tracing::debug!(
                candidates = candidates.len(),
                meal_time = %request.meal_time,
                "No candidate matches the available ingredients, expanding neighborhoods"
            );
            (
                self.expand_neighbors(&candidates, request.available, request.recent),
                RecommendationSource::Fallback,
            )
        } else {
            (strict, RecommendationSource::Strict)
        };

        let dishes = selected
            .into_iter()
            .take(request.limit)
            .map(|c| {
                let dish = self.catalog.dish_at(c.position);
                RecommendedDish {
                    dish_id: dish.id,
                    name: dish.name.clone(),
                    score: c.score,
                }
            })
            .collect();

        Recommendations { dishes, source }
    }

    fn under_rated(&self, ratings: &[f64], recent: &[DishId]) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = ratings
            .iter()
            .enumerate()
            .filter(|&(_, &rating)| rating < UNDER_RATED_THRESHOLD)
            .filter(|(position, _)| !recent.contains(&self.catalog.dish_at(*position).id))
            .map(|(position, &rating)| Candidate {
                position,
                score: rating,
            })
            .collect();

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates
    }

    /// Neighbors of every candidate that are cookable, scored by similarity
    /// to the candidate that led to them. First occurrence wins.
    fn expand_neighbors(
        &self,
        candidates: &[Candidate],
        available: &AvailableIngredients,
        recent: &[DishId],
    ) -> Vec<Candidate> {
        let mut seen = HashSet::new();
        let mut expanded = Vec::new();

        for candidate in candidates {
            for neighbor in self
                .similarity
                .neighborhood(candidate.position, self.neighborhood_size)
            {
                let id = self.catalog.dish_at(neighbor).id;
                if recent.contains(&id) || !self.is_available(neighbor, available) {
                    continue;
                }
                if seen.insert(neighbor) {
                    expanded.push(Candidate {
                        position: neighbor,
                        score: self.similarity.get(candidate.position, neighbor),
                    });
                }
            }
        }

        expanded
    }

    fn is_available(&self, position: usize, available: &AvailableIngredients) -> bool {
        self.catalog
            .ingredients_satisfied(self.catalog.dish_at(position).id, available)
    }
}
