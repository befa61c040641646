use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::services::engine::EngineError;

pub mod dish;
pub mod rating;

pub use dish::{AvailableIngredients, Catalog, Dish, IngredientRequirement, InventoryRow, InventoryTable};
pub use rating::{clamp_rating, RatingTable, RatingVector, MAX_RATING, MIN_RATING};

/// Stable identifier of a catalog dish
///
/// Assigned from the dish's column in the rating table, which is also the
/// `Item_id` the inventory table uses for the same dish. Matrix and rating
/// positions are resolved through [`Catalog::position`], never by casting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DishId(pub u32);

impl Display for DishId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user row in the rating table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Meal time a recommendation is requested for
///
/// The inventory carries one flag column per variant, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(from = "String")]
pub enum MealTime {
    Breakfast,
    #[default]
    Lunch,
    Dinner,
    Snacks,
}

impl MealTime {
    pub const ALL: [MealTime; 4] = [
        MealTime::Breakfast,
        MealTime::Lunch,
        MealTime::Dinner,
        MealTime::Snacks,
    ];

    /// Parses a meal time name or its 1-based menu number.
    /// Anything unrecognized falls back to Lunch.
    pub fn parse_or_default(input: &str) -> Self {
        let input = input.trim();
        if let Ok(choice) = input.parse::<usize>() {
            return Self::from_menu_choice(choice).unwrap_or_default();
        }

        Self::ALL
            .into_iter()
            .find(|meal_time| meal_time.as_str().eq_ignore_ascii_case(input))
            .unwrap_or_default()
    }

    /// Maps a 1-based menu choice to a meal time
    pub fn from_menu_choice(choice: usize) -> Option<Self> {
        choice
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MealTime::Breakfast => "Breakfast",
            MealTime::Lunch => "Lunch",
            MealTime::Dinner => "Dinner",
            MealTime::Snacks => "Snacks",
        }
    }
}

impl From<String> for MealTime {
    fn from(value: String) -> Self {
        MealTime::parse_or_default(&value)
    }
}

impl Display for MealTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User-supplied rating of a whole recommendation list, 1 to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationQuality(u8);

impl RecommendationQuality {
    pub fn new(value: u8) -> Result<Self, EngineError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EngineError::InvalidInput(format!(
                "recommendation quality must be between 1 and 5, got {}",
                value
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Rating shift applied to every neighbor: 0.1 per point away from 3
    pub fn bias(&self) -> f64 {
        0.1 * (f64::from(self.0) - 3.0)
    }
}

/// A dish in a recommendation list
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendedDish {
    pub dish_id: DishId,
    pub name: String,
    /// Rating for strict results, similarity to the originating candidate for fallback results
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    /// Under-rated dishes whose ingredients are all available
    Strict,
    /// Ingredient filtering emptied the list; neighbors were searched instead
    Fallback,
    /// The user has no under-rated dish outside the recent selections
    NoCandidates,
}

/// Ordered recommendation list with its provenance
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendations {
    pub dishes: Vec<RecommendedDish>,
    pub source: RecommendationSource,
}

impl Recommendations {
    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }
}

/// Rating change caused by a selection
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatingChange {
    pub dish_id: DishId,
    pub previous: f64,
    pub updated: f64,
}
