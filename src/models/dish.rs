use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::{DishId, MealTime};

/// Ingredients the user reports having for one interaction
pub type AvailableIngredients = HashSet<String>;

/// Ingredients that must all be present for a dish to be eligible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(transparent)]
pub struct IngredientRequirement(BTreeSet<String>);

impl IngredientRequirement {
    pub fn new<I, S>(ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ingredients.into_iter().map(Into::into).collect())
    }

    /// True when every required ingredient is in `available`
    pub fn is_satisfied_by(&self, available: &AvailableIngredients) -> bool {
        self.0.iter().all(|ingredient| available.contains(ingredient))
    }

    pub fn ingredients(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// A catalog item a user can be recommended and select
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dish {
    pub id: DishId,
    pub name: String,
    /// `None` when the inventory has no row for this dish
    pub requirement: Option<IngredientRequirement>,
    pub meal_times: BTreeSet<MealTime>,
}

/// One row of the dish inventory table
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow {
    pub item_id: u32,
    pub name: String,
    pub ingredient_flags: Vec<bool>,
    pub meal_time_flags: [bool; 4],
}

/// Dish inventory: ingredient columns plus per-dish requirement and meal-time flags
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InventoryTable {
    pub ingredients: Vec<String>,
    pub rows: Vec<InventoryRow>,
}

impl InventoryTable {
    fn find(&self, item_id: u32) -> Option<&InventoryRow> {
        self.rows.iter().find(|row| row.item_id == item_id)
    }
}

/// Immutable dish catalog with the dish-id to matrix-position lookup
#[derive(Debug, Clone)]
pub struct Catalog {
    dishes: Vec<Dish>,
    positions: HashMap<DishId, usize>,
    ingredients: Vec<String>,
}

impl Catalog {
    /// Joins the rating table's dish columns with the inventory.
    ///
    /// The dish in rating column `i` gets `DishId(i)` and takes its
    /// requirement and meal-time tags from the inventory row whose
    /// `item_id` is `i`.
    pub fn new(dish_names: &[String], inventory: &InventoryTable) -> Self {
        let mut dishes = Vec::with_capacity(dish_names.len());
        let mut positions = HashMap::with_capacity(dish_names.len());

        for (position, name) in dish_names.iter().enumerate() {
            let id = DishId(position as u32);
            let row = inventory.find(id.0);

            let requirement = row.map(|row| {
                IngredientRequirement::new(
                    inventory
                        .ingredients
                        .iter()
                        .zip(&row.ingredient_flags)
                        .filter(|(_, required)| **required)
                        .map(|(ingredient, _)| ingredient.clone()),
                )
            });

            let meal_times = row
                .map(|row| {
                    MealTime::ALL
                        .into_iter()
                        .zip(row.meal_time_flags)
                        .filter(|(_, tagged)| *tagged)
                        .map(|(meal_time, _)| meal_time)
                        .collect()
                })
                .unwrap_or_default();

            if row.is_none() {
                tracing::debug!(dish_id = %id, dish = %name, "Dish missing from inventory");
            }

            positions.insert(id, position);
            dishes.push(Dish {
                id,
                name: name.clone(),
                requirement,
                meal_times,
            });
        }

        Self {
            dishes,
            positions,
            ingredients: inventory.ingredients.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }

    pub fn dishes(&self) -> &[Dish] {
        &self.dishes
    }

    /// Ingredient names in inventory column order
    pub fn ingredients(&self) -> &[String] {
        &self.ingredients
    }

    pub fn dish(&self, id: DishId) -> Option<&Dish> {
        self.position(id).map(|position| &self.dishes[position])
    }

    /// Rating-vector and similarity-matrix position of a dish
    pub fn position(&self, id: DishId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn dish_at(&self, position: usize) -> &Dish {
        &self.dishes[position]
    }

    /// Whether the dish is cookable from `available`.
    /// Unknown dishes and dishes without an inventory row never are.
    pub fn ingredients_satisfied(&self, id: DishId, available: &AvailableIngredients) -> bool {
        self.dish(id)
            .and_then(|dish| dish.requirement.as_ref())
            .is_some_and(|requirement| requirement.is_satisfied_by(available))
    }
}
