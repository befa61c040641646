use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{InventoryRow, InventoryTable},
};

/// Trailing flag columns: Breakfast, Lunch, Dinner, Snacks
const MEAL_TIME_COLUMNS: usize = 4;
/// Leading columns: item id and name
const LEADING_COLUMNS: usize = 2;

/// Loads the read-only dish inventory table
pub async fn load_inventory(path: &Path) -> AppResult<InventoryTable> {
    let bytes = tokio::fs::read(path).await?;
    let inventory = parse_inventory(&bytes)?;

    tracing::info!(
        path = %path.display(),
        dishes = inventory.rows.len(),
        ingredients = inventory.ingredients.len(),
        "Dish inventory loaded"
    );

    Ok(inventory)
}

/// Parses `Item_id, name, <ingredient flags...>, <4 meal-time flags>`
pub fn parse_inventory(bytes: &[u8]) -> AppResult<InventoryTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if headers.len() < LEADING_COLUMNS + MEAL_TIME_COLUMNS {
        return Err(AppError::InvalidInput(format!(
            "inventory needs at least {} columns, found {}",
            LEADING_COLUMNS + MEAL_TIME_COLUMNS,
            headers.len()
        )));
    }

    let meal_start = headers.len() - MEAL_TIME_COLUMNS;
    let ingredients: Vec<String> = headers
        .iter()
        .take(meal_start)
        .skip(LEADING_COLUMNS)
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let row = line + 2;

        let item_id = record
            .get(0)
            .and_then(|id| id.parse::<u32>().ok())
            .ok_or_else(|| AppError::InvalidInput(format!("row {}: invalid item id", row)))?;
        let name = record.get(1).unwrap_or_default().to_string();

        let flags = record
            .iter()
            .skip(LEADING_COLUMNS)
            .map(|value| parse_flag(value, row))
            .collect::<AppResult<Vec<bool>>>()?;
        let (ingredient_flags, meal_flags) = flags.split_at(meal_start - LEADING_COLUMNS);

        let mut meal_time_flags = [false; MEAL_TIME_COLUMNS];
        meal_time_flags.copy_from_slice(meal_flags);

        rows.push(InventoryRow {
            item_id,
            name,
            ingredient_flags: ingredient_flags.to_vec(),
            meal_time_flags,
        });
    }

    Ok(InventoryTable { ingredients, rows })
}

/// A flag is set only when its cell is exactly 1
fn parse_flag(value: &str, row: usize) -> AppResult<bool> {
    value
        .parse::<f64>()
        .map(|flag| flag == 1.0)
        .map_err(|_| AppError::InvalidInput(format!("row {}: invalid flag {:?}", row, value)))
}
