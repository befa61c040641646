use std::path::{Path, PathBuf};

use crate::{
    error::{AppError, AppResult},
    models::{clamp_rating, RatingTable, UserId, MAX_RATING, MIN_RATING},
};

/// Durable home of the user × dish rating table
///
/// Every write is a full overwrite of the table; there is no append or diff
/// and no atomicity guarantee across a crash mid-write.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// Reads the whole table
    async fn load(&self) -> AppResult<RatingTable>;

    /// Overwrites the whole table
    async fn save(&self, table: &RatingTable) -> AppResult<()>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}

/// Rating table kept in a CSV file
///
/// Header: user id column followed by one column per dish name.
#[derive(Debug, Clone)]
pub struct CsvRatingStore {
    path: PathBuf,
}

impl CsvRatingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl RatingStore for CsvRatingStore {
    async fn load(&self) -> AppResult<RatingTable> {
        let bytes = tokio::fs::read(&self.path).await?;
        let table = parse_ratings(&bytes)?;

        tracing::info!(
            path = %self.path.display(),
            users = table.user_count(),
            dishes = table.dish_count(),
            "Rating table loaded"
        );

        Ok(table)
    }

    async fn save(&self, table: &RatingTable) -> AppResult<()> {
        let bytes = render_ratings(table)?;
        tokio::fs::write(&self.path, bytes).await?;

        tracing::debug!(
            path = %self.path.display(),
            users = table.user_count(),
            "Rating table written"
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// Parses a rating table. Values outside [1, 5] are clamped.
pub fn parse_ratings(bytes: &[u8]) -> AppResult<RatingTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(AppError::InvalidInput(
            "rating table needs a user id column and at least one dish column".to_string(),
        ));
    }

    let dish_names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    let mut table = RatingTable::new(dish_names);

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let row = line + 2;

        let user = record
            .get(0)
            .and_then(|id| id.parse::<i64>().ok())
            .map(UserId)
            .ok_or_else(|| AppError::InvalidInput(format!("row {}: invalid user id", row)))?;

        let ratings = record
            .iter()
            .skip(1)
            .map(|value| {
                let rating = value
                    .parse::<f64>()
                    .ok()
                    .filter(|rating| rating.is_finite())
                    .ok_or_else(|| {
                        AppError::InvalidInput(format!("row {}: invalid rating {:?}", row, value))
                    })?;
                if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                    tracing::warn!(user_id = %user, rating, "Rating out of range, clamping");
                }
                Ok(clamp_rating(rating))
            })
            .collect::<AppResult<Vec<f64>>>()?;

        if table.contains(user) {
            return Err(AppError::InvalidInput(format!(
                "row {}: duplicate user id {}",
                row, user
            )));
        }
        table.set_row(user, ratings)?;
    }

    Ok(table)
}

/// Serializes a rating table with one decimal per rating
pub fn render_ratings(table: &RatingTable) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["UserID".to_string()];
    header.extend(table.dish_names().iter().cloned());
    writer.write_record(&header)?;

    for (user, ratings) in table.iter() {
        let mut record = vec![user.to_string()];
        record.extend(ratings.iter().map(|rating| format!("{:.1}", rating)));
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush rating table: {}", e)))
}
