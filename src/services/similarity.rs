use crate::models::RatingTable;

use super::engine::EngineError;

/// Dense item-item similarity matrix, indexed by catalog position
///
/// Built symmetric from cosine similarity of the rating columns. Feedback
/// drifts individual cells afterwards through [`SimilarityMatrix::adjust`],
/// which touches only `[dish][neighbor]`; the matrix is never re-normalized,
/// so values may leave [-1, 1] over time.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Cosine similarity between every pair of dish rating columns
    pub fn build(table: &RatingTable) -> Result<Self, EngineError> {
        let size = table.dish_count();
        if size < 2 || table.user_count() < 2 {
            return Err(EngineError::InvalidInput(format!(
                "similarity needs at least 2 dishes and 2 users, got {} dishes and {} users",
                size,
                table.user_count()
            )));
        }

        let columns: Vec<Vec<f64>> = (0..size).map(|dish| table.column(dish).collect()).collect();
        let norms: Vec<f64> = columns.iter().map(|column| norm(column)).collect();

        let mut values = vec![0.0; size * size];
        for i in 0..size {
            for j in i..size {
                let similarity = cosine(&columns[i], norms[i], &columns[j], norms[j]);
                values[i * size + j] = similarity;
                values[j * size + i] = similarity;
            }
        }

        tracing::info!(dishes = size, users = table.user_count(), "Similarity matrix built");

        Ok(Self { size, values })
    }

    /// Builds a matrix from explicit rows
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, EngineError> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return Err(EngineError::InvalidInput(
                "similarity matrix must be square".to_string(),
            ));
        }

        Ok(Self {
            size,
            values: rows.into_iter().flatten().collect(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, dish: usize, other: usize) -> f64 {
        self.values[dish * self.size + other]
    }

    /// How similar `dish` is to every dish
    pub fn row(&self, dish: usize) -> &[f64] {
        &self.values[dish * self.size..(dish + 1) * self.size]
    }

    /// The `k` dishes most similar to `dish`, excluding `dish` itself.
    ///
    /// Sorted by descending similarity; ties keep ascending position.
    pub fn neighborhood(&self, dish: usize, k: usize) -> Vec<usize> {
        let row = self.row(dish);
        let mut others: Vec<usize> = (0..self.size).filter(|&other| other != dish).collect();
        // stable: equal scores stay in index order
        others.sort_by(|&a, &b| row[b].total_cmp(&row[a]));
        others.truncate(k);
        others
    }

    /// Adds `delta` to `[dish][neighbor]` only
    pub fn adjust(&mut self, dish: usize, neighbor: usize, delta: f64) {
        self.values[dish * self.size + neighbor] += delta;
    }
}

fn norm(vector: &[f64]) -> f64 {
    vector.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn cosine(a: &[f64], norm_a: f64, b: &[f64], norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}
