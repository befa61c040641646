use crate::models::{clamp_rating, RecommendationQuality};

use super::similarity::SimilarityMatrix;

/// Neighbors less similar than this get nudged up
const SIMILARITY_THRESHOLD: f64 = 0.5;
const DISSIMILAR_BOOST: f64 = 0.1;
const SIMILAR_PENALTY: f64 = -0.2;
/// Similar neighbors at or below this rating are left alone
const PENALTY_FLOOR: f64 = 1.2;

/// What a selection did to one neighbor
#[derive(Debug, Clone, PartialEq)]
pub struct RatingAdjustment {
    pub position: usize,
    pub previous: f64,
    pub updated: f64,
    pub similarity_delta: f64,
}

/// Per-neighbor adjustment rule
///
/// A dissimilar neighbor becomes slightly more eligible for recommendation;
/// a similar one becomes less eligible unless it is already near the floor.
pub fn rule_delta(similarity: f64, current_rating: f64) -> f64 {
    if similarity < SIMILARITY_THRESHOLD {
        DISSIMILAR_BOOST
    } else if current_rating > PENALTY_FLOOR {
        SIMILAR_PENALTY
    } else {
        0.0
    }
}

/// Applies a selection of the dish at `selected` to the user's ratings.
///
/// Every neighbor in the selected dish's top-`neighborhood_size` gets the
/// rule delta added to `similarity[selected][neighbor]` and, together with
/// the optional quality bias, to its rating, which is then clamped to
/// [1, 5] and rounded to one decimal.
pub fn apply_selection(
    similarity: &mut SimilarityMatrix,
    ratings: &mut [f64],
    selected: usize,
    neighborhood_size: usize,
    quality: Option<RecommendationQuality>,
) -> Vec<RatingAdjustment> {
    let bias = quality.map(|q| q.bias()).unwrap_or(0.0);

    similarity
        .neighborhood(selected, neighborhood_size)
        .into_iter()
        .map(|neighbor| {
            let previous = ratings[neighbor];
            let delta = rule_delta(similarity.get(selected, neighbor), previous);
            similarity.adjust(selected, neighbor, delta);

            let updated = clamp_rating(previous + delta + bias);
            ratings[neighbor] = updated;

            RatingAdjustment {
                position: neighbor,
                previous,
                updated,
                similarity_delta: delta,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A, B, C with sim(A,B)=0.3 and sim(A,C)=0.8
    fn abc_matrix() -> SimilarityMatrix {
        SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.3, 0.8],
            vec![0.3, 1.0, 0.2],
            vec![0.8, 0.2, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_rule_delta_branches() {
        assert_eq!(rule_delta(0.49, 4.0), 0.1);
        assert_eq!(rule_delta(0.5, 1.3), -0.2);
        assert_eq!(rule_delta(0.9, 1.2), 0.0);
        assert_eq!(rule_delta(-0.3, 1.0), 0.1);
    }

    #[test]
    fn test_selection_scenario() {
        let mut matrix = abc_matrix();
        let mut ratings = vec![2.5, 1.0, 4.0];

        let adjustments = apply_selection(&mut matrix, &mut ratings, 0, 2, None);

        assert_eq!(ratings, vec![2.5, 1.1, 3.8]);
        // C is the closer neighbor, so it is visited first
        assert_eq!(adjustments[0].position, 2);
        assert_eq!(adjustments[0].similarity_delta, -0.2);
        assert_eq!(adjustments[1].position, 1);
        assert_eq!(adjustments[1].previous, 1.0);
        assert_eq!(adjustments[1].updated, 1.1);
    }

    #[test]
    fn test_selection_drifts_similarity_asymmetrically() {
        let mut matrix = abc_matrix();
        let mut ratings = vec![2.5, 1.0, 4.0];

        apply_selection(&mut matrix, &mut ratings, 0, 2, None);

        assert!((matrix.get(0, 2) - 0.6).abs() < 1e-12);
        assert!((matrix.get(0, 1) - 0.4).abs() < 1e-12);
        assert_eq!(matrix.get(2, 0), 0.8);
        assert_eq!(matrix.get(1, 0), 0.3);
    }

    #[test]
    fn test_quality_bias_shifts_ratings_not_similarity() {
        let mut matrix = abc_matrix();
        let mut ratings = vec![2.5, 1.0, 4.0];
        let quality = RecommendationQuality::new(5).ok();

        apply_selection(&mut matrix, &mut ratings, 0, 2, quality);

        // B: 1.0 + 0.1 + 0.2, C: 4.0 - 0.2 + 0.2
        assert_eq!(ratings, vec![2.5, 1.3, 4.0]);
        assert!((matrix.get(0, 2) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_ratings_stay_in_bounds_under_repeated_selection() {
        let mut matrix = abc_matrix();
        let mut ratings = vec![1.0, 5.0, 1.1];
        let harsh = RecommendationQuality::new(1).ok();
        let generous = RecommendationQuality::new(5).ok();

        for round in 0..50 {
            let quality = if round % 2 == 0 { harsh } else { generous };
            apply_selection(&mut matrix, &mut ratings, round % 3, 2, quality);
            for rating in &ratings {
                assert!((1.0..=5.0).contains(rating), "rating {} escaped", rating);
            }
        }
    }

    #[test]
    fn test_neighborhood_larger_than_catalog() {
        let mut matrix = abc_matrix();
        let mut ratings = vec![2.5, 1.0, 4.0];
        let adjustments = apply_selection(&mut matrix, &mut ratings, 1, 5, None);
        assert_eq!(adjustments.len(), 2);
        // the selected dish itself is never adjusted
        assert_eq!(ratings[1], 1.0);
    }
}
