pub mod cold_start;
pub mod engine;
pub mod feedback;
pub mod planner;
pub mod recency;
pub mod recommender;
pub mod similarity;

pub use engine::{EngineError, EngineSettings, RecentDish, RecommendationEngine};
pub use recommender::RecommendationService;
