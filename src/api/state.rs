use std::sync::Arc;

use crate::services::RecommendationService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(service: RecommendationService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl From<Arc<RecommendationService>> for AppState {
    fn from(service: Arc<RecommendationService>) -> Self {
        Self { service }
    }
}
