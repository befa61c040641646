use std::sync::Arc;

use tempfile::TempDir;

use dish_recommender::{
    db::{load_inventory, CsvRatingStore},
    services::{EngineSettings, RecommendationService},
};

pub const RATINGS: &str = "\
UserID,Poha,Upma,Dal Rice,Kheer
1,2.0,4.0,1.5,4.5
2,4.0,2.5,3.0,2.0
3,3.0,3.5,4.0,1.0
";

pub const INVENTORY: &str = "\
Item_id,Dish,Flattened Rice,Semolina,Rice,Lentils,Milk,Breakfast,Lunch,Dinner,Snacks
0,Poha,1,0,0,0,0,1,0,0,1
1,Upma,0,1,0,0,0,1,0,0,1
2,Dal Rice,0,0,1,1,0,0,1,1,0
3,Kheer,0,0,1,0,1,0,0,1,1
";

/// Service over fresh CSV fixtures; the directory must outlive the service
pub async fn create_service() -> (RecommendationService, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let ratings_path = dir.path().join("ratings.csv");
    let inventory_path = dir.path().join("inventory.csv");
    tokio::fs::write(&ratings_path, RATINGS).await.unwrap();
    tokio::fs::write(&inventory_path, INVENTORY).await.unwrap();

    let inventory = load_inventory(&inventory_path).await.unwrap();
    let store = Arc::new(CsvRatingStore::new(ratings_path));
    let service = RecommendationService::load(store, &inventory, EngineSettings::default())
        .await
        .unwrap();

    (service, dir)
}
