use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    db::RatingStore,
    error::AppResult,
    models::{
        AvailableIngredients, Catalog, Dish, DishId, InventoryTable, MealTime, RatingChange,
        RatingVector, RecommendationQuality, Recommendations, UserId,
    },
};

use super::engine::{EngineError, EngineSettings, RecentDish, RecommendationEngine};

/// Shell-facing recommendation operations
///
/// All state lives in one [`RecommendationEngine`] behind a single lock:
/// reads share it, every read-modify-write (account creation, selection)
/// holds it exclusively until the rating table has been persisted.
pub struct RecommendationService {
    engine: RwLock<RecommendationEngine>,
    store: Arc<dyn RatingStore>,
}

impl RecommendationService {
    pub fn new(engine: RecommendationEngine, store: Arc<dyn RatingStore>) -> Self {
        Self {
            engine: RwLock::new(engine),
            store,
        }
    }

    /// Loads the rating table from `store` and joins it with the inventory
    pub async fn load(
        store: Arc<dyn RatingStore>,
        inventory: &InventoryTable,
        settings: EngineSettings,
    ) -> AppResult<Self> {
        let ratings = store.load().await?;
        let catalog = Catalog::new(ratings.dish_names(), inventory);
        let engine = RecommendationEngine::new(catalog, ratings, settings)?;

        tracing::info!(
            store = store.name(),
            users = engine.ratings().user_count(),
            dishes = engine.catalog().len(),
            "Recommendation engine ready"
        );

        Ok(Self::new(engine, store))
    }

    pub async fn validate_user(&self, user: UserId) -> bool {
        self.engine.read().await.validate_user(user)
    }

    pub async fn user_name(&self, user: UserId) -> Option<String> {
        self.engine.read().await.user_name(user).map(str::to_string)
    }

    /// Creates an account with cold-start ratings and persists the table
    pub async fn create_user(&self, user: UserId, name: &str) -> AppResult<RatingVector> {
        let mut engine = self.engine.write().await;
        let ratings = engine.create_user(user, name)?;
        self.persist(&engine).await?;
        Ok(ratings)
    }

    pub async fn get_recommendations(
        &self,
        user: UserId,
        available: &AvailableIngredients,
        meal_time: MealTime,
    ) -> AppResult<Recommendations> {
        let engine = self.engine.read().await;
        Ok(engine.recommend(user, available, meal_time)?)
    }

    /// Applies a selection and persists the table
    pub async fn select_dish(
        &self,
        user: UserId,
        dish: DishId,
        quality: Option<RecommendationQuality>,
    ) -> AppResult<Vec<RatingChange>> {
        let mut engine = self.engine.write().await;
        let changes = engine.select_dish(user, dish, quality)?;
        self.persist(&engine).await?;
        Ok(changes)
    }

    /// Applies a quality rating to every dish of a shown list and persists once
    pub async fn rate_recommendations(
        &self,
        user: UserId,
        dishes: &[DishId],
        quality: RecommendationQuality,
    ) -> AppResult<Vec<RatingChange>> {
        let mut engine = self.engine.write().await;
        let changes = engine.rate_recommendations(user, dishes, quality)?;
        self.persist(&engine).await?;
        Ok(changes)
    }

    pub async fn recent_selections(&self, user: UserId) -> AppResult<Vec<RecentDish>> {
        let engine = self.engine.read().await;
        if !engine.validate_user(user) {
            return Err(EngineError::UnknownUser(user).into());
        }
        Ok(engine.recent_selections(user))
    }

    pub async fn ingredients(&self) -> Vec<String> {
        self.engine.read().await.catalog().ingredients().to_vec()
    }

    pub async fn dishes(&self) -> Vec<Dish> {
        self.engine.read().await.catalog().dishes().to_vec()
    }

    /// Writes the full table. A failure leaves the in-memory mutation in place.
    async fn persist(&self, engine: &RecommendationEngine) -> AppResult<()> {
        self.store.save(engine.ratings()).await.map_err(|e| {
            tracing::error!(
                error = %e,
                store = self.store.name(),
                "Failed to persist rating table, in-memory ratings are ahead of storage"
            );
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ratings::MockRatingStore;
    use crate::error::AppError;
    use crate::models::{InventoryRow, RatingTable};

    fn ratings() -> RatingTable {
        let mut table = RatingTable::new(vec!["Rajma".into(), "Chole".into(), "Kadhi".into()]);
        table.set_row(UserId(1), vec![2.0, 4.0, 1.5]).unwrap();
        table.set_row(UserId(2), vec![4.0, 2.5, 3.0]).unwrap();
        table
    }

    fn inventory() -> InventoryTable {
        let row = |item_id: u32, flags: Vec<bool>| InventoryRow {
            item_id,
            name: String::new(),
            ingredient_flags: flags,
            meal_time_flags: [false, true, true, false],
        };
        InventoryTable {
            ingredients: vec!["Rajma".into(), "Chole".into(), "Yogurt".into()],
            rows: vec![
                row(0, vec![true, false, false]),
                row(1, vec![false, true, false]),
                row(2, vec![false, false, true]),
            ],
        }
    }

    async fn service(store: MockRatingStore) -> RecommendationService {
        RecommendationService::load(Arc::new(store), &inventory(), EngineSettings::default())
            .await
            .unwrap()
    }

    fn loading_store() -> MockRatingStore {
        let mut store = MockRatingStore::new();
        store.expect_load().returning(|| Ok(ratings()));
        store.expect_name().return_const("mock");
        store
    }

    #[tokio::test]
    async fn test_select_persists_updated_table() {
        let mut store = loading_store();
        store
            .expect_save()
            .withf(|table| table.row(UserId(1)) != Some(&vec![2.0, 4.0, 1.5]))
            .times(1)
            .returning(|_| Ok(()));
        let service = service(store).await;

        service.select_dish(UserId(1), DishId(0), None).await.unwrap();

        let recent = service.recent_selections(UserId(1)).await.unwrap();
        assert_eq!(recent[0].name, "Rajma");
    }

    #[tokio::test]
    async fn test_failed_write_surfaces_and_keeps_memory_state() {
        let mut store = loading_store();
        store.expect_save().times(1).returning(|_| {
            Err(AppError::Storage(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        });
        let service = service(store).await;

        let result = service.select_dish(UserId(1), DishId(0), None).await;

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(service.recent_selections(UserId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_dish_never_reaches_storage() {
        let mut store = loading_store();
        store.expect_save().times(0);
        let service = service(store).await;

        let result = service.select_dish(UserId(1), DishId(9), None).await;
        assert!(matches!(result, Err(AppError::InvalidDish(_))));
    }

    #[tokio::test]
    async fn test_create_user_persists_and_registers_name() {
        let mut store = loading_store();
        store
            .expect_save()
            .withf(|table| table.contains(UserId(3)))
            .times(1)
            .returning(|_| Ok(()));
        let service = service(store).await;

        assert!(!service.validate_user(UserId(3)).await);
        let ratings = service.create_user(UserId(3), "meera").await.unwrap();

        assert_eq!(ratings.len(), 3);
        assert!(service.validate_user(UserId(3)).await);
        assert_eq!(service.user_name(UserId(3)).await.as_deref(), Some("meera"));
    }

    #[tokio::test]
    async fn test_rate_recommendations_persists_once() {
        let mut store = loading_store();
        store.expect_save().times(1).returning(|_| Ok(()));
        let service = service(store).await;
        let quality = RecommendationQuality::new(5).unwrap();

        service
            .rate_recommendations(UserId(2), &[DishId(1), DishId(2)], quality)
            .await
            .unwrap();

        assert_eq!(service.recent_selections(UserId(2)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_recent_for_unknown_user_is_not_found() {
        let service = service(loading_store()).await;
        assert!(matches!(
            service.recent_selections(UserId(404)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_catalog_listing() {
        let service = service(loading_store()).await;
        assert_eq!(service.ingredients().await, vec!["Rajma", "Chole", "Yogurt"]);
        let dishes = service.dishes().await;
        assert_eq!(dishes.len(), 3);
        assert_eq!(dishes[1].name, "Chole");
    }

    #[tokio::test]
    async fn test_load_fails_with_single_user() {
        let mut store = MockRatingStore::new();
        store.expect_load().returning(|| {
            let mut table = RatingTable::new(vec!["A".into(), "B".into()]);
            table.set_row(UserId(1), vec![1.0, 2.0]).unwrap();
            Ok(table)
        });
        store.expect_name().return_const("mock");

        let result =
            RecommendationService::load(Arc::new(store), &inventory(), EngineSettings::default())
                .await;
        assert!(result.is_err());
    }
}
