use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{
        AvailableIngredients, Dish, DishId, MealTime, RatingVector,
        RecommendationQuality, RecommendationSource, RecommendedDish, Recommendations, UserId,
    },
    services::RecentDish,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub user_id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: UserId,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub user_id: UserId,
    pub name: String,
    pub ratings: RatingVector,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub meal_time: MealTime,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub dishes: Vec<RecommendedDish>,
    pub source: RecommendationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<Recommendations> for RecommendationsResponse {
    fn from(recommendations: Recommendations) -> Self {
        let message = if recommendations.is_empty() {
            Some("No dishes to recommend right now")
        } else if recommendations.source == RecommendationSource::Fallback {
            Some("Nothing under-rated can be cooked with these ingredients, showing similar dishes")
        } else {
            None
        };
        Self {
            dishes: recommendations.dishes,
            source: recommendations.source,
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub dish_id: DishId,
    pub quality: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub dish_ids: Vec<DishId>,
    pub quality: u8,
}

#[derive(Debug, Serialize)]
pub struct DishResponse {
    pub dish_id: DishId,
    pub name: String,
    /// Empty when the inventory has no row for the dish
    pub ingredients: Vec<String>,
    pub meal_times: Vec<MealTime>,
}

impl From<&Dish> for DishResponse {
    fn from(dish: &Dish) -> Self {
        Self {
            dish_id: dish.id,
            name: dish.name.clone(),
            ingredients: dish
                .requirement
                .as_ref()
                .map(|r| r.ingredients().map(str::to_string).collect())
                .unwrap_or_default(),
            meal_times: dish.meal_times.iter().copied().collect(),
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Every ingredient the inventory knows about
pub async fn get_ingredients(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.service.ingredients().await)
}

pub async fn get_dishes(State(state): State<AppState>) -> Json<Vec<DishResponse>> {
    let dishes = state.service.dishes().await;
    Json(dishes.iter().map(DishResponse::from).collect())
}

/// 404 means the client should offer account creation
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = UserId(user_id);
    let name = state
        .service
        .user_name(user)
        .await
        .ok_or_else(|| AppError::NotFound(format!("User {} does not exist", user)))?;

    Ok(Json(UserResponse { user_id: user, name }))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<CreatedUserResponse>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("name must not be empty".to_string()));
    }

    tracing::info!(
        request_id = %request_id,
        user_id = request.user_id,
        "Creating account"
    );

    let user = UserId(request.user_id);
    let ratings = state.service.create_user(user, name).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            user_id: user,
            name: name.to_string(),
            ratings,
        }),
    ))
}

pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationsResponse>> {
    tracing::info!(
        request_id = %request_id,
        user_id,
        ingredient_count = request.ingredients.len(),
        meal_time = %request.meal_time,
        "Processing recommendation request"
    );

    let available: AvailableIngredients = request
        .ingredients
        .into_iter()
        .map(|ingredient| ingredient.trim().to_string())
        .collect();

    let recommendations = state
        .service
        .get_recommendations(UserId(user_id), &available, request.meal_time)
        .await?;

    Ok(Json(recommendations.into()))
}

pub async fn select_dish(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
    Json(request): Json<SelectionRequest>,
) -> AppResult<StatusCode> {
    let quality = request
        .quality
        .map(RecommendationQuality::new)
        .transpose()?;

    let changes = state
        .service
        .select_dish(UserId(user_id), request.dish_id, quality)
        .await?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        dish_id = %request.dish_id,
        adjusted = changes.len(),
        "Selection recorded"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Quality rating of a whole shown list
pub async fn rate_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<StatusCode> {
    let quality = RecommendationQuality::new(request.quality)?;

    state
        .service
        .rate_recommendations(UserId(user_id), &request.dish_ids, quality)
        .await?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        dishes = request.dish_ids.len(),
        quality = quality.value(),
        "Recommendation feedback recorded"
    );

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_recent(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<RecentDish>>> {
    let recent = state.service.recent_selections(UserId(user_id)).await?;
    Ok(Json(recent))
}
