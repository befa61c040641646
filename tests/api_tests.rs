mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use dish_recommender::api::{create_router, AppState};

/// Server over fresh CSV fixtures; the directory must outlive the server
async fn create_test_server() -> (TestServer, TempDir) {
    let (service, dir) = common::create_service().await;
    let app = create_router(AppState::new(service));
    (TestServer::new(app).unwrap(), dir)
}

fn dish_ids(body: &Value) -> Vec<u64> {
    body["dishes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|dish| dish["dish_id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let (server, _dir) = create_test_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (server, _dir) = create_test_server().await;
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_catalog_listing() {
    let (server, _dir) = create_test_server().await;

    let ingredients: Vec<String> = server.get("/ingredients").await.json();
    assert_eq!(
        ingredients,
        vec!["Flattened Rice", "Semolina", "Rice", "Lentils", "Milk"]
    );

    let dishes: Vec<Value> = server.get("/dishes").await.json();
    assert_eq!(dishes.len(), 4);
    assert_eq!(dishes[3]["name"], "Kheer");
    assert_eq!(dishes[3]["ingredients"], json!(["Milk", "Rice"]));
    assert_eq!(dishes[3]["meal_times"], json!(["Dinner", "Snacks"]));
}

#[tokio::test]
async fn test_validate_user() {
    let (server, _dir) = create_test_server().await;

    let response = server.get("/users/1").await;
    response.assert_status_ok();
    let user: Value = response.json();
    assert_eq!(user["user_id"], 1);

    server.get("/users/99").await.assert_status_not_found();
}

#[tokio::test]
async fn test_create_user_persists_cold_start_ratings() {
    let (server, dir) = create_test_server().await;

    let response = server
        .post("/users")
        .json(&json!({ "user_id": 10, "name": "asha" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    let ratings = created["ratings"].as_array().unwrap();
    assert_eq!(ratings.len(), 4);
    for rating in ratings {
        let rating = rating.as_f64().unwrap();
        assert!((1.0..=5.0).contains(&rating));
    }

    let user: Value = server.get("/users/10").await.json();
    assert_eq!(user["name"], "asha");

    let stored = tokio::fs::read_to_string(dir.path().join("ratings.csv"))
        .await
        .unwrap();
    assert!(stored.lines().any(|line| line.starts_with("10,")));
}

#[tokio::test]
async fn test_create_existing_user_conflicts() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .post("/users")
        .json(&json!({ "user_id": 2, "name": "ravi" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = server
        .post("/users")
        .json(&json!({ "user_id": 11, "name": "  " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_strict_recommendations() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .post("/users/1/recommendations")
        .json(&json!({
            "ingredients": ["Flattened Rice", "Rice", "Lentils"],
            "meal_time": "Breakfast"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["source"], "strict");
    assert_eq!(dish_ids(&body), vec![0, 2]);
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_fallback_recommendations() {
    let (server, _dir) = create_test_server().await;

    // Poha and Dal Rice are under-rated but neither can be cooked
    let response = server
        .post("/users/1/recommendations")
        .json(&json!({ "ingredients": ["Rice", "Milk"] }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["source"], "fallback");
    assert_eq!(dish_ids(&body), vec![3]);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_fallback_without_ingredients_is_empty() {
    let (server, _dir) = create_test_server().await;

    let body: Value = server
        .post("/users/2/recommendations")
        .json(&json!({ "ingredients": [], "meal_time": "midnight" }))
        .await
        .json();

    assert_eq!(body["source"], "fallback");
    assert!(dish_ids(&body).is_empty());
}

#[tokio::test]
async fn test_recommendations_for_unknown_user() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .post("/users/404/recommendations")
        .json(&json!({ "ingredients": ["Rice"] }))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_selection_updates_recent_and_recommendations() {
    let (server, dir) = create_test_server().await;
    let before = tokio::fs::read_to_string(dir.path().join("ratings.csv"))
        .await
        .unwrap();

    let response = server
        .post("/users/1/selections")
        .json(&json!({ "dish_id": 0 }))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let recent: Vec<Value> = server.get("/users/1/recent").await.json();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["name"], "Poha");

    let body: Value = server
        .post("/users/1/recommendations")
        .json(&json!({ "ingredients": ["Flattened Rice", "Rice", "Lentils"] }))
        .await
        .json();
    assert_eq!(dish_ids(&body), vec![2]);

    let after = tokio::fs::read_to_string(dir.path().join("ratings.csv"))
        .await
        .unwrap();
    assert_ne!(before, after);
    assert!(after.starts_with("UserID,Poha,Upma,Dal Rice,Kheer\n"));
}

#[tokio::test]
async fn test_invalid_selection_is_rejected() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .post("/users/1/selections")
        .json(&json!({ "dish_id": 42 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/users/1/selections")
        .json(&json!({ "dish_id": 1, "quality": 9 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let recent: Vec<Value> = server.get("/users/1/recent").await.json();
    assert!(recent.is_empty());
}

#[tokio::test]
async fn test_feedback_on_shown_list() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .post("/users/2/feedback")
        .json(&json!({ "dish_ids": [1, 3], "quality": 5 }))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let recent: Vec<Value> = server.get("/users/2/recent").await.json();
    let names: Vec<&str> = recent.iter().map(|d| d["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Upma", "Kheer"]);
}

#[tokio::test]
async fn test_recent_keeps_last_three() {
    let (server, _dir) = create_test_server().await;

    for dish_id in [0, 1, 2, 3] {
        server
            .post("/users/3/selections")
            .json(&json!({ "dish_id": dish_id }))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    let recent: Vec<Value> = server.get("/users/3/recent").await.json();
    let ids: Vec<u64> = recent.iter().map(|d| d["dish_id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    server.get("/users/77/recent").await.assert_status_not_found();
}
