//! Integration tests for the HTTP API

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use letterfall::core::{create_router, GameEngine, GameLoop};
use letterfall::types::GameConfig;

fn create_test_router() -> Router {
    let engine = GameEngine::standalone(GameConfig {
        seed: Some(5),
        lane_speed: 0.02,
        ..GameConfig::default()
    })
    .unwrap();
    let (game, _task) = GameLoop::spawn_with_rate(engine, 120);
    create_router(game)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["phase"], "PAUSED");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_state_endpoint() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/state", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["lives"], 3);
    assert_eq!(json["level"], 1);
    assert_eq!(json["lanes"].as_array().unwrap().len(), 1);
    assert_eq!(json["show_reference"], true);
}

#[tokio::test]
async fn test_pause_resume_cycle() {
    let app = create_test_router();

    let (status, json) = send(&app, "POST", "/resume", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "RUNNING");

    let (status, json) = send(&app, "POST", "/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "PAUSED");
}

#[tokio::test]
async fn test_reset_validation() {
    let app = create_test_router();

    let (status, json) = send(
        &app,
        "POST",
        "/reset",
        Some(r#"{"mode": "memorize", "score_to_level": 0, "event_window": [3, 5]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "E301_INVALID_CONFIG");

    let (status, json) = send(
        &app,
        "POST",
        "/reset",
        Some(r#"{"mode": "memorize", "score_to_level": 2, "event_window": [1, 3]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["mode"], "memorize");
    assert_eq!(json["show_reference"], false);
    assert_eq!(json["lanes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_despawn_without_event_lane_conflicts() {
    let app = create_test_router();
    let (status, json) = send(&app, "POST", "/lane/despawn", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "E101_INVALID_STATE");

    let (status, json) = send(&app, "POST", "/lane/spawn", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["lanes"][1]["color_state"], "event_color");
}

#[tokio::test]
async fn test_prediction_scores() {
    let app = create_test_router();
    let (_, json) = send(&app, "POST", "/resume", None).await;
    let letter = json["lanes"][0]["letter"].as_str().unwrap().to_lowercase();

    let body = format!(r#"{{"label": "{}"}}"#, letter);
    let (status, json) = send(&app, "POST", "/prediction", Some(&body)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["accepted"], true);

    let mut score = 0;
    for _ in 0..100 {
        let (_, json) = send(&app, "GET", "/state", None).await;
        score = json["score"].as_u64().unwrap();
        if score > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(score, 1);
}

#[tokio::test]
async fn test_unrecognized_prediction_accepted() {
    let app = create_test_router();
    let (status, json) = send(&app, "POST", "/prediction", Some(r#"{"label": null}"#)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["superseded"], false);
}
