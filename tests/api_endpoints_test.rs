mod common;

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{read_json, TestApp, PASSWORD};
use seniorfit::models::MuscleGroup;
use seniorfit::store::Store;

fn achievement_ids(outcome: &Value) -> Vec<String> {
    outcome["new_achievements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_exercise_catalogue_requires_session_and_filters() {
    let app = TestApp::new().await;
    let (status, _) = app.request(Method::GET, "/api/exercises", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.register("erika@example.com").await;
    let (status, all) = app
        .request(Method::GET, "/api/exercises", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(all.as_array().unwrap().len() >= MuscleGroup::all().len());

    let (_, legs) = app
        .request(
            Method::GET,
            "/api/exercises?muscle_group=legs&sitting=true",
            Some(&token),
            None,
        )
        .await;
    let legs = legs.as_array().unwrap();
    assert!(!legs.is_empty());
    assert!(legs
        .iter()
        .all(|e| e["muscle_group"] == "legs" && e["is_sitting"] == true));

    let id = legs[0]["id"].as_str().unwrap();
    let (status, detail) = app
        .request(Method::GET, &format!("/api/exercises/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["id"], id);

    let (status, body) = app
        .request(
            Method::GET,
            "/api/exercises/00000000-0000-0000-0000-000000000000",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_progress_flow_with_perfect_day() {
    let app = TestApp::new().await;
    let token = app.register("erika@example.com").await;

    let mut outcomes = Vec::new();
    for group in MuscleGroup::all() {
        let exercise = app.exercise_in(*group).await;
        let (status, outcome) = app
            .request(
                Method::POST,
                "/api/progress",
                Some(&token),
                Some(json!({
                    "exercise_id": exercise.id,
                    "status": "completed",
                    "watch_seconds": 90,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        outcomes.push(outcome);
    }

    assert_eq!(outcomes[0]["points_earned"], 12);
    assert_eq!(outcomes[0]["current_streak"], 1);
    assert_eq!(achievement_ids(&outcomes[0]), vec!["first_step"]);

    let last = outcomes.last().unwrap();
    assert_eq!(last["perfect_day"], true);
    assert_eq!(last["points"]["perfect_day_bonus"], 50);
    assert_eq!(last["total_points"], 102);
    assert_eq!(last["level"], 2);
    assert_eq!(last["level_up"], true);
    let unlocked = achievement_ids(last);
    assert!(unlocked.contains(&"first_perfect_day".to_string()));
    assert!(unlocked.contains(&"all_rounder".to_string()));
    assert_eq!(
        outcomes.iter().filter(|o| o["perfect_day"] == true).count(),
        1
    );

    // Same exercise again: recorded, but worth nothing
    let exercise = app.exercise_in(MuscleGroup::Arms).await;
    let (_, repeat) = app
        .request(
            Method::POST,
            "/api/progress",
            Some(&token),
            Some(json!({ "exercise_id": exercise.id, "status": "completed" })),
        )
        .await;
    assert_eq!(repeat["repeat"], true);
    assert_eq!(repeat["points_earned"], 0);
    assert_eq!(repeat["perfect_day"], false);

    let (_, abort) = app
        .request(
            Method::POST,
            "/api/progress",
            Some(&token),
            Some(json!({ "exercise_id": exercise.id, "status": "aborted", "watch_seconds": 5 })),
        )
        .await;
    assert_eq!(abort["points_earned"], 0);
    assert_eq!(abort["total_points"], 102);

    let (status, today) = app
        .request(Method::GET, "/api/progress/today", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(today["perfect_day"], true);
    assert_eq!(today["completions"], 6);
    assert_eq!(today["aborts"], 1);
    assert_eq!(today["points_today"], 102);
    assert!(today["missing_groups"].as_array().unwrap().is_empty());

    let (_, history) = app
        .request(Method::GET, "/api/progress?limit=3", Some(&token), None)
        .await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0]["status"], "aborted");
    assert_eq!(history[0]["exercise_title"], exercise.title.as_str());

    let (_, stats) = app
        .request(Method::GET, "/api/users/me/stats", Some(&token), None)
        .await;
    assert_eq!(stats["points"], 102);
    assert_eq!(stats["completed_exercises"], 6);
    assert_eq!(stats["aborted_exercises"], 1);
    assert_eq!(stats["perfect_days"], 1);
    assert_eq!(stats["next_level_points"], 300);

    let (_, catalogue) = app
        .request(Method::GET, "/api/users/me/achievements", Some(&token), None)
        .await;
    let catalogue = catalogue.as_array().unwrap();
    assert_eq!(catalogue.len(), 12);
    assert_eq!(catalogue.iter().filter(|a| a["unlocked"] == true).count(), 3);
}

#[tokio::test]
async fn test_progress_validation() {
    let app = TestApp::new().await;
    let token = app.register("erika@example.com").await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/progress",
            Some(&token),
            Some(json!({
                "exercise_id": "00000000-0000-0000-0000-000000000000",
                "status": "completed",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let exercise = app.exercise_in(MuscleGroup::Core).await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/progress",
            Some(&token),
            Some(json!({
                "exercise_id": exercise.id,
                "status": "completed",
                "watch_seconds": 100000,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
}

#[tokio::test]
async fn test_profile_update_and_password_change() {
    let app = TestApp::new().await;
    let token = app.register("erika@example.com").await;

    let (status, profile) = app
        .request(
            Method::PUT,
            "/api/users/me",
            Some(&token),
            Some(json!({
                "name": "Erika Muster",
                "reminder_enabled": true,
                "reminder_time": "08:30",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Erika Muster");
    assert_eq!(profile["reminder_time"], "08:30");

    let (status, _) = app
        .request(
            Method::PUT,
            "/api/users/me",
            Some(&token),
            Some(json!({ "reminder_time": "25:99" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, profile) = app
        .request(
            Method::PUT,
            "/api/users/me",
            Some(&token),
            Some(json!({ "reminder_time": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(profile["reminder_time"].is_null());
    assert_eq!(profile["reminder_enabled"], true);

    let (status, _) = app
        .request(
            Method::PUT,
            "/api/users/me/password",
            Some(&token),
            Some(json!({ "current_password": PASSWORD, "new_password": "neuesPasswort7" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let login = app
        .cookie_request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "erika@example.com", "password": "neuesPasswort7" })),
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_email_change_conflict() {
    let app = TestApp::new().await;
    app.register("first@example.com").await;
    let token = app.register("second@example.com").await;

    let (status, _) = app
        .request(
            Method::PUT,
            "/api/users/me",
            Some(&token),
            Some(json!({ "email": "First@Example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_account_removes_progress() {
    let app = TestApp::new().await;
    let token = app.register("erika@example.com").await;
    let exercise = app.exercise_in(MuscleGroup::Back).await;
    app.request(
        Method::POST,
        "/api/progress",
        Some(&token),
        Some(json!({ "exercise_id": exercise.id, "status": "completed" })),
    )
    .await;

    let (_, me) = app.request(Method::GET, "/api/auth/me", Some(&token), None).await;
    let user_id = me["id"].as_str().unwrap().parse().unwrap();

    let (status, _) = app
        .request(Method::DELETE, "/api/users/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let counts = app.store.progress_counts(user_id).await.unwrap();
    assert_eq!(counts.completed, 0);
}

#[tokio::test]
async fn test_contact_form_with_and_without_session() {
    let app = TestApp::new().await;
    let message = json!({
        "name": "Erika",
        "email": "erika@example.com",
        "subject": "Frage",
        "message": "Wie oft sollte ich üben?",
    });

    let anonymous = app
        .cookie_request(Method::POST, "/api/contact", None, Some(message.clone()))
        .await;
    assert_eq!(anonymous.status(), StatusCode::CREATED);

    let token = app.register("erika@example.com").await;
    let (status, _) = app
        .request(Method::POST, "/api/contact", Some(&token), Some(message))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let stored = app.store.list_contact_messages(10, 0).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored.iter().filter(|m| m.user_id.is_some()).count(), 1);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/contact",
            Some(&token),
            Some(json!({ "name": "Erika", "email": "erika@example.com", "message": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let app = TestApp::new().await;
    let token = app.register("erika@example.com").await;

    let (status, body) = app
        .raw_request(Method::POST, "/api/progress", &token, "{\"exercise_id\": ")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    assert_eq!(body["message"], "Die Anfrage enthält kein gültiges JSON.");

    let (status, body) = app
        .raw_request(Method::POST, "/api/progress", &token, r#"{"status": "completed"}"#)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (status, body) = app
        .request(Method::GET, "/api/exercises/keine-uuid", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (status, body) = app
        .request(Method::GET, "/api/exercises?muscle_group=nacken", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}
