#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use seniorfit::api::routes::create_routes;
use seniorfit::auth::password::hash_password;
use seniorfit::auth::UserRole;
use seniorfit::config::{AppConfig, DatabaseSeeder};
use seniorfit::models::{Exercise, ExerciseFilter, MuscleGroup, User};
use seniorfit::store::{MemoryStore, Store};
use seniorfit::AppState;

pub const PASSWORD: &str = "sicher123";
pub const CSRF: &str = "test-csrf-token";

/// Full router over an in-memory store seeded with the default catalogue.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        DatabaseSeeder::new(store.clone(), 4)
            .seed_exercises()
            .await
            .expect("seeding the memory store");

        let state = AppState::new(store.clone(), AppConfig::for_testing());
        Self {
            router: create_routes(state),
            store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Bearer-authenticated JSON request, exempt from the CSRF check.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = self.send(with_json(builder, body)).await;
        read_json(response).await
    }

    /// Bearer-authenticated request with a body sent verbatim.
    pub async fn raw_request(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: &str,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request");
        read_json(self.send(request).await).await
    }

    /// Browser-style request: session cookie plus double-submitted CSRF token.
    pub async fn cookie_request(
        &self,
        method: Method,
        uri: &str,
        session: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let cookie = match session {
            Some(session) => format!("csrf_token={CSRF}; session={session}"),
            None => format!("csrf_token={CSRF}"),
        };
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header("x-csrf-token", CSRF);
        self.send(with_json(builder, body)).await
    }

    /// Registers through the API and returns the session token.
    pub async fn register(&self, email: &str) -> String {
        let response = self
            .cookie_request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": PASSWORD,
                    "name": "Test Person",
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let (_, body) = read_json(response).await;
        body["token"].as_str().expect("token in body").to_string()
    }

    /// Creates an admin directly in the store and logs in through the API.
    pub async fn admin(&self, email: &str) -> (User, String) {
        let hash = hash_password(PASSWORD, 4).expect("hashing");
        let admin = User::new(email, "Admin", hash, UserRole::Admin, Utc::now());
        self.store.insert_user(&admin).await.expect("insert admin");

        let response = self
            .cookie_request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let (_, body) = read_json(response).await;
        (admin, body["token"].as_str().expect("token in body").to_string())
    }

    pub async fn exercise_in(&self, group: MuscleGroup) -> Exercise {
        self.store
            .list_exercises(&ExerciseFilter {
                muscle_group: Some(group),
                ..Default::default()
            })
            .await
            .expect("list exercises")
            .into_iter()
            .next()
            .expect("seeded catalogue covers every group")
    }
}

fn with_json(builder: axum::http::request::Builder, body: Option<Value>) -> Request<Body> {
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    }
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// All `Set-Cookie` values of a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}
