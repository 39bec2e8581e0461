//! End-to-end flows through the HTTP router

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use drivebook::assistant::llm::ChatMessage;
use drivebook::assistant::{Assistant, ChatBackend, FAILURE_REPLY};
use drivebook::server::{router, ServerState};
use drivebook::{Config, Store};

struct Harness {
    app: Router,
    _dir: TempDir,
}

impl Harness {
    async fn new(assistant: Assistant) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("drivebook.db")).await.unwrap();
        let app = router(ServerState::new(Config::default(), store, assistant)).unwrap();
        Self { app, _dir: dir }
    }

    async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Returns (id, token)
    async fn register(&self, body: Value) -> (String, String) {
        let (status, resp) = self.call("POST", "/api/auth/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", resp);
        (
            resp["user"]["id"].as_str().unwrap().to_string(),
            resp["token"].as_str().unwrap().to_string(),
        )
    }
}

async fn marketplace(h: &Harness) -> [(String, String); 3] {
    let learner = h
        .register(json!({
            "name": "Lee Nguyen", "email": "lee@example.com", "password": "pass1234",
            "role": "learner", "location": "Parramatta", "transmission_preference": "Auto"
        }))
        .await;
    let instructor = h
        .register(json!({
            "name": "Sarah Jenkins", "email": "sarah@example.com", "password": "pass1234",
            "role": "instructor", "location": "Bondi", "vehicle": "Auto", "price": 75,
            "bio": "Patient and calm", "experience": 8
        }))
        .await;
    let admin = h
        .register(json!({
            "name": "Admin", "email": "admin@example.com", "password": "pass1234", "role": "admin"
        }))
        .await;
    [learner, instructor, admin]
}

#[tokio::test]
async fn booking_lifecycle_review_and_progress() {
    let h = Harness::new(Assistant::disabled()).await;
    let [(lee, lee_token), (sarah, sarah_token), (_, admin_token)] = marketplace(&h).await;

    // search shows the new instructor with the default rating
    let (_, cards) = h.call("GET", "/api/instructors?vehicle=Auto&sort=price", None, None).await;
    assert_eq!(cards.as_array().unwrap().len(), 1);
    assert_eq!(cards[0]["rating"], 4.8);
    assert_eq!(cards[0]["reviews"], 0);

    // a learner cannot book on someone else's behalf
    let request = json!({
        "learner_id": lee, "instructor_id": sarah,
        "date": "2026-11-02T09:00:00Z", "package_id": "p2"
    });
    let (status, _) = h.call("POST", "/api/bookings", Some(&sarah_token), Some(request.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, booking) = h.call("POST", "/api/bookings", Some(&lee_token), Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["accepted"], 0);
    let booking_id = booking["id"].as_str().unwrap().to_string();

    // both sides see the same booking
    let (_, mine) = h.call("GET", &format!("/api/bookings/user/{}", lee), Some(&lee_token), None).await;
    let (_, theirs) = h
        .call("GET", &format!("/api/bookings/instructor/{}", sarah), Some(&sarah_token), None)
        .await;
    assert_eq!(mine[0]["id"], theirs[0]["id"]);
    assert_eq!(mine[0]["instructor_name"], "Sarah Jenkins");
    assert_eq!(mine[0]["vehicle"], "Auto");
    assert_eq!(theirs[0]["learner_name"], "Lee Nguyen");

    // only the instructor decides, and only once
    let accept = format!("/api/bookings/{}/accept", booking_id);
    let (status, _) = h.call("PUT", &accept, Some(&lee_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, accepted) = h.call("PUT", &accept, Some(&sarah_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["accepted"], 1);
    let (status, _) = h
        .call("PUT", &format!("/api/bookings/{}/reject", booking_id), Some(&sarah_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // lesson runs
    let status_uri = format!("/api/bookings/{}/status", booking_id);
    let (status, body) = h
        .call("PUT", &status_uri, Some(&sarah_token), Some(json!({"status": "finished"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status value");
    let (status, _) = h
        .call("PUT", &status_uri, Some(&sarah_token), Some(json!({"status": "in-progress"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, done) = h
        .call("PUT", &status_uri, Some(&sarah_token), Some(json!({"status": "completed"})))
        .await;
    assert_eq!(done["status"], "completed");

    // review feeds the instructor's rating
    let (status, _) = h
        .call(
            "POST",
            "/api/reviews",
            Some(&lee_token),
            Some(json!({
                "booking_id": booking_id, "instructor_id": sarah, "learner_id": lee,
                "rating": 4, "comment": "Great with roundabouts"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, profile) = h.call("GET", &format!("/api/instructors/{}", sarah), None, None).await;
    assert_eq!(profile["rating"], 4.0);
    assert_eq!(profile["reviews"], 1);
    assert_eq!(profile["bio"], "Patient and calm");
    let (_, reviews) = h.call("GET", &format!("/api/instructors/{}/reviews", sarah), None, None).await;
    assert_eq!(reviews[0]["author_name"], "Lee Nguyen");

    // instructor records progress; the learner reads it back
    let progress_uri = format!("/api/progress/{}", lee);
    let (_, defaults) = h.call("GET", &progress_uri, Some(&lee_token), None).await;
    assert_eq!(defaults.as_array().unwrap().len(), 4);
    for pct in [30, 55] {
        let (status, _) = h
            .call(
                "POST",
                "/api/progress",
                Some(&sarah_token),
                Some(json!({"learner_id": lee, "skill": "Parking", "percentage": pct})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, progress) = h.call("GET", &progress_uri, Some(&lee_token), None).await;
    assert_eq!(progress.as_array().unwrap().len(), 1);
    assert_eq!(progress[0]["percentage"], 55);

    // admin overview and cleanup
    let (_, all) = h.call("GET", "/api/bookings/all", Some(&admin_token), None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    let (status, _) = h
        .call("DELETE", &format!("/api/bookings/{}", booking_id), Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = h
        .call("DELETE", &format!("/api/bookings/{}", booking_id), Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_account_rules() {
    let h = Harness::new(Assistant::disabled()).await;
    let [(lee, lee_token), _, (admin, admin_token)] = marketplace(&h).await;

    let (status, body) = h
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"name": "Second", "email": "two@example.com", "password": "x", "role": "admin"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "An admin user already exists");

    let (status, body) = h.call("DELETE", &format!("/api/users/{}", admin), Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot delete the only admin user");

    let (status, _) = h.call("DELETE", &format!("/api/users/{}", lee), Some(&lee_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = h.call("DELETE", &format!("/api/users/{}", lee), Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = h.call("GET", &format!("/api/users/{}", lee), Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, learners) = h.call("GET", "/api/learners", None, None).await;
    assert!(learners.as_array().unwrap().is_empty());
}

struct CannedBackend(Option<&'static str>);

#[async_trait]
impl ChatBackend for CannedBackend {
    async fn complete(&self, messages: Vec<ChatMessage>) -> anyhow::Result<String> {
        assert_eq!(messages.first().map(|m| m.role.as_str()), Some("system"));
        self.0
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("upstream unavailable"))
    }
}

#[tokio::test]
async fn chat_replies_and_failures() {
    let ok = Harness::new(Assistant::with_backend(Arc::new(CannedBackend(Some("Check your mirrors."))))).await;
    let body = json!({
        "history": [{"role": "user", "text": "Hi"}, {"role": "model", "text": "Hello!"}],
        "message": "Any tips for my test?"
    });
    let (status, reply) = ok.call("POST", "/api/chat", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["reply"], "Check your mirrors.");

    let (status, _) = ok.call("POST", "/api/chat", None, Some(json!({"message": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let failing = Harness::new(Assistant::with_backend(Arc::new(CannedBackend(None)))).await;
    let (status, reply) = failing.call("POST", "/api/chat", None, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["reply"], FAILURE_REPLY);
}
