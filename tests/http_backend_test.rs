//! REST adapter tests against a local axum server

#![cfg(feature = "http")]

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use staffcall::config::{BackendConfig, Config};
use staffcall::domain::call::{CallDirectory, CredentialIssuer};
use staffcall::domain::meeting::{MeetingRepository, MeetingStatus};
use staffcall::domain::shared::{ActorId, CallId, MeetingId, ServiceError};
use staffcall::domain::user::Actor;
use staffcall::infrastructure::http::HttpBackend;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Recorded {
    status_writes: Arc<Mutex<Vec<(String, Value)>>>,
    auth_headers: Arc<Mutex<Vec<String>>>,
}

fn remember_auth(recorded: &Recorded, headers: &HeaderMap) {
    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        recorded.auth_headers.lock().unwrap().push(value.to_string());
    }
}

async fn default_call(State(recorded): State<Recorded>, headers: HeaderMap) -> Json<Value> {
    remember_auth(&recorded, &headers);
    Json(json!({ "callId": "dept-3", "departmentId": 3, "departmentName": "Sales" }))
}

async fn call_token(
    Path(call_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match call_id.as_str() {
        "room-42" => Ok(Json(json!({
            "token": "tok-42",
            "apiKey": "key-1",
            "userId": 7,
            "userName": "Ana",
            "userImage": null
        }))),
        "a/b" => Ok(Json(json!({
            "token": "tok-ab",
            "apiKey": "key-1",
            "userId": 8,
            "userName": "Bo",
            "userImage": null
        }))),
        "closed" => Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "Call is closed" })),
        )),
        _ => Err((StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})))),
    }
}

async fn meeting(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if id == "m1" {
        Ok(Json(json!({ "id": "m1", "createdById": 7, "status": "SCHEDULED" })))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn meeting_status(
    State(recorded): State<Recorded>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    recorded.status_writes.lock().unwrap().push((id, body));
    StatusCode::NO_CONTENT
}

async fn spawn_backend() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/calls/default", get(default_call))
        .route("/api/calls/:call_id/token", post(call_token))
        .route("/api/meetings/:id", get(meeting))
        .route("/api/meetings/:id/status", patch(meeting_status))
        .with_state(recorded.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), recorded)
}

fn backend_config(base_url: String) -> BackendConfig {
    let mut config = Config::default().backend;
    config.base_url = base_url;
    config.api_token = Some("secret".to_string());
    config.request_timeout_secs = Some(5);
    config
}

#[tokio::test]
async fn test_default_call_target_with_bearer_token() {
    let (base_url, recorded) = spawn_backend().await;
    let backend = HttpBackend::new(&backend_config(base_url)).unwrap();

    let target = backend
        .default_call_target(&Actor::new(9, "Cy"))
        .await
        .unwrap();

    assert_eq!(target.call_id, CallId::new("dept-3"));
    assert_eq!(target.department_id.value(), 3);
    assert_eq!(target.department_name.as_deref(), Some("Sales"));
    assert_eq!(*recorded.auth_headers.lock().unwrap(), vec!["Bearer secret"]);
}

#[tokio::test]
async fn test_issue_credential() {
    let (base_url, _) = spawn_backend().await;
    let backend = HttpBackend::new(&backend_config(base_url)).unwrap();

    let credential = backend.issue(&CallId::new("room-42")).await.unwrap();

    assert!(credential.is_complete());
    assert_eq!(credential.actor_id, ActorId::new(7));
    assert_eq!(credential.actor_display_name, "Ana");
    assert!(credential.actor_image.is_none());
}

#[tokio::test]
async fn test_error_message_is_extracted() {
    let (base_url, _) = spawn_backend().await;
    let backend = HttpBackend::new(&backend_config(base_url)).unwrap();

    let err = backend.issue(&CallId::new("closed")).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Http {
            status: 403,
            message: Some("Call is closed".to_string())
        }
    );

    let err = backend.issue(&CallId::new("other")).await.unwrap_err();
    assert_eq!(err.user_message(), None);
}

#[tokio::test]
async fn test_meeting_lookup_and_not_found() {
    let (base_url, _) = spawn_backend().await;
    let backend = HttpBackend::new(&backend_config(base_url)).unwrap();

    let record = backend.get(&MeetingId::new("m1")).await.unwrap();
    assert_eq!(record.created_by_id, ActorId::new(7));
    assert_eq!(record.status, MeetingStatus::Scheduled);

    let err = backend.get(&MeetingId::new("m2")).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_status_write_sends_upper_case_status() {
    let (base_url, recorded) = spawn_backend().await;
    let backend = HttpBackend::new(&backend_config(base_url)).unwrap();

    backend
        .set_status(&MeetingId::new("m1"), MeetingStatus::Completed)
        .await
        .unwrap();

    let writes = recorded.status_writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, "m1");
    assert_eq!(writes[0].1, json!({ "status": "COMPLETED" }));
}

#[tokio::test]
async fn test_ids_with_reserved_characters_stay_in_one_segment() {
    let (base_url, recorded) = spawn_backend().await;
    let backend = HttpBackend::new(&backend_config(base_url)).unwrap();

    let credential = backend.issue(&CallId::new("a/b")).await.unwrap();
    assert_eq!(credential.token, "tok-ab");
    assert_eq!(credential.actor_id, ActorId::new(8));

    backend
        .set_status(&MeetingId::new("x?y#z"), MeetingStatus::Completed)
        .await
        .unwrap();

    let writes = recorded.status_writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, "x?y#z");
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(&backend_config(format!("http://{}/api", addr))).unwrap();
    let err = backend.get(&MeetingId::new("m1")).await.unwrap_err();

    assert!(matches!(err, ServiceError::Network(_)));
}
