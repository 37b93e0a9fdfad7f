#![cfg(feature = "http_api")]

use std::sync::{Arc, Mutex, mpsc};

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use campusflow::{CalendarCollection, CalendarStore, Entry, MemoryStore, StoreResult, http_api};
use serde_json::{Value, json};
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    http_api::router(http_api::AppState::new(CalendarCollection::new()))
}

fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn calendar_and_entry_lifecycle() {
    let app = new_router();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/calendars", json!({ "name": "School" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/calendars/School/entries",
            json!({
                "type": "Goal",
                "date": "2024-12-20T18:00:00",
                "description": "Thesis",
                "hours_per_week": 3
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["position"], json!(0));
    assert_eq!(created["entry"]["type"], json!("Goal"));

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/calendars/School/entries"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let entries: Vec<Entry> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].weekly_hours(), Some(3));

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/calendars/School/entries/0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/calendars/School/entries/0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/calendars/School"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(empty_request("GET", "/calendars"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn duplicate_calendar_conflicts() {
    let app = new_router();
    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/calendars", json!({ "name": "Work" })))
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }

    let response = app
        .oneshot(json_request("POST", "/calendars", json!({ "name": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], json!("invalid_request"));
}

#[tokio::test]
async fn invalid_entries_are_rejected() {
    let app = new_router();
    app.clone()
        .oneshot(json_request("POST", "/calendars", json!({ "name": "Home" })))
        .await
        .unwrap();

    let bad_payloads = [
        json!({ "type": "Goal", "date": "2024-12-20T18:00:00", "description": "Run" }),
        json!({ "type": "Goal", "date": "2024-12-20T18:00:00", "description": "Run", "hours_per_week": 0 }),
        json!({ "type": "Event", "date": "tomorrow", "description": "Run" }),
        json!({ "type": "Event", "date": "2024-12-20T18:00:00", "description": " " }),
        json!({ "type": "Sub-Goal", "date": "2024-12-20T18:00:00", "description": "Run_1" }),
    ];
    for payload in bad_payloads {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/calendars/Home/entries", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app
        .oneshot(json_request(
            "POST",
            "/calendars/Nowhere/entries",
            json!({ "type": "Event", "date": "2024-12-20T18:00:00", "description": "Run" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], json!("not_found"));
}

#[tokio::test]
async fn expand_preview_does_not_mutate() {
    let app = new_router();
    app.clone()
        .oneshot(json_request("POST", "/calendars", json!({ "name": "School" })))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            "/calendars/School/entries",
            json!({ "type": "Goal", "date": "2020-01-10T18:00:00", "description": "Old", "hours_per_week": 2 }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/expand"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["goals_expanded"], json!(1));
    assert_eq!(report["sub_goals"], json!(0));
    assert_eq!(report["calendars"]["School"]["events"].as_array().unwrap().len(), 1);

    let response = app
        .oneshot(empty_request("GET", "/calendars"))
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await,
        json!([{ "name": "School", "entries": 1 }])
    );
}

#[tokio::test]
async fn mutations_reach_the_store() {
    let store = Arc::new(MemoryStore::new());
    let state = http_api::AppState::new(CalendarCollection::new()).with_store(store.clone());
    let app = http_api::router(state);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/calendars", json!({ "name": "Work" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(store.snapshot().unwrap().contains("Work"));

    store.set_fail_saves(true);
    let response = app
        .oneshot(json_request("POST", "/calendars", json!({ "name": "Home" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!store.snapshot().unwrap().contains("Home"));
}

#[tokio::test]
async fn health_reports_ok() {
    let response = new_router()
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

/// Store whose saves block until the test releases them.
struct GatedStore {
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl CalendarStore for GatedStore {
    fn save_calendars(&self, _calendars: &CalendarCollection) -> StoreResult<()> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        Ok(())
    }

    fn load_calendars(&self) -> StoreResult<Option<CalendarCollection>> {
        Ok(None)
    }
}

#[tokio::test(flavor = "current_thread")]
async fn slow_save_does_not_stall_other_requests() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(GatedStore {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let app = http_api::router(http_api::AppState::new(CalendarCollection::new()).with_store(store));

    let create = tokio::spawn(
        app.clone()
            .oneshot(json_request("POST", "/calendars", json!({ "name": "School" }))),
    );
    tokio::task::spawn_blocking(move || entered_rx.recv())
        .await
        .unwrap()
        .unwrap();

    // the save is parked while holding the write lock
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    release_tx.send(()).unwrap();
    let response = create.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}
