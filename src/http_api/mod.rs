use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::Local;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    CalendarCollection, CalendarError, CalendarStore, Entry, EntryType, GoalRef, SchedulerConfig,
    StoreError, expand, goal_validation::validate_hours_per_week, parse_timestamp,
};

/// Shared state: the live collection, the scheduler settings used by
/// `/expand`, and an optional store every mutation is written to.
#[derive(Clone)]
pub struct AppState {
    calendars: Arc<RwLock<CalendarCollection>>,
    config: Arc<SchedulerConfig>,
    store: Option<Arc<dyn CalendarStore + Send + Sync>>,
}

impl AppState {
    pub fn new(calendars: CalendarCollection) -> Self {
        Self {
            calendars: Arc::new(RwLock::new(calendars)),
            config: Arc::new(SchedulerConfig::default()),
            store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn CalendarStore + Send + Sync>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    fn calendars(&self) -> Arc<RwLock<CalendarCollection>> {
        self.calendars.clone()
    }

    fn persist(&self, calendars: &CalendarCollection) -> Result<(), ApiError> {
        if let Some(store) = &self.store {
            store.save_calendars(calendars)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<CalendarError> for ApiError {
    fn from(value: CalendarError) -> Self {
        match value {
            CalendarError::EmptyName => ApiError::Invalid(value.to_string()),
            CalendarError::AlreadyExists(_) => ApiError::Conflict(value.to_string()),
            CalendarError::NotFound(_) | CalendarError::EntryOutOfRange { .. } => {
                ApiError::NotFound(value.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        tracing::error!(error = %value, "failed to persist calendars");
        ApiError::Internal(format!("could not save calendars: {value}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Serialize)]
struct CalendarSummary {
    name: String,
    entries: usize,
}

#[derive(Debug, Deserialize)]
struct CreateCalendarPayload {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreateEntryPayload {
    #[serde(rename = "type")]
    entry_type: EntryType,
    date: String,
    description: String,
    #[serde(default)]
    hours_per_week: Option<i64>,
}

#[derive(Debug, Serialize)]
struct CreatedEntry {
    position: usize,
    entry: Entry,
}

#[derive(Debug, Serialize)]
struct SkippedGoal {
    goal: GoalRef,
    error: String,
}

#[derive(Debug, Serialize)]
struct ExpansionBody {
    goals_expanded: usize,
    sub_goals: usize,
    skipped: Vec<SkippedGoal>,
    clamped: Vec<GoalRef>,
    calendars: CalendarCollection,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/calendars", get(list_calendars).post(create_calendar))
        .route("/calendars/:name", delete(delete_calendar))
        .route(
            "/calendars/:name/entries",
            get(list_entries).post(create_entry),
        )
        .route(
            "/calendars/:name/entries/:position",
            delete(delete_entry),
        )
        .route("/expand", post(expand_preview))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Runs lock or store work on the blocking pool so a slow save never stalls
/// the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|err| {
        tracing::error!(error = %err, "blocking request task failed");
        ApiError::Internal(format!("request task failed: {err}"))
    })?
}

async fn list_calendars(
    State(state): State<AppState>,
) -> Result<Json<Vec<CalendarSummary>>, ApiError> {
    blocking(move || {
        let calendars = state.calendars();
        let guard = calendars.read();
        let summaries = guard
            .iter()
            .map(|(name, calendar)| CalendarSummary {
                name: name.to_string(),
                entries: calendar.len(),
            })
            .collect();
        Ok(Json(summaries))
    })
    .await
}

async fn create_calendar(
    State(state): State<AppState>,
    Json(payload): Json<CreateCalendarPayload>,
) -> Result<(StatusCode, Json<CalendarSummary>), ApiError> {
    blocking(move || {
        let calendars = state.calendars();
        let mut guard = calendars.write();
        guard.add_calendar(&payload.name)?;
        let name = payload.name.trim().to_string();
        tracing::info!(calendar = %name, "calendar added");
        state.persist(&guard)?;
        Ok((
            StatusCode::CREATED,
            Json(CalendarSummary { name, entries: 0 }),
        ))
    })
    .await
}

async fn delete_calendar(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    blocking(move || {
        let calendars = state.calendars();
        let mut guard = calendars.write();
        guard.remove_calendar(&name)?;
        tracing::info!(calendar = %name, "calendar deleted");
        state.persist(&guard)?;
        Ok(StatusCode::NO_CONTENT)
    })
    .await
}

async fn list_entries(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    blocking(move || {
        let calendars = state.calendars();
        let guard = calendars.read();
        let calendar = guard
            .calendar(&name)
            .ok_or_else(|| ApiError::not_found(format!("calendar '{name}' not found")))?;
        Ok(Json(calendar.entries().to_vec()))
    })
    .await
}

fn entry_from_payload(payload: CreateEntryPayload) -> Result<Entry, ApiError> {
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(ApiError::invalid("description must not be empty"));
    }
    let date = parse_timestamp(&payload.date).map_err(|err| ApiError::invalid(err.to_string()))?;
    match payload.entry_type {
        EntryType::Event => Ok(Entry::event(date, description)),
        EntryType::Goal => {
            let hours = payload
                .hours_per_week
                .ok_or_else(|| ApiError::invalid("goals need hours_per_week"))?;
            validate_hours_per_week(hours).map_err(|err| ApiError::invalid(err.to_string()))?;
            Ok(Entry::goal(date, description, hours))
        }
        EntryType::SubGoal => Err(ApiError::invalid(
            "sub-goals are generated by /expand and cannot be added directly",
        )),
    }
}

async fn create_entry(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<CreateEntryPayload>,
) -> Result<(StatusCode, Json<CreatedEntry>), ApiError> {
    let entry = entry_from_payload(payload)?;
    blocking(move || {
        let calendars = state.calendars();
        let mut guard = calendars.write();
        let calendar = guard
            .calendar_mut(&name)
            .ok_or_else(|| ApiError::not_found(format!("calendar '{name}' not found")))?;
        calendar.push(entry.clone());
        let position = calendar.len() - 1;
        state.persist(&guard)?;
        Ok((StatusCode::CREATED, Json(CreatedEntry { position, entry })))
    })
    .await
}

async fn delete_entry(
    State(state): State<AppState>,
    Path((name, position)): Path<(String, usize)>,
) -> Result<Json<Entry>, ApiError> {
    blocking(move || {
        let calendars = state.calendars();
        let mut guard = calendars.write();
        let calendar = guard
            .calendar_mut(&name)
            .ok_or_else(|| ApiError::not_found(format!("calendar '{name}' not found")))?;
        let removed = calendar.remove(position)?;
        state.persist(&guard)?;
        Ok(Json(removed))
    })
    .await
}

async fn expand_preview(State(state): State<AppState>) -> Result<Json<ExpansionBody>, ApiError> {
    blocking(move || {
        let snapshot = {
            let calendars = state.calendars();
            let guard = calendars.read();
            guard.clone()
        };
        let report = expand(&snapshot, &state.config, Local::now().naive_local());
        Ok(Json(ExpansionBody {
            goals_expanded: report.goals_expanded,
            sub_goals: report.generated,
            skipped: report
                .skipped
                .into_iter()
                .map(|skip| SkippedGoal {
                    goal: skip.goal,
                    error: skip.error.to_string(),
                })
                .collect(),
            clamped: report.clamped,
            calendars: report.collection,
        }))
    })
    .await
}
