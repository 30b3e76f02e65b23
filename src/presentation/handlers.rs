// HTTP request handlers
use crate::domain::channel::validate_channels;
use crate::domain::error::DashboardError;
use crate::domain::scale::ScaleMode;
use crate::domain::time_range::TimeRange;
use crate::presentation::app_state::AppState;
use crate::presentation::dto::{
    CreateSessionRequest, CreateSessionResponse, PinchRequest, RangeDescriptor, RangeRequest,
    ViewModelResponse, ZoomResponse,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn session_not_found(id: u64) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("no dashboard session {}", id),
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(error: DashboardError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_ranges() -> Json<Vec<RangeDescriptor>> {
    Json(TimeRange::ALL.into_iter().map(RangeDescriptor::from).collect())
}

/// Open and activate a dashboard session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    validate_channels(&request.channels)?;

    let session = state
        .dashboard_service
        .open_session(request.channels, request.kind);
    let (id, session) = state.sessions.insert(session);
    session.activate();

    tracing::info!(session = id, open_sessions = state.sessions.len(), "dashboard session created");
    Ok((StatusCode::CREATED, Json(CreateSessionResponse { id })))
}

pub async fn get_session(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ViewModelResponse>, ApiError> {
    let session = state.sessions.get(id).ok_or(ApiError::session_not_found(id))?;
    let response = ViewModelResponse::from(&session.snapshot());
    Ok(Json(response))
}

/// Server-sent events, one per view-model change, starting with the current one
pub async fn stream_session(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.get(id).ok_or(ApiError::session_not_found(id))?;
    let mut rx = session.subscribe();
    drop(session);

    let stream = async_stream::stream! {
        loop {
            let response = ViewModelResponse::from(&*rx.borrow_and_update());
            yield Event::default().event("viewModel").json_data(&response);
            if rx.changed().await.is_err() {
                tracing::debug!(session = id, "session closed, ending stream");
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub async fn select_range(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<RangeRequest>,
) -> Result<StatusCode, ApiError> {
    let session = state.sessions.get(id).ok_or(ApiError::session_not_found(id))?;
    let range = TimeRange::from_label(&request.label)?;
    session.select_range(range);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_scale(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
    Json(mode): Json<ScaleMode>,
) -> Result<StatusCode, ApiError> {
    let session = state.sessions.get(id).ok_or(ApiError::session_not_found(id))?;
    session.set_scale_mode(mode);
    Ok(StatusCode::NO_CONTENT)
}

/// Feed one pinch gesture sample, or end the gesture
pub async fn pinch(
    Path((id, channel_id)): Path<(u64, String)>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<PinchRequest>,
) -> Result<Json<ZoomResponse>, ApiError> {
    let session = state.sessions.get(id).ok_or(ApiError::session_not_found(id))?;
    let unknown_channel = || ApiError {
        status: StatusCode::NOT_FOUND,
        message: format!("channel {:?} is not on this dashboard", channel_id),
    };

    let level = if request.ended {
        if !session.pinch_end(&channel_id) {
            return Err(unknown_channel());
        }
        session.snapshot().zoom.level(&channel_id)
    } else {
        session
            .pinch_update(&channel_id, request.scale)
            .ok_or_else(unknown_channel)?
    };

    Ok(Json(ZoomResponse::new(channel_id, level)))
}

pub async fn delete_session(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    let session = state.sessions.remove(id).ok_or(ApiError::session_not_found(id))?;
    session.deactivate();
    Ok(StatusCode::NO_CONTENT)
}
