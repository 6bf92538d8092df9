use crate::{
    AppState,
    research::Frame,
    types::{AppError, CollabEvent, Result, StartSessionRequest},
};
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::StreamExt;
use std::convert::Infallible;

/// Header carrying the id of the session behind a stream.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Start a session from query parameters and stream its events
#[utoipa::path(
    get,
    path = "/api/sessions/stream",
    params(
        ("topic" = String, Query, description = "Research topic"),
        ("mode" = Option<String>, Query, description = "broad, molecular, translational or evidence"),
        ("participants" = Option<usize>, Query, description = "Override the number of agents")
    ),
    responses(
        (status = 200, description = "Server-sent event stream of CollabEvent records", body = CollabEvent, content_type = "text/event-stream"),
        (status = 400, description = "Invalid input")
    ),
    tag = "sessions"
)]
pub async fn stream_session(
    State(state): State<AppState>,
    request: std::result::Result<Query<StartSessionRequest>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(request) = request.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    open_stream(&state, request)
}

/// Start a session from a JSON body and stream its events
#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = StartSessionRequest,
    responses(
        (status = 200, description = "Server-sent event stream of CollabEvent records", body = CollabEvent, content_type = "text/event-stream"),
        (status = 400, description = "Invalid input")
    ),
    tag = "sessions"
)]
pub async fn start_session(
    State(state): State<AppState>,
    request: std::result::Result<Json<StartSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = request.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    open_stream(&state, request)
}

fn open_stream(state: &AppState, request: StartSessionRequest) -> Result<impl IntoResponse + use<>> {
    let (id, frames) = state.start_session(&request)?;
    let events = frames.map(|frame| Ok::<_, Infallible>(to_sse(frame)));
    Ok((
        [(SESSION_ID_HEADER, id.to_string())],
        Sse::new(events).keep_alive(KeepAlive::default()),
    ))
}

fn to_sse(frame: Frame) -> Event {
    match frame {
        Frame::Event(event) => match serde_json::to_string(&event) {
            Ok(json) => Event::default().event(event.event_type.as_str()).data(json),
            Err(e) => {
                tracing::warn!(error = %e, agent = %event.agent, "Dropping unserializable event");
                Event::default().comment("skipped")
            }
        },
        Frame::Heartbeat => Event::default().comment("heartbeat"),
    }
}
