//! HTTP API Handlers and Routes
//!
//! The REST and streaming surface for Convene, built on the Axum web framework.
//!
//! # API Endpoints
//!
//! ## Sessions (`/api/sessions`)
//! - `POST /api/sessions` - Start a session from a JSON body; responds with an SSE stream
//! - `GET /api/sessions/stream?topic=&mode=&participants=` - Same, from query parameters
//!
//! Each SSE message carries one `CollabEvent` as JSON, with the event type as
//! the SSE `event:` name. Comment frames are sent as keep-alives. The stream
//! ends after `session_done` or a single `timeout` event. The session id is
//! returned in the `x-session-id` response header.
//!
//! ## Catalog
//! - `GET /api/health` - Health check endpoint
//! - `GET /api/domains` - Agent domain roster
//! - `GET /api/tools` - Registered data sources and their figure family
//!
//! # OpenAPI Documentation
//!
//! When the `swagger-ui` feature is enabled, interactive API documentation
//! is available at `/swagger-ui/`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    CollabEvent, DomainSummary, EventType, HealthResponse, SessionMode, StartSessionRequest,
    ToolSummary,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::catalog::health,
        handlers::catalog::list_domains,
        handlers::catalog::list_tools,
        handlers::sessions::start_session,
        handlers::sessions::stream_session,
    ),
    components(schemas(
        StartSessionRequest,
        SessionMode,
        CollabEvent,
        EventType,
        HealthResponse,
        DomainSummary,
        ToolSummary,
    )),
    tags(
        (name = "sessions", description = "Collaborative investigation sessions"),
        (name = "meta", description = "Server, domain and tool metadata")
    )
)]
pub struct ApiDoc;
