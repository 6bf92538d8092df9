use crate::{
    AppState,
    research::domains::DOMAINS,
    types::{DomainSummary, HealthResponse, ToolSummary},
};
use axum::{Json, extract::State};

/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Server is up", body = HealthResponse)),
    tag = "meta"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List every domain an agent can represent
#[utoipa::path(
    get,
    path = "/api/domains",
    responses((status = 200, description = "Domain roster", body = [DomainSummary])),
    tag = "meta"
)]
pub async fn list_domains() -> Json<Vec<DomainSummary>> {
    Json(DOMAINS.iter().map(|d| d.summary()).collect())
}

/// List registered data sources with their figure family
#[utoipa::path(
    get,
    path = "/api/tools",
    responses((status = 200, description = "Registered tools", body = [ToolSummary])),
    tag = "meta"
)]
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolSummary>> {
    Json(
        state
            .registry
            .tool_names()
            .into_iter()
            .map(|name| ToolSummary {
                family: state.registry.family_of(&name).map(|f| f.label().to_string()),
                name,
            })
            .collect(),
    )
}
