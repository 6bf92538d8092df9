use crate::AppState;
use crate::api::handlers::{catalog, sessions};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Routes mounted under `/api`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(catalog::health))
        .route("/domains", get(catalog::list_domains))
        .route("/tools", get(catalog::list_tools))
        .route("/sessions", post(sessions::start_session))
        .route("/sessions/stream", get(sessions::stream_session))
}

/// The full application: API routes, CORS, request tracing and optional docs.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::HeaderName::from_static(
            sessions::SESSION_ID_HEADER,
        )]);

    let router = Router::new().nest("/api", create_router());

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", crate::api::ApiDoc::openapi()),
        )
    };

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
