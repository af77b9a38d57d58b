use axum::{
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    create_template, get_template, health, list_templates, render_template, AppState,
};
use super::middleware::logging_middleware;
use super::openapi::ApiDoc;
use crate::errors::{panic_handler, translate_errors};
use crate::metrics;

pub fn create_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let translator = state.translator.clone();

    Router::new()
        // Health check
        .route("/health", get(health))
        // Template endpoints
        .route("/templates", get(list_templates).post(create_template))
        .route("/templates/:id", get(get_template))
        .route("/templates/:id/render", get(render_template))
        // Metrics endpoint (Prometheus)
        .route("/metrics", get(metrics::metrics_handler))
        // OpenAPI documentation
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Order matters: error translation sits closest to the handlers so
        // logging and metrics see the final status; panics unwind through it
        // into the catch-panic layer
        .layer(middleware::from_fn_with_state(
            translator.clone(),
            translate_errors,
        ))
        .layer(CatchPanicLayer::custom(panic_handler(translator)))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics::middleware::track_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Add shared state
        .with_state(state)
}
