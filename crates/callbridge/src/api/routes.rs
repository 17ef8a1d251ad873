//! API route definitions.

use std::path::Path;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    create_router_with_static(state, None)
}

/// Create the application router, serving the browser client from
/// `static_dir` when one is given.
pub fn create_router_with_static(state: AppState, static_dir: Option<&Path>) -> Router {
    // Tracing layer with request IDs and timing
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        // Browser and PSTN joins
        .route("/joinCall", post(handlers::join_call))
        .route("/startPSTNCall", post(handlers::start_pstn_call))
        .route("/endPSTNCall", get(handlers::end_pstn_call))
        // Telephony service callbacks
        .route(
            "/Callbacks/answer",
            get(handlers::answer_callback).post(handlers::answer_callback),
        )
        // Media event enrichment
        .route("/idLookup", get(handlers::id_lookup));

    if let Some(dir) = static_dir {
        router = router
            .route_service("/", ServeFile::new(dir.join("index.html")))
            .nest_service("/public", ServeDir::new(dir));
    }

    router.layer(cors).layer(trace_layer).with_state(state)
}
