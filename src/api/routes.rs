use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        // Same-origin feed proxy
        .route("/api/games", get(handlers::proxy_feed))
        .nest("/api/v1", api_routes());

    // Local catalog snapshots and anything else under the public directory
    if let Some(public_dir) = &state.public_dir {
        router = router.fallback_service(ServeDir::new(public_dir));
    }

    // Outermost first; the request ID must exist before the trace span opens
    router
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// Catalog and recommendation routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/games", get(handlers::list_games))
        .route("/games/search", get(handlers::search_games))
        .route("/games/trending", get(handlers::trending_games))
        .route("/games/featured", get(handlers::featured_games))
        .route("/games/new", get(handlers::new_games))
        .route("/games/:slug", get(handlers::get_game))
        .route("/games/:slug/related", get(handlers::related_games))
        .route("/categories", get(handlers::list_categories))
        .route("/categories/:name/games", get(handlers::games_by_category))
        .route("/catalog/status", get(handlers::catalog_status))
        // Personalization
        .route("/recommendations", post(handlers::recommend))
        .route("/insights", post(handlers::insights))
}
