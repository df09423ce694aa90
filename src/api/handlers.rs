use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    db::CatalogStatus,
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Game, Insights, Recommendation, UserProfile},
    services::catalog::{
        DEFAULT_FEATURED_LIMIT, DEFAULT_NEW_LIMIT, DEFAULT_RELATED_LIMIT, DEFAULT_TRENDING_LIMIT,
    },
};

use super::AppState;

// Request types

/// `?limit=` kept as text so a malformed value gets the JSON error body
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

impl LimitQuery {
    fn limit_or(&self, default: i64) -> AppResult<i64> {
        match self.limit.as_deref().map(str::trim) {
            None | Some("") => Ok(default),
            Some(raw) => raw.parse().map_err(|_| {
                AppError::InvalidInput(format!("limit must be an integer, got '{}'", raw))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Same-origin pass-through of the upstream feed document
pub async fn proxy_feed(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<Value>> {
    let upstream = state.feed_upstream.as_ref().ok_or_else(|| {
        AppError::FeedUnavailable("no remote feed configured".to_string())
    })?;

    match upstream.fetch_document().await {
        Ok(document) => Ok(Json(document)),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Feed proxy error");
            Err(AppError::FeedUnavailable(e.to_string()))
        }
    }
}

/// All games in the catalog
pub async fn list_games(State(state): State<AppState>) -> Json<Vec<Game>> {
    Json(state.catalog.all_games().await)
}

/// Single game by slug
pub async fn get_game(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Game>> {
    state
        .catalog
        .by_slug(&slug)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Game '{}' not found", slug)))
}

pub async fn search_games(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<Game>> {
    Json(state.catalog.search(&params.q).await)
}

pub async fn trending_games(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Game>>> {
    let limit = params.limit_or(DEFAULT_TRENDING_LIMIT)?;
    Ok(Json(state.catalog.trending(limit).await))
}

pub async fn featured_games(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Game>>> {
    let limit = params.limit_or(DEFAULT_FEATURED_LIMIT)?;
    Ok(Json(state.catalog.featured(limit).await))
}

pub async fn new_games(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Game>>> {
    let limit = params.limit_or(DEFAULT_NEW_LIMIT)?;
    Ok(Json(state.catalog.newest(limit).await))
}

pub async fn related_games(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Game>>> {
    let limit = params.limit_or(DEFAULT_RELATED_LIMIT)?;
    Ok(Json(state.catalog.related(&slug, limit).await))
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.all_categories().await)
}

pub async fn games_by_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<Vec<Game>> {
    Json(state.catalog.by_category(&name).await)
}

/// Cache freshness and health of the catalog
pub async fn catalog_status(State(state): State<AppState>) -> Json<CatalogStatus> {
    Json(state.catalog.status().await)
}

/// Personalized recommendations for the supplied profile
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(profile): Json<UserProfile>,
) -> Json<Vec<Recommendation>> {
    tracing::info!(
        request_id = %request_id,
        preferred_categories = profile.preferred_categories.len(),
        played = profile.last_games_played.len(),
        "Processing recommendation request"
    );

    Json(state.recommendations.recommend(&profile).await)
}

/// Play-behaviour summary; `null` when the profile has no history
pub async fn insights(
    State(state): State<AppState>,
    Json(profile): Json<UserProfile>,
) -> Json<Option<Insights>> {
    Json(state.recommendations.summarize_insights(&profile))
}
