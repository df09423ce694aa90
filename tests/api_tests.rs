use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use axum_test::TestServer;
use rand::{rngs::StdRng, SeedableRng};
use serde_json::{json, Value};

use playzo_api::api::{create_router, AppState};
use playzo_api::db::{CacheSettings, CatalogCache};
use playzo_api::error::{AppError, AppResult};
use playzo_api::models::RawRecord;
use playzo_api::services::providers::{FeedSource, HttpFeedSource};
use playzo_api::services::{CatalogService, FeedAcquirer, Normalizer, RecommendationEngine};

/// Feed that always answers with the same document
struct StaticFeed(Vec<RawRecord>);

#[async_trait::async_trait]
impl FeedSource for StaticFeed {
    async fn fetch(&self) -> AppResult<Vec<RawRecord>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }

    fn locator(&self) -> String {
        "memory".to_string()
    }
}

/// Feed that is always unreachable
struct DownFeed;

#[async_trait::async_trait]
impl FeedSource for DownFeed {
    async fn fetch(&self) -> AppResult<Vec<RawRecord>> {
        Err(AppError::ExternalApi("connection refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "down"
    }

    fn locator(&self) -> String {
        "nowhere".to_string()
    }
}

fn sample_feed() -> Vec<RawRecord> {
    vec![
        json!({ "id": 1, "title": "Flappy", "embed_url": "https://x/e",
                "categories": ["Arcade"], "plays": 5000, "rating": 3.5,
                "release_date": "2021-04-01" }),
        json!({ "id": 2, "title": "Flappy", "embed_url": "https://x/e2",
                "categories": "Arcade,Action-Adventure", "plays": 20, "rating": 4.8 }),
        json!({ "id": 3, "title": "Puzzle Master", "embed": "/games/puzzle",
                "description": "A fun puzzle game", "tags": ["Puzzle"],
                "plays": "300", "release_date": "2024-01-15" }),
        json!({ "id": 4, "title": "No URL", "categories": ["Puzzle"] }),
        json!({ "id": 5, "name": "Brain Teaser", "url": "https://x/brain",
                "genre": "Puzzle", "plays": 900 }),
    ]
}

fn catalog_over(source: Arc<dyn FeedSource>) -> CatalogService {
    let cache = CatalogCache::new(
        FeedAcquirer::new().with_remote(source),
        Normalizer::default(),
        CacheSettings::default(),
    );
    CatalogService::new(Arc::new(cache))
}

fn state_over(source: Arc<dyn FeedSource>) -> AppState {
    let catalog = catalog_over(source);
    let engine = RecommendationEngine::with_rng(catalog.clone(), StdRng::seed_from_u64(11));
    AppState::new(catalog).with_recommendations(engine)
}

fn create_test_server() -> TestServer {
    let app = create_router(state_over(Arc::new(StaticFeed(sample_feed()))));
    TestServer::new(app).unwrap()
}

fn slugs(games: &[Value]) -> Vec<String> {
    games
        .iter()
        .map(|g| g["slug"].as_str().unwrap().to_string())
        .collect()
}

async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_list_games_normalizes_and_filters() {
    let server = create_test_server();

    let response = server.get("/api/v1/games").await;
    response.assert_status_ok();
    let games: Vec<Value> = response.json();

    // The record without any embed URL is dropped
    assert_eq!(games.len(), 4);
    assert_eq!(
        slugs(&games),
        vec!["flappy-1", "flappy-2", "puzzle-master-3", "brain-teaser-5"]
    );
    assert_eq!(games[2]["embedUrl"], "https://www.onlinegames.io/games/puzzle");
    assert_eq!(games[2]["plays"], 300);
    assert_eq!(games[0]["publisher"], "Unknown");
    assert_eq!(games[3]["categories"], json!(["Puzzle"]));
}

#[tokio::test]
async fn test_same_title_games_are_both_searchable() {
    let server = create_test_server();

    let response = server
        .get("/api/v1/games/search")
        .add_query_param("q", "flappy")
        .await;
    response.assert_status_ok();
    let games: Vec<Value> = response.json();

    assert_eq!(games.len(), 2);
    assert_ne!(games[0]["slug"], games[1]["slug"]);
    assert!(slugs(&games).iter().all(|s| s.starts_with("flappy-")));
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_blank_is_empty() {
    let server = create_test_server();

    let upper: Vec<Value> = server
        .get("/api/v1/games/search")
        .add_query_param("q", "PUZZLE")
        .await
        .json();
    let lower: Vec<Value> = server
        .get("/api/v1/games/search")
        .add_query_param("q", "puzzle")
        .await
        .json();
    assert_eq!(upper, lower);
    assert!(!lower.is_empty());

    let blank: Vec<Value> = server
        .get("/api/v1/games/search")
        .add_query_param("q", "   ")
        .await
        .json();
    assert!(blank.is_empty());

    let missing: Vec<Value> = server.get("/api/v1/games/search").await.json();
    assert!(missing.is_empty());
}

#[tokio::test]
async fn test_get_game_by_slug() {
    let server = create_test_server();

    let response = server.get("/api/v1/games/puzzle-master-3").await;
    response.assert_status_ok();
    let game: Value = response.json();
    assert_eq!(game["title"], "Puzzle Master");
    assert_eq!(game["width"], 800);
    assert_eq!(game["height"], 600);
}

#[tokio::test]
async fn test_unknown_slug_is_404() {
    let server = create_test_server();

    let response = server.get("/api/v1/games/does-not-exist").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("does-not-exist"));
}

#[tokio::test]
async fn test_trending_respects_limit_and_order() {
    let server = create_test_server();

    let games: Vec<Value> = server
        .get("/api/v1/games/trending")
        .add_query_param("limit", 2)
        .await
        .json();
    assert_eq!(slugs(&games), vec!["flappy-1", "brain-teaser-5"]);

    let none: Vec<Value> = server
        .get("/api/v1/games/trending")
        .add_query_param("limit", 0)
        .await
        .json();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_malformed_limit_is_rejected() {
    let server = create_test_server();

    let response = server
        .get("/api/v1/games/trending")
        .add_query_param("limit", "lots")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("lots"));
}

#[tokio::test]
async fn test_featured_games() {
    let server = create_test_server();

    let games: Vec<Value> = server.get("/api/v1/games/featured").await.json();
    // flappy-1 by plays, flappy-2 by rating; the rest qualify on neither
    assert_eq!(slugs(&games), vec!["flappy-1", "flappy-2"]);
}

#[tokio::test]
async fn test_new_games() {
    let server = create_test_server();

    let games: Vec<Value> = server.get("/api/v1/games/new").await.json();
    assert_eq!(slugs(&games), vec!["puzzle-master-3", "flappy-1"]);
}

#[tokio::test]
async fn test_categories() {
    let server = create_test_server();

    let categories: Vec<String> = server.get("/api/v1/categories").await.json();
    assert_eq!(categories, vec!["Action-Adventure", "Arcade", "Puzzle"]);

    let action: Vec<Value> = server.get("/api/v1/categories/action/games").await.json();
    assert_eq!(slugs(&action), vec!["flappy-2"]);

    let puzzle: Vec<Value> = server.get("/api/v1/categories/Puzzle/games").await.json();
    assert_eq!(slugs(&puzzle), vec!["puzzle-master-3", "brain-teaser-5"]);
}

#[tokio::test]
async fn test_related_games() {
    let server = create_test_server();

    let games: Vec<Value> = server
        .get("/api/v1/games/puzzle-master-3/related")
        .await
        .json();
    assert_eq!(slugs(&games), vec!["brain-teaser-5"]);

    let unknown: Vec<Value> = server.get("/api/v1/games/nope/related").await.json();
    assert!(unknown.is_empty());
}

#[tokio::test]
async fn test_recommendations_prefer_heavier_categories() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({
            "preferredCategories": ["Puzzle", "Puzzle", "Puzzle", "Arcade"],
            "lastGamesPlayed": ["brain-teaser-5"]
        }))
        .await;
    response.assert_status_ok();
    let recs: Vec<Value> = response.json();

    assert_eq!(recs.len(), 3);
    assert_eq!(recs[0]["slug"], "puzzle-master-3");
    assert!(recs.iter().all(|r| r["slug"] != "brain-teaser-5"));
    assert!(recs.iter().all(|r| r["score"].is_number()));
}

#[tokio::test]
async fn test_recommendations_for_new_user() {
    let server = create_test_server();

    let recs: Vec<Value> = server
        .post("/api/v1/recommendations")
        .json(&json!({}))
        .await
        .json();

    assert_eq!(recs.len(), 4);
    assert!(recs.iter().all(|r| r.get("score").is_none()));
}

#[tokio::test]
async fn test_insights() {
    let server = create_test_server();

    let insights: Value = server
        .post("/api/v1/insights")
        .json(&json!({
            "preferredCategories": ["Arcade", "Puzzle", "Puzzle"],
            "gamesPlayed": 3,
            "playTime": 600
        }))
        .await
        .json();
    assert_eq!(insights["topCategories"][0], json!({ "name": "Puzzle", "count": 2 }));
    assert_eq!(insights["totalGamesPlayed"], 3);
    assert_eq!(insights["totalPlayTime"], 10);

    let none: Value = server.post("/api/v1/insights").json(&json!({})).await.json();
    assert!(none.is_null());
}

#[tokio::test]
async fn test_unreachable_feed_serves_empty_catalog() {
    let app = create_router(state_over(Arc::new(DownFeed)));
    let server = TestServer::new(app).unwrap();

    let response = server.get("/api/v1/games").await;
    response.assert_status_ok();
    let games: Vec<Value> = response.json();
    assert!(games.is_empty());

    let status: Value = server.get("/api/v1/catalog/status").await.json();
    assert_eq!(status["health"], "unavailable");
    assert_eq!(status["gameCount"], 0);
}

#[tokio::test]
async fn test_catalog_status_after_load() {
    let server = create_test_server();

    let empty: Value = server.get("/api/v1/catalog/status").await.json();
    assert_eq!(empty["state"], "empty");

    server.get("/api/v1/games").await;
    let status: Value = server.get("/api/v1/catalog/status").await.json();
    assert_eq!(status["state"], "fresh");
    assert_eq!(status["health"], "live");
    assert_eq!(status["gameCount"], 4);
    assert!(status["fetchedAt"].is_string());
}

#[tokio::test]
async fn test_feed_proxy_passes_document_through() {
    let upstream = spawn_upstream(Router::new().route(
        "/embed.json",
        get(|| async { Json(json!({ "games": [{ "id": 1 }], "source": "upstream" })) }),
    ))
    .await;

    let feed = HttpFeedSource::new(format!("{}/embed.json", upstream), Duration::from_secs(5))
        .unwrap();
    let state = state_over(Arc::new(StaticFeed(vec![]))).with_feed_upstream(feed);
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server.get("/api/games").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["source"], "upstream");
}

#[tokio::test]
async fn test_feed_proxy_failure_shape() {
    let upstream = spawn_upstream(Router::new().route(
        "/embed.json",
        get(|| async { (StatusCode::BAD_GATEWAY, "nope") }),
    ))
    .await;

    let feed = HttpFeedSource::new(format!("{}/embed.json", upstream), Duration::from_secs(5))
        .unwrap();
    let state = state_over(Arc::new(StaticFeed(vec![]))).with_feed_upstream(feed);
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server.get("/api/games").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body, json!({ "error": "Failed to fetch games" }));
}

#[tokio::test]
async fn test_feed_proxy_without_upstream() {
    let server = create_test_server();

    let response = server.get("/api/games").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to fetch games");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-123"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-123");
}
