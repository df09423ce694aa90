use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    db::{CatalogCache, CatalogStatus},
    models::Game,
    services::normalizer::slugify,
};

pub const DEFAULT_TRENDING_LIMIT: i64 = 10;
pub const DEFAULT_NEW_LIMIT: i64 = 10;
pub const DEFAULT_FEATURED_LIMIT: i64 = 5;
pub const DEFAULT_RELATED_LIMIT: i64 = 4;

const FEATURED_MIN_RATING: f64 = 4.0;
const FEATURED_MIN_PLAYS: u64 = 1000;

/// Read API over the cached catalog
///
/// Every call goes through `CatalogCache::get_or_refresh`, so a stale
/// catalog is refreshed before the query runs. When the catalog is
/// unavailable the queries simply return nothing.
#[derive(Clone)]
pub struct CatalogService {
    cache: Arc<CatalogCache>,
    search_includes_categories: bool,
}

impl CatalogService {
    pub fn new(cache: Arc<CatalogCache>) -> Self {
        Self {
            cache,
            search_includes_categories: true,
        }
    }

    /// Restricts text search to title and description when `false`
    pub fn with_category_search(mut self, enabled: bool) -> Self {
        self.search_includes_categories = enabled;
        self
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    /// Shared handle to the current games, without copying them
    pub async fn games(&self) -> Arc<Vec<Game>> {
        self.cache.get_or_refresh().await.games.clone()
    }

    pub async fn status(&self) -> CatalogStatus {
        self.cache.status().await
    }

    pub async fn all_games(&self) -> Vec<Game> {
        self.games().await.as_ref().clone()
    }

    pub async fn by_slug(&self, slug: &str) -> Option<Game> {
        find_by_slug(&self.games().await, slug).cloned()
    }

    pub async fn by_category(&self, category: &str) -> Vec<Game> {
        filter_by_category(&self.games().await, category)
    }

    pub async fn search(&self, query: &str) -> Vec<Game> {
        search_games(&self.games().await, query, self.search_includes_categories)
    }

    pub async fn trending(&self, limit: i64) -> Vec<Game> {
        trending(&self.games().await, limit)
    }

    pub async fn featured(&self, limit: i64) -> Vec<Game> {
        featured(&self.games().await, limit)
    }

    pub async fn newest(&self, limit: i64) -> Vec<Game> {
        newest(&self.games().await, limit)
    }

    pub async fn all_categories(&self) -> Vec<String> {
        all_categories(&self.games().await)
    }

    pub async fn related(&self, slug: &str, limit: i64) -> Vec<Game> {
        related(&self.games().await, slug, limit)
    }
}

/// Non-positive limits select nothing
fn effective_limit(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

fn take_cloned<'a>(games: impl Iterator<Item = &'a Game>, limit: i64) -> Vec<Game> {
    games.take(effective_limit(limit)).cloned().collect()
}

/// Case-folded, punctuation-free form used to compare category names
pub fn category_key(category: &str) -> String {
    slugify(category)
}

pub fn find_by_slug<'a>(games: &'a [Game], slug: &str) -> Option<&'a Game> {
    games.iter().find(|game| game.slug == slug)
}

/// Games with a category containing `category` after normalization, so
/// "Action" also matches "Action-Adventure"
pub fn filter_by_category(games: &[Game], category: &str) -> Vec<Game> {
    let wanted = category_key(category);
    if wanted.is_empty() {
        return Vec::new();
    }

    games
        .iter()
        .filter(|game| {
            game.categories
                .iter()
                .any(|c| category_key(c).contains(&wanted))
        })
        .cloned()
        .collect()
}

/// Case-insensitive substring search over title and description, and
/// category names when `include_categories` is set. Blank queries match nothing.
pub fn search_games(games: &[Game], query: &str, include_categories: bool) -> Vec<Game> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    games
        .iter()
        .filter(|game| {
            game.title.to_lowercase().contains(&query)
                || game.description.to_lowercase().contains(&query)
                || (include_categories
                    && game
                        .categories
                        .iter()
                        .any(|c| c.to_lowercase().contains(&query)))
        })
        .cloned()
        .collect()
}

/// Most played first, rating breaking ties
pub fn trending(games: &[Game], limit: i64) -> Vec<Game> {
    let mut ranked: Vec<&Game> = games.iter().collect();
    ranked.sort_by(|a, b| {
        b.plays
            .cmp(&a.plays)
            .then_with(|| b.rating_or_zero().total_cmp(&a.rating_or_zero()))
    });
    take_cloned(ranked.into_iter(), limit)
}

fn featured_score(game: &Game) -> f64 {
    game.rating_or_zero() * 10.0 + game.plays as f64
}

/// Well rated or popular games, by `rating * 10 + plays`
pub fn featured(games: &[Game], limit: i64) -> Vec<Game> {
    let mut ranked: Vec<&Game> = games
        .iter()
        .filter(|game| {
            game.rating_or_zero() >= FEATURED_MIN_RATING || game.plays > FEATURED_MIN_PLAYS
        })
        .collect();
    ranked.sort_by(|a, b| featured_score(b).total_cmp(&featured_score(a)));
    take_cloned(ranked.into_iter(), limit)
}

/// Games with a release date, newest first; unreadable dates go last
pub fn newest(games: &[Game], limit: i64) -> Vec<Game> {
    let mut dated: Vec<_> = games
        .iter()
        .filter(|game| game.release_date.is_some())
        .map(|game| (game.released_at(), game))
        .collect();
    dated.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    take_cloned(dated.into_iter().map(|(_, game)| game), limit)
}

/// Every distinct category name, sorted
pub fn all_categories(games: &[Game]) -> Vec<String> {
    games
        .iter()
        .flat_map(|game| game.categories.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Other games sharing at least one category with `slug`, in catalog order
pub fn related(games: &[Game], slug: &str, limit: i64) -> Vec<Game> {
    let Some(reference) = find_by_slug(games, slug) else {
        return Vec::new();
    };

    take_cloned(
        games.iter().filter(|game| {
            game.slug != reference.slug
                && game.categories.iter().any(|c| reference.has_category(c))
        }),
        limit,
    )
}
