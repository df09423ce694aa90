use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::{
    models::{CategoryCount, Game, Insights, Recommendation, UserProfile},
    services::catalog::CatalogService,
};

pub const RECOMMENDATION_COUNT: usize = 6;
pub const DISCOVERY_SAMPLE_SIZE: usize = 4;
pub const TOP_INSIGHT_CATEGORIES: usize = 3;

/// Generates personalized game recommendations
///
/// Ranking is a weighted category overlap between the user's play history
/// and each game, plus a random jitter in `[0, 1)` that breaks ties and
/// varies results between calls. The random source is injectable so tests
/// can seed it.
#[derive(Clone)]
pub struct RecommendationEngine {
    catalog: CatalogService,
    rng: Arc<Mutex<StdRng>>,
}

impl RecommendationEngine {
    pub fn new(catalog: CatalogService) -> Self {
        Self::with_rng(catalog, StdRng::from_entropy())
    }

    pub fn with_rng(catalog: CatalogService, rng: StdRng) -> Self {
        Self {
            catalog,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Up to six picks for a returning user, or four random picks for a new one
    pub async fn recommend(&self, profile: &UserProfile) -> Vec<Recommendation> {
        let games = self.catalog.games().await;

        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let picks = rank(&games, profile, &mut *rng);

        tracing::debug!(
            warm = profile.has_preferences(),
            catalog = games.len(),
            picks = picks.len(),
            "Recommendations ranked"
        );

        picks
    }

    pub fn summarize_insights(&self, profile: &UserProfile) -> Option<Insights> {
        summarize_insights(profile)
    }
}

/// Category weights: one point per occurrence in the preference history
pub fn category_weights(profile: &UserProfile) -> HashMap<&str, u32> {
    let mut weights = HashMap::new();
    for category in &profile.preferred_categories {
        *weights.entry(category.as_str()).or_insert(0) += 1;
    }
    weights
}

/// Deterministic part of a game's score
pub fn affinity(game: &Game, weights: &HashMap<&str, u32>) -> f64 {
    game.categories
        .iter()
        .filter_map(|category| weights.get(category.as_str()))
        .map(|weight| f64::from(*weight))
        .sum()
}

/// Ranks `games` for `profile`, drawing jitter and shuffles from `rng`
pub fn rank<R: Rng>(games: &[Game], profile: &UserProfile, rng: &mut R) -> Vec<Recommendation> {
    if !profile.has_preferences() {
        return discovery_sample(games, rng);
    }

    let weights = category_weights(profile);
    let mut scored: Vec<(f64, &Game)> = games
        .iter()
        .filter(|game| !profile.has_played(&game.slug))
        .map(|game| (affinity(game, &weights) + rng.gen::<f64>(), game))
        .collect();

    scored.sort_by(|(a, _), (b, _)| b.total_cmp(a));

    scored
        .into_iter()
        .take(RECOMMENDATION_COUNT)
        .map(|(score, game)| Recommendation {
            game: game.clone(),
            score: Some(score),
        })
        .collect()
}

fn discovery_sample<R: Rng>(games: &[Game], rng: &mut R) -> Vec<Recommendation> {
    let mut pool: Vec<&Game> = games.iter().collect();
    pool.shuffle(rng);
    pool.into_iter()
        .take(DISCOVERY_SAMPLE_SIZE)
        .map(|game| Recommendation {
            game: game.clone(),
            score: None,
        })
        .collect()
}

/// Top categories, games played and play time in minutes
///
/// Returns `None` for users without any preference history.
pub fn summarize_insights(profile: &UserProfile) -> Option<Insights> {
    if !profile.has_preferences() {
        return None;
    }

    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for category in &profile.preferred_categories {
        *counts.entry(category.as_str()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    // Stable, so ties keep first-seen order
    ranked.sort_by(|(_, a), (_, b)| b.cmp(a));

    Some(Insights {
        top_categories: ranked
            .into_iter()
            .take(TOP_INSIGHT_CATEGORIES)
            .map(|(name, count)| CategoryCount {
                name: name.to_string(),
                count,
            })
            .collect(),
        total_games_played: profile.games_played,
        total_play_time: profile.play_time / 60,
    })
}
