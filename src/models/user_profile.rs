use serde::{Deserialize, Serialize};

use super::Game;

/// Play history supplied by the user-data store. Read-only here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    /// One entry per play event, so repeats carry weight
    pub preferred_categories: Vec<String>,
    /// Slugs of games the user has already played
    pub last_games_played: Vec<String>,
    pub games_played: u64,
    /// Total play time in seconds
    pub play_time: u64,
}

impl UserProfile {
    pub fn has_preferences(&self) -> bool {
        !self.preferred_categories.is_empty()
    }

    pub fn has_played(&self, slug: &str) -> bool {
        self.last_games_played.iter().any(|played| played == slug)
    }
}

/// A recommended game; warm-path picks carry their ranking score
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    #[serde(flatten)]
    pub game: Game,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Summary of a user's own play behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub top_categories: Vec<CategoryCount>,
    pub total_games_played: u64,
    /// Whole minutes
    pub total_play_time: u64,
}
