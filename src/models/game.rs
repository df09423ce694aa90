use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A raw feed record; field names and shapes vary between feeds
pub type RawRecord = serde_json::Value;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

/// Canonical, normalized playable game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub embed_url: String,
    pub thumbnail: Option<String>,
    pub publisher: String,
    pub categories: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub rating: Option<f64>,
    pub plays: u64,
    pub release_date: Option<String>,
    pub instructions: Option<String>,
    pub controls: Option<String>,
}

impl Game {
    /// Embed height as a percentage of width, for aspect-ratio boxes
    pub fn aspect_ratio_percent(&self) -> f64 {
        if self.width == 0 {
            return f64::from(DEFAULT_HEIGHT) / f64::from(DEFAULT_WIDTH) * 100.0;
        }
        f64::from(self.height) / f64::from(self.width) * 100.0
    }

    /// Rating with absent values counted as zero, for ordering
    pub fn rating_or_zero(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// Parses `release_date` leniently. Returns `None` when absent or unreadable.
    pub fn released_at(&self) -> Option<DateTime<Utc>> {
        parse_release_date(self.release_date.as_deref()?)
    }
}

fn parse_release_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    // Bare year, e.g. "2019"
    if raw.len() == 4 {
        if let Ok(year) = raw.parse::<i32>() {
            return Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single();
        }
    }
    None
}


#[cfg(test)]
mod tests {
    use super::fixtures::game;
    use super::*;

    #[test]
    fn test_aspect_ratio_default_dimensions() {
        let g = game("a", &[]);
        assert!((g.aspect_ratio_percent() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_aspect_ratio_custom_dimensions() {
        let mut g = game("a", &[]);
        g.width = 1280;
        g.height = 720;
        assert!((g.aspect_ratio_percent() - 56.25).abs() < 1e-9);
    }

    #[test]
    fn test_released_at_formats() {
        let mut g = game("a", &[]);
        g.release_date = Some("2023-05-01".to_string());
        assert_eq!(
            g.released_at(),
            Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).single()
        );

        g.release_date = Some("2023-05-01T12:30:00Z".to_string());
        assert_eq!(
            g.released_at(),
            Utc.with_ymd_and_hms(2023, 5, 1, 12, 30, 0).single()
        );

        g.release_date = Some("2019".to_string());
        assert_eq!(
            g.released_at(),
            Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).single()
        );

        g.release_date = Some("sometime soon".to_string());
        assert_eq!(g.released_at(), None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(game("a", &["Puzzle"])).unwrap();
        assert!(json.get("embedUrl").is_some());
        assert!(json.get("releaseDate").is_some());
        assert!(json.get("embed_url").is_none());
    }
}
