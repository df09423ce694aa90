//! Maps loosely-shaped feed records onto the canonical `Game`.
//!
//! Every field is resolved through a `FieldRule`: an ordered list of source
//! field names whose first usable value wins. A value is usable when it is
//! "truthy" in the feed's JavaScript sense (not null, `false`, `0` or an
//! empty string). Anything unusable falls through to the next candidate and
//! finally to the field's fallback, so normalization never fails.

use indexmap::IndexSet;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Number, Value};

use crate::models::{
    game::{DEFAULT_HEIGHT, DEFAULT_WIDTH},
    Game, RawRecord,
};

pub const DEFAULT_EMBED_HOST: &str = "https://www.onlinegames.io";
pub const UNKNOWN_TITLE: &str = "Unknown Game";
pub const UNKNOWN_PUBLISHER: &str = "Unknown";
pub const MAX_SLUG_LEN: usize = 100;
const SITE_NAME: &str = "Playzo";
const EMPTY_SLUG_FRAGMENT: &str = "game";

/// Characters an id keeps verbatim in a slug; everything else, `%` included,
/// is percent-encoded so distinct ids never share a suffix.
const SLUG_ID_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// JavaScript's largest exactly representable integer
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Ordered source field names for one `Game` field
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub candidates: &'static [&'static str],
}

pub const ID: FieldRule = FieldRule {
    candidates: &["id", "game_id"],
};
pub const TITLE: FieldRule = FieldRule {
    candidates: &["title", "name"],
};
pub const DESCRIPTION: FieldRule = FieldRule {
    candidates: &["description"],
};
pub const EMBED_URL: FieldRule = FieldRule {
    candidates: &[
        "embed",
        "embed_url",
        "url",
        "gameUrl",
        "game_url",
        "playUrl",
        "play_url",
        "iframeUrl",
        "iframe_url",
    ],
};
pub const THUMBNAIL: FieldRule = FieldRule {
    candidates: &["thumbnail", "image", "thumb"],
};
pub const PUBLISHER: FieldRule = FieldRule {
    candidates: &["publisher", "developer"],
};
pub const WIDTH: FieldRule = FieldRule {
    candidates: &["width"],
};
pub const HEIGHT: FieldRule = FieldRule {
    candidates: &["height"],
};
pub const RATING: FieldRule = FieldRule {
    candidates: &["rating"],
};
pub const PLAYS: FieldRule = FieldRule {
    candidates: &["plays"],
};
pub const RELEASE_DATE: FieldRule = FieldRule {
    candidates: &["release_date", "releaseDate"],
};
pub const INSTRUCTIONS: FieldRule = FieldRule {
    candidates: &["instructions"],
};
pub const CONTROLS: FieldRule = FieldRule {
    candidates: &["controls"],
};

/// Category sources in priority order. `tags` and `categories` may be an
/// array or a comma-separated string; `genre` may be an array or a scalar.
const SPLIT_CATEGORY_FIELDS: [&str; 2] = ["tags", "categories"];
const GENRE_FIELD: &str = "genre";

impl FieldRule {
    fn find_map<'a, T>(
        &self,
        record: &'a Map<String, Value>,
        convert: impl Fn(&'a Value) -> Option<T>,
    ) -> Option<T> {
        self.candidates
            .iter()
            .filter_map(|field| record.get(*field))
            .find_map(convert)
    }

    /// First candidate holding a non-blank string or non-zero number
    pub fn text(&self, record: &Map<String, Value>) -> Option<String> {
        self.find_map(record, scalar_text)
    }

    /// First candidate holding a non-zero number or numeric string
    pub fn number(&self, record: &Map<String, Value>) -> Option<f64> {
        self.find_map(record, scalar_number)
    }

    /// First candidate holding a leading integer
    pub fn integer(&self, record: &Map<String, Value>) -> Option<i64> {
        self.find_map(record, scalar_integer)
    }
}

/// Maps raw records into `Game`s, rebasing relative embed URLs on `embed_host`
#[derive(Debug, Clone)]
pub struct Normalizer {
    embed_host: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_EMBED_HOST)
    }
}

impl Normalizer {
    pub fn new(embed_host: impl Into<String>) -> Self {
        Self {
            embed_host: embed_host.into(),
        }
    }

    /// Normalizes one record. `index` is its position in the feed and stands
    /// in for a missing source id.
    pub fn normalize(&self, raw: &RawRecord, index: usize) -> Game {
        let empty = Map::new();
        let record = raw.as_object().unwrap_or(&empty);

        let id = ID.text(record).unwrap_or_else(|| index.to_string());
        let title = TITLE
            .text(record)
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let slug = build_slug(&title, &slug_id(&id));
        let description = DESCRIPTION
            .text(record)
            .unwrap_or_else(|| fallback_description(&title));

        Game {
            slug,
            description,
            embed_url: self.resolve_embed_url(EMBED_URL.text(record)),
            thumbnail: THUMBNAIL.text(record),
            publisher: PUBLISHER
                .text(record)
                .unwrap_or_else(|| UNKNOWN_PUBLISHER.to_string()),
            categories: extract_categories(record),
            width: dimension(WIDTH.number(record), DEFAULT_WIDTH),
            height: dimension(HEIGHT.number(record), DEFAULT_HEIGHT),
            rating: RATING.number(record),
            plays: PLAYS.integer(record).map_or(0, |plays| plays.max(0) as u64),
            release_date: RELEASE_DATE.text(record),
            instructions: INSTRUCTIONS.text(record),
            controls: CONTROLS.text(record),
            id,
            title,
        }
    }

    /// Makes a playable URL absolute. Empty input stays empty.
    pub fn resolve_embed_url(&self, raw: Option<String>) -> String {
        let Some(url) = raw else {
            return String::new();
        };
        if url.starts_with("//") || has_scheme(&url) {
            return url;
        }

        let host = self.embed_host.trim_end_matches('/');
        if url.starts_with('/') {
            format!("{}{}", host, url)
        } else {
            format!("{}/{}", host, url)
        }
    }
}

/// Normalizes a whole feed, dropping games without a playable URL
pub fn build_catalog(normalizer: &Normalizer, records: &[RawRecord]) -> Vec<Game> {
    let games: Vec<Game> = records
        .iter()
        .enumerate()
        .map(|(index, raw)| normalizer.normalize(raw, index))
        .filter(|game| !game.embed_url.trim().is_empty())
        .collect();

    let dropped = records.len() - games.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = games.len(), "Dropped records without embed URL");
    }

    games
}

/// Lowercase ASCII slug: alphanumerics kept, whitespace, `-` and `_` runs
/// collapsed into a single `-`, all other characters removed.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    slug
}

/// Case-preserving, injective rendering of a source id for use in a slug
pub fn slug_id(id: &str) -> String {
    utf8_percent_encode(id, SLUG_ID_SAFE).to_string()
}

/// `<title-fragment>-<id>`, capped at `MAX_SLUG_LEN`. The title fragment is
/// shortened first so the id suffix, which carries uniqueness, survives.
pub fn build_slug(title: &str, id: &str) -> String {
    let mut fragment = slugify(title);
    if fragment.is_empty() {
        fragment = EMPTY_SLUG_FRAGMENT.to_string();
    }

    let suffix = format!("-{}", id);
    let budget = MAX_SLUG_LEN.saturating_sub(suffix.len());
    if budget == 0 {
        return format!("{}{}", fragment, suffix)
            .chars()
            .take(MAX_SLUG_LEN)
            .collect();
    }

    fragment.truncate(budget);
    format!("{}{}", fragment.trim_end_matches('-'), suffix)
}

fn fallback_description(title: &str) -> String {
    format!(
        "Play {} on {} - instant browser game. Click Play to start the game in your browser.",
        title, SITE_NAME
    )
}

fn extract_categories(record: &Map<String, Value>) -> Vec<String> {
    let mut categories: IndexSet<String> = IndexSet::new();

    for field in SPLIT_CATEGORY_FIELDS {
        match record.get(field) {
            Some(Value::Array(items)) => categories.extend(items.iter().filter_map(scalar_text)),
            Some(Value::String(joined)) => categories.extend(
                joined
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string),
            ),
            _ => {}
        }
    }

    match record.get(GENRE_FIELD) {
        Some(Value::Array(items)) => categories.extend(items.iter().filter_map(scalar_text)),
        Some(other) => categories.extend(scalar_text(other)),
        None => {}
    }

    categories.into_iter().collect()
}

fn has_scheme(url: &str) -> bool {
    match url.find("://") {
        Some(pos) if pos > 0 => {
            let scheme = &url[..pos];
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

fn dimension(value: Option<f64>, default: u32) -> u32 {
    match value {
        Some(v) if v >= 1.0 && v <= f64::from(u32::MAX) => v.round() as u32,
        _ => default,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(number_text(n)),
        _ => None,
    }
}

/// Renders integral floats without a fractional part, as JavaScript does
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

fn scalar_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => leading_float(s)?,
        _ => return None,
    };
    (n.is_finite() && n != 0.0).then_some(n)
}

fn scalar_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => leading_integer(s),
        _ => None,
    }
}

/// Longest leading `[+-]digits[.digits]` prefix, like JavaScript `parseFloat`
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => {}
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    s[..end].parse().ok()
}

/// Leading `[+-]digits` prefix, like JavaScript `parseInt`
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && matches!(c, '+' | '-')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    s[..end].parse().ok()
}
