use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Fixed set of categories a game record can belong to.
///
/// The `all` sentinel used by filters is deliberately not a variant: records never carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Action,
    Adventure,
    Puzzle,
    Racing,
    Multiplayer,
    Casual,
    Strategy,
    Trending,
    /// Any value the catalog does not know about.
    #[serde(other)]
    Uncategorized,
}

impl Category {
    /// Every category in sidebar order.
    pub const ALL: [Category; 9] = [
        Category::Action,
        Category::Adventure,
        Category::Puzzle,
        Category::Racing,
        Category::Multiplayer,
        Category::Casual,
        Category::Strategy,
        Category::Trending,
        Category::Uncategorized,
    ];

    /// Identifier used by filters and on the wire.
    pub fn id(self) -> &'static str {
        match self {
            Category::Action => "action",
            Category::Adventure => "adventure",
            Category::Puzzle => "puzzle",
            Category::Racing => "racing",
            Category::Multiplayer => "multiplayer",
            Category::Casual => "casual",
            Category::Strategy => "strategy",
            Category::Trending => "trending",
            Category::Uncategorized => "uncategorized",
        }
    }
}

/// Difficulty rating shown on the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Accent colour used when rendering the difficulty badge.
    pub fn color(self) -> &'static str {
        match self {
            Difficulty::Easy => "#4ade80",
            Difficulty::Medium => "#fbbf24",
            Difficulty::Hard => "#f87171",
        }
    }
}

/// Colour scheme persisted per player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Parse a stored value, ignoring anything unknown.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }
}

/// One catalog entry.
///
/// The `id` is the document key in the store and is not part of the stored body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub name: String,
    pub genre: String,
    pub developer: String,
    #[serde(rename = "image")]
    pub image_url: String,
    #[serde(rename = "url")]
    pub external_url: String,
    pub rating: f32,
    pub popularity: u32,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Present when the game has a natively playable implementation.
    #[serde(default, rename = "route", skip_serializing_if = "Option::is_none")]
    pub internal_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
}

impl GameRecord {
    /// Whether the game can be launched without leaving the hub.
    pub fn is_native(&self) -> bool {
        self.internal_route.is_some()
    }

    /// Check the invariants every record in a catalog snapshot must hold.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.image_url.is_empty() || self.external_url.is_empty() {
            return Err(format!("`{}` has an empty image or url", self.name));
        }
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(format!(
                "`{}` has rating {} outside [0, 5]",
                self.name, self.rating
            ));
        }
        Ok(())
    }

    /// Decode a stored document, taking the identifier from the document key.
    pub fn from_document(id: &str, body: Value) -> serde_json::Result<Self> {
        let mut record: GameRecord = serde_json::from_value(body)?;
        record.id = id.to_string();
        Ok(record)
    }

    /// Encode the record body as stored in the document store.
    pub fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Partial update applied to a stored game by identifier.
///
/// Only the fields present are written; absent fields stay untouched in the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct GamePatch {
    #[serde(rename = "url", skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(rename = "image", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "route", skip_serializing_if = "Option::is_none")]
    pub internal_route: Option<String>,
}

impl GamePatch {
    /// True when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.external_url.is_none() && self.image_url.is_none() && self.internal_route.is_none()
    }

    /// Apply the patch to a local record, mirroring what the store will do.
    pub fn apply_to(&self, record: &mut GameRecord) {
        if let Some(url) = &self.external_url {
            record.external_url = url.clone();
        }
        if let Some(image) = &self.image_url {
            record.image_url = image.clone();
        }
        if let Some(route) = &self.internal_route {
            record.internal_route = Some(route.clone());
        }
    }
}

/// Score submitted to the leaderboard. Entries are never updated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub user_id: String,
    pub player_name: String,
    pub score: u64,
    pub timestamp: SystemTime,
}

impl LeaderboardEntry {
    /// Decode a stored document, taking the identifier from the document key.
    pub fn from_document(id: &str, body: Value) -> serde_json::Result<Self> {
        let mut entry: LeaderboardEntry = serde_json::from_value(body)?;
        entry.id = id.to_string();
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn stored_game() -> Value {
        json!({
            "name": "Snake",
            "genre": "Arcade",
            "developer": "Classic Games Inc.",
            "image": "https://placehold.co/300x200?text=Snake",
            "url": "https://www.mathsisfun.com/games/snake.html",
            "rating": 4.0,
            "popularity": 180,
            "category": "casual",
            "difficulty": "Medium",
            "tags": ["classic", "snake"],
            "route": "/games/snake"
        })
    }

    #[test]
    fn document_id_comes_from_key() {
        let record = GameRecord::from_document("abc123", stored_game()).unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.internal_route.as_deref(), Some("/games/snake"));
        assert!(record.is_native());
        assert_eq!(record.difficulty, Some(Difficulty::Medium));
    }

    #[test]
    fn stored_body_omits_id() {
        let record = GameRecord::from_document("abc123", stored_game()).unwrap();
        let body = record.to_document().unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["url"], "https://www.mathsisfun.com/games/snake.html");
    }

    #[test]
    fn unknown_category_decodes_as_uncategorized() {
        let mut body = stored_game();
        body["category"] = json!("rhythm");
        let record = GameRecord::from_document("x", body).unwrap();
        assert_eq!(record.category, Category::Uncategorized);
    }

    #[test]
    fn rating_out_of_range_fails_validation() {
        let mut record = GameRecord::from_document("x", stored_game()).unwrap();
        record.rating = 7.5;
        assert!(record.validate().is_err());
        record.rating = 5.0;
        assert!(record.validate().is_ok());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = GamePatch {
            external_url: Some("https://example.com".into()),
            ..GamePatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"url": "https://example.com"})
        );
    }
}
