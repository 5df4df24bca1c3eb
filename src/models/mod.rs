use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Dense zero-based row index into the item factor matrix.
pub type ItemIndex = usize;

/// Ratings supplied with a single request, keyed by external item id.
pub type RatingInput = HashMap<ItemId, f64>;

/// Stable external identifier of a catalog item.
///
/// Artifacts and catalogs mix string and integer ids, so both deserialize
/// into the same canonical string form (`1` and `"1"` are the same item).
/// Integers anywhere in the `i64` or `u64` range are accepted; fractional
/// numbers such as `318.0` are rejected rather than guessed at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawItemId", into = "String")]
pub struct ItemId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItemId {
    Text(String),
    Number(i64),
    Unsigned(u64),
}

impl From<RawItemId> for ItemId {
    fn from(raw: RawItemId) -> Self {
        match raw {
            RawItemId::Text(s) => Self(s),
            RawItemId::Number(n) => Self(n.to_string()),
            RawItemId::Unsigned(n) => Self(n.to_string()),
        }
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An item chosen by the engine together with its predicted score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: ItemId,
    pub index: ItemIndex,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub ratings: RatingInput,
    #[serde(default)]
    pub num_recommendations: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub request_id: Uuid,
    /// False when the default listing was served instead of a personalized one.
    pub personalized: bool,
    pub recommendations: Vec<RecommendationItem>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub item_id: ItemId,
    pub score: Option<f64>,
    pub reason: String,
    pub title: Option<String>,
    pub poster_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub item_id: ItemId,
    pub title: String,
    #[serde(default)]
    pub poster_url: Option<String>,
}

impl RecommendationRequest {
    pub fn new(ratings: RatingInput) -> Self {
        Self {
            ratings,
            num_recommendations: None,
        }
    }

    pub fn with_num_recommendations(mut self, n: usize) -> Self {
        self.num_recommendations = Some(n);
        self
    }
}

impl RecommendationItem {
    pub fn personalized(scored: &ScoredItem, entry: Option<&CatalogEntry>) -> Self {
        Self {
            item_id: scored.item_id.clone(),
            score: Some(scored.score),
            reason: format!("Predicted affinity {:.3}", scored.score),
            title: entry.map(|e| e.title.clone()),
            poster_url: entry.and_then(|e| e.poster_url.clone()),
        }
    }

    pub fn default_pick(item_id: ItemId, entry: Option<&CatalogEntry>) -> Self {
        Self {
            item_id,
            score: None,
            reason: "Rate a few items to personalize".to_string(),
            title: entry.map(|e| e.title.clone()),
            poster_url: entry.and_then(|e| e.poster_url.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_accepts_numbers_and_strings() {
        let ids: Vec<ItemId> = serde_json::from_str(r#"[1, "1", "tt0114709"]"#).unwrap();
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2].as_str(), "tt0114709");
        assert_eq!(serde_json::to_string(&ids[0]).unwrap(), r#""1""#);
    }

    #[test]
    fn test_item_id_integer_range() {
        let ids: Vec<ItemId> =
            serde_json::from_str(r#"[18446744073709551615, -7, 9223372036854775807]"#).unwrap();
        assert_eq!(ids[0].as_str(), "18446744073709551615");
        assert_eq!(ids[1].as_str(), "-7");
        assert_eq!(ids[2].as_str(), "9223372036854775807");

        assert!(serde_json::from_str::<ItemId>("318.0").is_err());
    }

    #[test]
    fn test_rating_input_keys_round_trip_as_strings() {
        let ratings: RatingInput = serde_json::from_str(r#"{"10": 4.5, "abc": 1}"#).unwrap();
        assert_eq!(ratings.get(&ItemId::from(10)), Some(&4.5));
        assert_eq!(ratings.get(&ItemId::from("abc")), Some(&1.0));
    }
}
