//! Data models shared across the analysis pipeline.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: Raw fetched article data (title + body text)
//! - [`Entity`] / [`EntityCategory`]: Named entities restricted to people and organizations
//! - [`Sentiment`]: The discrete sentiment label produced by the scorer
//! - [`ArticleAnalysis`]: A complete analysis ready to persist or present
//! - [`StoredAnalysis`]: An analysis as read back from the database

use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw news article as fetched from its URL.
///
/// This is the unprocessed input to entity extraction and sentiment scoring.
#[derive(Debug, Clone)]
pub struct Article {
    /// The URL the article was fetched from.
    pub url: String,
    /// The extracted headline, or a placeholder when none was found.
    pub title: String,
    /// The extracted main-body text.
    pub content: String,
}

/// The entity categories this tool keeps.
///
/// The extraction service reports many span labels; everything outside these
/// two is dropped at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityCategory {
    Person,
    Org,
}

impl EntityCategory {
    /// The label used on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Person => "PERSON",
            EntityCategory::Org => "ORG",
        }
    }

    /// Parse a span label. Labels other than `PERSON`/`ORG` yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "PERSON" => Some(EntityCategory::Person),
            "ORG" => Some(EntityCategory::Org),
            _ => None,
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named entity mention.
///
/// Mentions are kept in first-occurrence order and are not deduplicated;
/// the same name appearing three times in an article is three entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// The mention text as it appeared in the article.
    pub text: String,
    /// Person or organization.
    pub category: EntityCategory,
}

/// Discrete sentiment label.
///
/// Produced by [`crate::sentiment::SentimentScorer::analyze`] and stored
/// per article. Serialized lowercase ("positive"/"negative"/"neutral").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    /// Parse a stored label back into a [`Sentiment`].
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully analyzed article: the unit of persistence and presentation.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleAnalysis {
    pub url: String,
    pub title: String,
    pub content: String,
    pub entities: Vec<Entity>,
    pub sentiment: Sentiment,
}

/// An analysis read back from the store, with its row id and the timestamp
/// recorded at insert time (`YYYY-MM-DD HH:MM:SS`, UTC).
#[derive(Debug, Clone)]
pub struct StoredAnalysis {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub entities: Vec<Entity>,
    pub sentiment: Sentiment,
    pub analyzed_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_category_labels() {
        assert_eq!(EntityCategory::Person.as_str(), "PERSON");
        assert_eq!(EntityCategory::Org.as_str(), "ORG");
        assert_eq!(EntityCategory::from_label("PERSON"), Some(EntityCategory::Person));
        assert_eq!(EntityCategory::from_label("ORG"), Some(EntityCategory::Org));
        assert_eq!(EntityCategory::from_label("GPE"), None);
        assert_eq!(EntityCategory::from_label("person"), None);
    }

    #[test]
    fn test_sentiment_labels_round_trip() {
        for s in [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral] {
            assert_eq!(Sentiment::from_label(s.as_str()), Some(s));
        }
        assert_eq!(Sentiment::from_label("mixed"), None);
    }

    #[test]
    fn test_entity_serialization() {
        let entity = Entity {
            text: "Jane Doe".to_string(),
            category: EntityCategory::Person,
        };

        let json = serde_json::to_string(&entity).unwrap();
        assert!(json.contains(r#""category":"PERSON""#));
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entity);
    }

    #[test]
    fn test_sentiment_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sentiment::Positive).unwrap(), r#""positive""#);
        assert_eq!(serde_json::to_string(&Sentiment::Neutral).unwrap(), r#""neutral""#);
    }

    #[test]
    fn test_analysis_serialization() {
        let analysis = ArticleAnalysis {
            url: "https://example.com/story".to_string(),
            title: "Test Article".to_string(),
            content: "Body text".to_string(),
            entities: vec![Entity {
                text: "Acme Corp".to_string(),
                category: EntityCategory::Org,
            }],
            sentiment: Sentiment::Neutral,
        };

        let json = serde_json::to_string(&analysis).unwrap();
        assert!(json.contains("Acme Corp"));
        assert!(json.contains(r#""sentiment":"neutral""#));
    }
}
