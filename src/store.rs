//! SQLite-backed persistence for article analyses.
//!
//! One analysis per URL across three tables:
//!
//! ```text
//! articles(id, url UNIQUE, title, content, analysis_timestamp)
//! entities(id, article_id, entity_text, entity_type)
//! sentiments(id, article_id, sentiment)
//! ```
//!
//! Writes are idempotent per URL: re-analyzing an article replaces its row
//! in place (stable id) and swaps out the child entity and sentiment rows
//! wholesale. Everything happens inside one transaction, so a failed write
//! leaves no partial record.

use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

use crate::models::{ArticleAnalysis, Entity, EntityCategory, Sentiment, StoredAnalysis};

/// A failed store operation, reported distinctly from fetch failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("could not create database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognized label {0:?} in stored row")]
    BadLabel(String),
}

/// URL-keyed store of article analyses.
pub struct AnalysisStore {
    conn: Connection,
}

impl AnalysisStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        info!("Analysis store ready");
        Ok(store)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT UNIQUE,
                title TEXT,
                content TEXT,
                analysis_timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS entities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER,
                entity_text TEXT,
                entity_type TEXT,
                FOREIGN KEY (article_id) REFERENCES articles (id)
            );
            CREATE TABLE IF NOT EXISTS sentiments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER,
                sentiment TEXT,
                FOREIGN KEY (article_id) REFERENCES articles (id)
            );",
        )?;
        Ok(())
    }

    /// Insert or replace the analysis for its URL.
    ///
    /// The article row keeps a stable id across re-analyses; old entity and
    /// sentiment rows are discarded before the new ones go in. Returns the
    /// article's row id.
    #[instrument(level = "info", skip_all, fields(url = %analysis.url))]
    pub fn upsert(&mut self, analysis: &ArticleAnalysis) -> Result<i64, StoreError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO articles (url, title, content) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET
                 title = excluded.title,
                 content = excluded.content,
                 analysis_timestamp = CURRENT_TIMESTAMP",
            params![analysis.url, analysis.title, analysis.content],
        )?;

        let article_id: i64 = tx.query_row(
            "SELECT id FROM articles WHERE url = ?1",
            params![analysis.url],
            |row| row.get(0),
        )?;

        tx.execute("DELETE FROM entities WHERE article_id = ?1", params![article_id])?;
        tx.execute("DELETE FROM sentiments WHERE article_id = ?1", params![article_id])?;

        {
            let mut insert_entity = tx.prepare(
                "INSERT INTO entities (article_id, entity_text, entity_type) VALUES (?1, ?2, ?3)",
            )?;
            for entity in &analysis.entities {
                insert_entity.execute(params![
                    article_id,
                    entity.text,
                    entity.category.as_str()
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO sentiments (article_id, sentiment) VALUES (?1, ?2)",
            params![article_id, analysis.sentiment.as_str()],
        )?;

        tx.commit()?;
        info!(article_id, entities = analysis.entities.len(), "Stored analysis");
        Ok(article_id)
    }

    /// Look up the stored analysis for `url`. Absent URLs are `Ok(None)`.
    #[instrument(level = "info", skip(self))]
    pub fn lookup(&self, url: &str) -> Result<Option<StoredAnalysis>, StoreError> {
        let article = self
            .conn
            .query_row(
                "SELECT id, url, title, content, analysis_timestamp
                 FROM articles WHERE url = ?1",
                params![url],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, url, title, content, analyzed_at)) = article else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT entity_text, entity_type FROM entities
             WHERE article_id = ?1 ORDER BY id",
        )?;
        let mut entities = Vec::new();
        let rows = stmt.query_map(params![id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (text, label) = row?;
            let category = EntityCategory::from_label(&label)
                .ok_or_else(|| StoreError::BadLabel(label.clone()))?;
            entities.push(Entity { text, category });
        }

        let sentiment_label: String = self.conn.query_row(
            "SELECT sentiment FROM sentiments WHERE article_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        let sentiment = Sentiment::from_label(&sentiment_label)
            .ok_or_else(|| StoreError::BadLabel(sentiment_label.clone()))?;

        Ok(Some(StoredAnalysis {
            id,
            url,
            title,
            content,
            entities,
            sentiment,
            analyzed_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_analysis(url: &str, sentiment: Sentiment) -> ArticleAnalysis {
        ArticleAnalysis {
            url: url.to_string(),
            title: "Headline".to_string(),
            content: "Body text.".to_string(),
            entities: vec![
                Entity { text: "Jane Doe".into(), category: EntityCategory::Person },
                Entity { text: "Acme Corp".into(), category: EntityCategory::Org },
                Entity { text: "Jane Doe".into(), category: EntityCategory::Person },
            ],
            sentiment,
        }
    }

    #[test]
    fn test_upsert_then_lookup_round_trip() {
        let mut store = AnalysisStore::open_in_memory().unwrap();
        let analysis = sample_analysis("https://example.com/a", Sentiment::Positive);

        let id = store.upsert(&analysis).unwrap();
        let stored = store.lookup("https://example.com/a").unwrap().unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.title, "Headline");
        assert_eq!(stored.content, "Body text.");
        assert_eq!(stored.sentiment, Sentiment::Positive);
        assert!(!stored.analyzed_at.is_empty());
        // Order and the duplicate mention both survive the round trip.
        assert_eq!(stored.entities, analysis.entities);
    }

    #[test]
    fn test_lookup_absent_url() {
        let store = AnalysisStore::open_in_memory().unwrap();
        assert!(store.lookup("https://example.com/missing").unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_previous_record() {
        let mut store = AnalysisStore::open_in_memory().unwrap();
        let url = "https://example.com/a";

        let first_id = store.upsert(&sample_analysis(url, Sentiment::Positive)).unwrap();

        let second = ArticleAnalysis {
            url: url.to_string(),
            title: "Updated Headline".to_string(),
            content: "New body.".to_string(),
            entities: vec![Entity { text: "NATO".into(), category: EntityCategory::Org }],
            sentiment: Sentiment::Negative,
        };
        let second_id = store.upsert(&second).unwrap();

        // Same URL keeps the same row.
        assert_eq!(first_id, second_id);

        let stored = store.lookup(url).unwrap().unwrap();
        assert_eq!(stored.title, "Updated Headline");
        assert_eq!(stored.sentiment, Sentiment::Negative);
        // Full replacement, not accumulation.
        assert_eq!(stored.entities.len(), 1);
        assert_eq!(stored.entities[0].text, "NATO");
    }

    #[test]
    fn test_urls_are_independent_keys() {
        let mut store = AnalysisStore::open_in_memory().unwrap();
        store.upsert(&sample_analysis("https://example.com/a", Sentiment::Positive)).unwrap();
        store.upsert(&sample_analysis("https://example.com/b", Sentiment::Negative)).unwrap();

        assert_eq!(
            store.lookup("https://example.com/a").unwrap().unwrap().sentiment,
            Sentiment::Positive
        );
        assert_eq!(
            store.lookup("https://example.com/b").unwrap().unwrap().sentiment,
            Sentiment::Negative
        );
    }

    #[test]
    fn test_empty_entity_list_is_stored() {
        let mut store = AnalysisStore::open_in_memory().unwrap();
        let analysis = ArticleAnalysis {
            url: "https://example.com/quiet".to_string(),
            title: "No Names".to_string(),
            content: "Nothing notable.".to_string(),
            entities: vec![],
            sentiment: Sentiment::Neutral,
        };

        store.upsert(&analysis).unwrap();
        let stored = store.lookup("https://example.com/quiet").unwrap().unwrap();
        assert!(stored.entities.is_empty());
        assert_eq!(stored.sentiment, Sentiment::Neutral);
    }
}
