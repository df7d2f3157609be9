//! Rendering analysis results for the terminal and JSON export.
//!
//! The terminal report mirrors what a reader wants at a glance: the
//! headline, a bounded preview of the body text, the people and
//! organizations mentioned, and the sentiment label. Cached results carry
//! the timestamp of the original analysis.
//!
//! With an export directory configured, each analysis is also written as a
//! pretty-printed JSON file named after the article's slugified title.

use chrono::Local;
use itertools::Itertools;
use serde::Serialize;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

use crate::models::{ArticleAnalysis, Entity, EntityCategory, Sentiment, StoredAnalysis};
use crate::utils::{slugify_title, truncate_for_log, upcase};

/// Characters of body text shown in the terminal report.
const CONTENT_PREVIEW_CHARS: usize = 1000;

/// Render a freshly computed analysis.
pub fn render_analysis(analysis: &ArticleAnalysis) -> String {
    render(
        &analysis.title,
        &analysis.content,
        &analysis.entities,
        analysis.sentiment,
        None,
    )
}

/// Render an analysis served from the store.
pub fn render_stored(stored: &StoredAnalysis) -> String {
    render(
        &stored.title,
        &stored.content,
        &stored.entities,
        stored.sentiment,
        Some(&stored.analyzed_at),
    )
}

fn render(
    title: &str,
    content: &str,
    entities: &[Entity],
    sentiment: Sentiment,
    analyzed_at: Option<&str>,
) -> String {
    let mut out = String::new();

    if let Some(ts) = analyzed_at {
        out.push_str(&format!("(previously analyzed at {ts})\n\n"));
    }

    out.push_str("--- Article Title ---\n");
    out.push_str(title);
    out.push_str("\n\n--- Article Content ---\n");
    out.push_str(&truncate_for_log(content, CONTENT_PREVIEW_CHARS));
    out.push_str("\n\n--- Named Entities ---\n");

    if entities.is_empty() {
        out.push_str("No named entities found.\n");
    } else {
        let counts = entities.iter().counts_by(|e| e.category);
        let people = counts.get(&EntityCategory::Person).copied().unwrap_or(0);
        let orgs = counts.get(&EntityCategory::Org).copied().unwrap_or(0);
        out.push_str(&format!(
            "{} mention(s): {} PERSON, {} ORG\n",
            entities.len(),
            people,
            orgs
        ));
        for entity in entities {
            out.push_str(&format!("- {} ({})\n", entity.text, entity.category));
        }
    }

    out.push_str("\n--- Sentiment Analysis ---\n");
    out.push_str(&format!("Overall Sentiment: {}\n", upcase(sentiment.as_str())));

    out
}

#[derive(Serialize)]
struct AnalysisExport<'a> {
    url: &'a str,
    title: &'a str,
    content: &'a str,
    entities: &'a [Entity],
    sentiment: Sentiment,
    analyzed_at: String,
}

/// Write an analysis to `{json_output_dir}/{slug-of-title}.json`.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_analysis(
    analysis: &ArticleAnalysis,
    json_output_dir: &str,
) -> Result<(), Box<dyn Error>> {
    let export = AnalysisExport {
        url: &analysis.url,
        title: &analysis.title,
        content: &analysis.content,
        entities: &analysis.entities,
        sentiment: analysis.sentiment,
        analyzed_at: Local::now().to_rfc3339(),
    };
    let json = serde_json::to_string_pretty(&export)?;

    fs::create_dir_all(json_output_dir).await?;

    let mut slug = slugify_title(&analysis.title);
    if slug.is_empty() {
        slug = "article".to_string();
    }
    let path = format!("{}/{}.json", json_output_dir.trim_end_matches('/'), slug);

    fs::write(&path, json).await?;
    info!(path = %path, "Wrote analysis JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ArticleAnalysis {
        ArticleAnalysis {
            url: "https://example.com/story".to_string(),
            title: "Markets Rally".to_string(),
            content: "Stocks climbed on wonderful earnings.".to_string(),
            entities: vec![
                Entity { text: "Jane Doe".into(), category: EntityCategory::Person },
                Entity { text: "Acme Corp".into(), category: EntityCategory::Org },
                Entity { text: "Jane Doe".into(), category: EntityCategory::Person },
            ],
            sentiment: Sentiment::Positive,
        }
    }

    #[test]
    fn test_report_sections() {
        let report = render_analysis(&sample());
        assert!(report.contains("--- Article Title ---\nMarkets Rally"));
        assert!(report.contains("--- Article Content ---"));
        assert!(report.contains("3 mention(s): 2 PERSON, 1 ORG"));
        assert!(report.contains("- Jane Doe (PERSON)"));
        assert!(report.contains("- Acme Corp (ORG)"));
        assert!(report.contains("Overall Sentiment: Positive"));
        assert!(!report.contains("previously analyzed"));
    }

    #[test]
    fn test_report_without_entities() {
        let mut analysis = sample();
        analysis.entities.clear();
        analysis.sentiment = Sentiment::Neutral;

        let report = render_analysis(&analysis);
        assert!(report.contains("No named entities found."));
        assert!(report.contains("Overall Sentiment: Neutral"));
    }

    #[test]
    fn test_report_truncates_long_content() {
        let mut analysis = sample();
        analysis.content = "x".repeat(5000);

        let report = render_analysis(&analysis);
        assert!(report.contains("…(+4000 chars)"));
    }

    #[test]
    fn test_stored_report_shows_timestamp() {
        let stored = StoredAnalysis {
            id: 7,
            url: "https://example.com/story".to_string(),
            title: "Markets Rally".to_string(),
            content: "Body.".to_string(),
            entities: vec![],
            sentiment: Sentiment::Neutral,
            analyzed_at: "2026-08-05 12:00:00".to_string(),
        };
        let report = render_stored(&stored);
        assert!(report.contains("(previously analyzed at 2026-08-05 12:00:00)"));
    }

    #[tokio::test]
    async fn test_write_analysis_creates_slugged_file() {
        let dir = std::env::temp_dir().join(format!("article_pulse_out_{}", std::process::id()));
        let dir_str = dir.to_str().unwrap().to_string();

        write_analysis(&sample(), &dir_str).await.unwrap();

        let path = dir.join("markets-rally.json");
        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["sentiment"], "positive");
        assert_eq!(value["entities"][1]["category"], "ORG");
        assert!(value["analyzed_at"].as_str().is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
