//! Command-line interface definitions.
//!
//! All options can be provided via command-line flags; the database path and
//! entity-service endpoint also fall back to environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the article analyzer.
///
/// # Examples
///
/// ```sh
/// # Analyze one article
/// article_pulse https://example.com/story
///
/// # Several at once, against a custom database
/// article_pulse -d ./analyses.db https://example.com/a https://example.com/b
///
/// # Force re-analysis and export JSON
/// article_pulse --refresh -j ./json https://example.com/story
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Article URLs to analyze
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// SQLite database file holding past analyses
    #[arg(short, long, env = "ARTICLE_DB", default_value = "article_analysis.db")]
    pub db_path: PathBuf,

    /// Entity-extraction service endpoint
    #[arg(long, env = "NER_URL", default_value = "http://127.0.0.1:8000/ner")]
    pub ner_url: String,

    /// Optional YAML file overriding the built-in sentiment lexicon
    #[arg(long)]
    pub lexicon: Option<PathBuf>,

    /// Characters of text the sentiment pass looks at
    #[arg(long, default_value_t = crate::sentiment::DEFAULT_MAX_CHARS)]
    pub sentiment_window: usize,

    /// Re-analyze even when a stored record exists for the URL
    #[arg(long)]
    pub refresh: bool,

    /// Optional output directory for per-article JSON exports
    #[arg(short, long)]
    pub json_output_dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(&[
            "article_pulse",
            "--db-path",
            "./test.db",
            "https://example.com/story",
        ]);

        assert_eq!(cli.urls, vec!["https://example.com/story"]);
        assert_eq!(cli.db_path, PathBuf::from("./test.db"));
        assert_eq!(cli.ner_url, "http://127.0.0.1:8000/ner");
        assert_eq!(cli.sentiment_window, 512);
        assert!(!cli.refresh);
        assert!(cli.json_output_dir.is_none());
    }

    #[test]
    fn test_cli_multiple_urls_and_flags() {
        let cli = Cli::parse_from(&[
            "article_pulse",
            "--refresh",
            "--sentiment-window",
            "256",
            "-j",
            "/tmp/json",
            "https://example.com/a",
            "https://example.com/b",
        ]);

        assert_eq!(cli.urls.len(), 2);
        assert!(cli.refresh);
        assert_eq!(cli.sentiment_window, 256);
        assert_eq!(cli.json_output_dir.as_deref(), Some("/tmp/json"));
    }

    #[test]
    fn test_cli_requires_a_url() {
        assert!(Cli::try_parse_from(&["article_pulse"]).is_err());
    }
}
