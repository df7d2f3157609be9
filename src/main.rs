//! # Article Pulse
//!
//! A news-article analysis pipeline: fetch an article by URL, extract its
//! title and body text, detect the people and organizations it mentions via
//! an external NLP service, score its sentiment with a lexicon-and-rules
//! classifier, and persist the result keyed by URL.
//!
//! ## Usage
//!
//! ```sh
//! article_pulse https://example.com/some-story
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture, per URL:
//! 1. **Lookup**: Serve a stored analysis when one exists (unless `--refresh`)
//! 2. **Fetching**: Download the page and extract title + body text
//! 3. **Entities**: Ask the NER service for person/organization mentions
//! 4. **Scoring**: Run the sentiment classifier over the body text
//! 5. **Persistence**: Upsert the analysis into SQLite, then present it
//!
//! Fetching, extraction, and scoring for multiple URLs run concurrently
//! (4 at a time); persistence and presentation are sequential.

use clap::Parser;
use futures::stream::{self, StreamExt};
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};
use url::Url;

mod cli;
mod fetch;
mod models;
mod ner;
mod output;
mod sentiment;
mod store;
mod utils;

use cli::Cli;
use fetch::ArticleFetcher;
use models::ArticleAnalysis;
use ner::NerClient;
use sentiment::{Lexicon, LexiconConfig, SentimentScorer};
use store::AnalysisStore;
use utils::ensure_writable_dir;

/// How many articles are fetched and analyzed at once.
const PARALLEL_ARTICLES: usize = 4;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("article_pulse starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.db_path, ?args.ner_url, urls = args.urls.len(), "Parsed CLI arguments");

    // ---- Build the scorer ----
    let lexicon = match &args.lexicon {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let config: LexiconConfig = serde_yaml::from_str(&raw)?;
            let lexicon = Lexicon::new(config)?;
            info!(path = %path.display(), "Loaded custom lexicon");
            lexicon
        }
        None => Lexicon::default(),
    };
    let scorer = SentimentScorer::new(lexicon);

    // ---- Collaborators ----
    let ner_endpoint = Url::parse(&args.ner_url)?;
    let ner_client = NerClient::new(ner_endpoint)?;
    let fetcher = ArticleFetcher::new()?;
    let mut store = AnalysisStore::open(&args.db_path)?;

    // Early check: ensure the JSON export dir is writable before any work
    if let Some(ref dir) = args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "JSON output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Cache pass: serve stored analyses, queue the rest ----
    let mut pending: Vec<String> = Vec::new();
    for raw in &args.urls {
        let url = match Url::parse(raw) {
            Ok(parsed) => parsed.to_string(),
            Err(e) => {
                warn!(url = %raw, error = %e, "Not a valid URL; skipping");
                continue;
            }
        };

        if !args.refresh {
            match store.lookup(&url) {
                Ok(Some(stored)) => {
                    info!(%url, article_id = stored.id, "Serving stored analysis");
                    println!("{}", output::render_stored(&stored));
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(%url, error = %e, "Store lookup failed; re-analyzing");
                }
            }
        }
        pending.push(url);
    }

    let total_pending = pending.len();
    info!(
        requested = args.urls.len(),
        pending = total_pending,
        "Starting article analysis"
    );

    // ---- Fetch, extract, and score concurrently ----
    let results: Vec<Option<ArticleAnalysis>> = stream::iter(pending)
        .map(|url: String| {
            let fetcher = &fetcher;
            let ner_client = &ner_client;
            let scorer = &scorer;
            let window = args.sentiment_window;
            async move {
                debug!(%url, "Analyzing article");

                let article = match fetcher.fetch(&url).await {
                    Ok(article) => article,
                    Err(e) => {
                        error!(%url, error = %e, "Fetch failed; skipping article");
                        return None;
                    }
                };

                let entities = match ner::extract_with_backoff(ner_client, &article.content).await
                {
                    Ok(entities) => entities,
                    Err(e) => {
                        error!(%url, error = %e, "Entity extraction failed; skipping article");
                        return None;
                    }
                };

                let sentiment = scorer.analyze_within(&article.content, window);
                info!(%url, %sentiment, entities = entities.len(), "Scored article");

                Some(ArticleAnalysis {
                    url: article.url,
                    title: article.title,
                    content: article.content,
                    entities,
                    sentiment,
                })
            }
        })
        .buffer_unordered(PARALLEL_ARTICLES)
        .collect()
        .await;

    // ---- Persist and present sequentially ----
    let analyzed: Vec<ArticleAnalysis> = results.into_iter().flatten().collect();
    let analyzed_count = analyzed.len();
    let mut persisted_count = 0usize;

    for analysis in analyzed {
        match store.upsert(&analysis) {
            Ok(article_id) => {
                info!(article_id, url = %analysis.url, "Analysis persisted");
                persisted_count += 1;

                if let Some(ref dir) = args.json_output_dir {
                    if let Err(e) = output::write_analysis(&analysis, dir).await {
                        error!(url = %analysis.url, error = %e, "Failed to write analysis JSON");
                    }
                }

                println!("{}", output::render_analysis(&analysis));
            }
            Err(e) => {
                // Nothing partial stays behind: the transaction rolled back.
                error!(
                    url = %analysis.url,
                    error = %e,
                    "Failed to persist analysis; discarding results for this URL"
                );
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        requested = args.urls.len(),
        analyzed = analyzed_count,
        persisted = persisted_count,
        failed = total_pending - analyzed_count,
        "Execution complete"
    );

    Ok(())
}
