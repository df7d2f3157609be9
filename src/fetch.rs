//! Article retrieval and text extraction.
//!
//! Fetches a news article URL and pulls out a title and the main-body text
//! from the HTML. News sites disagree wildly about markup, so both
//! extractions are fallback chains rather than single selectors:
//!
//! - **Title**: `og:title` meta tag, then `<title>`, then the first `<h1>`.
//! - **Content**: the first of `article`, `div.article-body`, `div.content`,
//!   `div.main-content`, `body` whose paragraphs carry text, with the whole
//!   body text as a last resort for pages that skip `<p>` tags.
//!
//! Failures are values, never panics: network errors, non-2xx statuses, and
//! pages with nothing extractable each map to their own [`FetchError`]
//! variant so the caller can report them distinctly.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::models::Article;
use crate::utils::truncate_for_log;

/// Some outlets refuse requests without a browser-looking User-Agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Containers tried in order when looking for the article body.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "div.article-body",
    "div.content",
    "div.main-content",
    "body",
];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A failed article retrieval, reported to the caller as a value.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("no extractable content at {url}")]
    NoContent { url: String },
}

/// HTTP fetcher with article-extraction heuristics.
pub struct ArticleFetcher {
    http: Client,
}

impl ArticleFetcher {
    /// Build a fetcher with browser headers and a 10 second timeout.
    pub fn new() -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    /// Fetch `url` and extract its title and body text.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Article, FetchError> {
        let response = self.http.get(url).send().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Article fetch rejected");
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;

        let document = Html::parse_document(&body);
        let title = extract_title(&document).unwrap_or_else(|| "No Title Found".to_string());
        let content = extract_content(&document).ok_or_else(|| FetchError::NoContent {
            url: url.to_string(),
        })?;

        info!(
            bytes = content.len(),
            title = %truncate_for_log(&title, 80),
            "Parsed article"
        );
        Ok(Article {
            url: url.to_string(),
            title,
            content,
        })
    }
}

/// Title fallback chain: `og:title` meta content, `<title>`, first `<h1>`.
fn extract_title(document: &Html) -> Option<String> {
    let og_title = Selector::parse(r#"meta[property="og:title"]"#).unwrap();
    if let Some(element) = document.select(&og_title).next() {
        if let Some(content) = element.value().attr("content") {
            let title = content.trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }

    for css in ["title", "h1"] {
        let selector = Selector::parse(css).unwrap();
        if let Some(element) = document.select(&selector).next() {
            let title = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            if !title.is_empty() {
                return Some(title);
            }
        }
    }

    None
}

/// Body-text fallback chain over [`CONTENT_SELECTORS`].
///
/// Joins the text of every non-empty paragraph under the first matching
/// container. Returns `None` only when every strategy comes up empty.
fn extract_content(document: &Html) -> Option<String> {
    let paragraph = Selector::parse("p").unwrap();

    for css in CONTENT_SELECTORS {
        let container = Selector::parse(css).unwrap();
        if let Some(root) = document.select(&container).next() {
            let text = root
                .select(&paragraph)
                .map(|p| p.text().collect::<Vec<_>>().join(" "))
                .map(|t| collapse_whitespace(&t))
                .filter(|t| !t.is_empty())
                .join(" ");
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    // Pages that carry their text outside <p> tags entirely.
    let body = Selector::parse("body").unwrap();
    if let Some(root) = document.select(&body).next() {
        let text = collapse_whitespace(&root.text().collect::<Vec<_>>().join(" "));
        if !text.is_empty() {
            return Some(text);
        }
    }

    None
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").to_string()
}
