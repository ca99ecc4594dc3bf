//! Web page scrape tool
//!
//! Fetches a URL and reduces it to readable text. HTML is parsed with
//! `scraper`; script and style content is dropped. Any failure is reported as
//! [`AppError::FetchFailed`].

use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use crate::utils::toml_config::ScrapeConfig;
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Text extracted from one page
#[derive(Debug, Clone, Serialize)]
pub struct ScrapedPage {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
    pub truncated: bool,
}

pub struct ScrapeWebsiteTool {
    http: reqwest::Client,
    max_chars: usize,
}

impl ScrapeWebsiteTool {
    pub fn from_config(config: &ScrapeConfig) -> Result<Self> {
        Self::new(config.timeout_secs, config.max_chars, &config.user_agent)
    }

    pub fn new(timeout_secs: u64, max_chars: usize, user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, max_chars })
    }

    /// Fetch `url` and return its visible text
    pub async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| AppError::FetchFailed(format!("invalid url '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::FetchFailed(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let response = self
            .http
            .get(parsed)
            .send()
            .await
            .map_err(|e| AppError::FetchFailed(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::FetchFailed(format!("{} returned {}", url, status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());

        if let Some(ref ct) = content_type {
            if !is_textual(ct) {
                return Err(AppError::FetchFailed(format!(
                    "{} is not a text document ({})",
                    url, ct
                )));
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::FetchFailed(format!("{}: unreadable body: {}", url, e)))?;

        let is_html = content_type
            .as_deref()
            .map(|ct| ct.contains("html"))
            .unwrap_or_else(|| body.trim_start().starts_with('<'));

        let (title, text) = if is_html {
            extract_text(&body)
        } else {
            (None, body.trim().to_string())
        };

        let (content, truncated) = truncate_chars(&text, self.max_chars);

        Ok(ScrapedPage {
            url: url.to_string(),
            title,
            content,
            truncated,
        })
    }
}

fn is_textual(content_type: &str) -> bool {
    content_type.starts_with("text/")
        || content_type.contains("html")
        || content_type.contains("xml")
        || content_type.contains("json")
}

/// Extract the page title and the visible text lines of an HTML document
pub fn extract_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let mut lines = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|e| SKIPPED_ELEMENTS.contains(&e.name()))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }

        let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !line.is_empty() {
            lines.push(line);
        }
    }

    (title, lines.join("\n"))
}

fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (text[..idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

#[async_trait]
impl Tool for ScrapeWebsiteTool {
    fn name(&self) -> &str {
        "scrape_website"
    }

    fn description(&self) -> &str {
        "Read the text content of a web page given its URL."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The full http(s) URL of the page to read"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let url = args
            .get("url")
            .or_else(|| args.get("website_url"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'url' parameter".to_string()))?;

        let page = self.scrape(url).await?;
        serde_json::to_value(page).map_err(|e| AppError::Internal(e.to_string()))
    }
}
