//! Web search tool
//!
//! Two backends are available:
//! - `serper` (default): Google results through the Serper API, needs a key
//! - `duckduckgo`: keyless search through the daedra crate
//!
//! Every failure is reported as [`AppError::SearchUnavailable`] so the agent
//! can carry on without the results.

use crate::tools::registry::Tool;
use crate::types::{AppError, Result, SearchHit};
use crate::utils::toml_config::{SearchBackend, SearchConfig};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

enum Backend {
    Serper {
        http: reqwest::Client,
        endpoint: String,
        api_key: String,
    },
    DuckDuckGo,
}

/// Web search tool
pub struct SearchTool {
    backend: Backend,
    num_results: usize,
}

impl SearchTool {
    /// Build from configuration.
    ///
    /// The Serper backend refuses to construct without a credential.
    pub fn from_config(config: &SearchConfig, api_key: Option<String>) -> Result<Self> {
        match config.backend {
            SearchBackend::Serper => {
                let api_key = api_key.ok_or_else(|| {
                    AppError::Configuration(format!(
                        "Search credential '{}' is not set",
                        config.api_key_env
                    ))
                })?;
                Self::serper(
                    config.endpoint.clone(),
                    api_key,
                    config.num_results,
                    config.timeout_secs,
                )
            }
            SearchBackend::DuckDuckGo => Ok(Self::duckduckgo(config.num_results)),
        }
    }

    pub fn serper(
        endpoint: String,
        api_key: String,
        num_results: usize,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            backend: Backend::Serper {
                http,
                endpoint,
                api_key,
            },
            num_results,
        })
    }

    pub fn duckduckgo(num_results: usize) -> Self {
        Self {
            backend: Backend::DuckDuckGo,
            num_results,
        }
    }

    /// Run a query and return ranked hits
    pub async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>> {
        match &self.backend {
            Backend::Serper {
                http,
                endpoint,
                api_key,
            } => serper_search(http, endpoint, api_key, query, num_results).await,
            Backend::DuckDuckGo => duckduckgo_search(query, num_results).await,
        }
    }
}

async fn serper_search(
    http: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    query: &str,
    num_results: usize,
) -> Result<Vec<SearchHit>> {
    let response = http
        .post(endpoint)
        .header("X-API-KEY", api_key)
        .json(&json!({ "q": query, "num": num_results }))
        .send()
        .await
        .map_err(|e| AppError::SearchUnavailable(format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::SearchUnavailable(format!(
            "search service returned {}: {}",
            status, body
        )));
    }

    let payload: SerperResponse = response
        .json()
        .await
        .map_err(|e| AppError::SearchUnavailable(format!("unreadable results: {}", e)))?;

    Ok(payload
        .organic
        .into_iter()
        .take(num_results)
        .map(|r| SearchHit {
            title: r.title,
            url: r.link,
            snippet: r.snippet,
        })
        .collect())
}

async fn duckduckgo_search(query: &str, num_results: usize) -> Result<Vec<SearchHit>> {
    let search_args = daedra::SearchArgs {
        query: query.to_string(),
        options: Some(daedra::SearchOptions {
            num_results,
            ..Default::default()
        }),
    };

    let response = daedra::tools::search::perform_search(&search_args)
        .await
        .map_err(|e| AppError::SearchUnavailable(e.to_string()))?;

    Ok(response
        .data
        .iter()
        .map(|r| {
            let raw = json!({
                "title": r.title,
                "url": r.url,
                "description": r.description
            });
            SearchHit {
                title: text_field(&raw, "title"),
                url: text_field(&raw, "url"),
                snippet: text_field(&raw, "description"),
            }
        })
        .collect())
}

fn text_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the internet for a query. Returns a ranked list of results with title, url and snippet."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return",
                    "default": self.num_results
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| AppError::InvalidInput("Missing 'query' parameter".to_string()))?;

        let num_results = args
            .get("num_results")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(self.num_results);

        let results = self.search(query, num_results).await?;

        Ok(json!({
            "query": query,
            "count": results.len(),
            "results": results,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serper_config() -> SearchConfig {
        SearchConfig {
            backend: SearchBackend::Serper,
            api_key_env: "SERPER_API_KEY".to_string(),
            endpoint: "https://google.serper.dev/search".to_string(),
            num_results: 5,
            timeout_secs: 10,
        }
    }

    #[test]
    fn test_serper_requires_credential() {
        let result = SearchTool::from_config(&serper_config(), None);
        match result {
            Err(AppError::Configuration(msg)) => assert!(msg.contains("SERPER_API_KEY")),
            _ => panic!("Expected configuration error"),
        }
    }

    #[test]
    fn test_duckduckgo_needs_no_credential() {
        let mut config = serper_config();
        config.backend = SearchBackend::DuckDuckGo;
        assert!(SearchTool::from_config(&config, None).is_ok());
    }

    #[test]
    fn test_search_tool_definition() {
        let tool = SearchTool::from_config(&serper_config(), Some("key".to_string())).unwrap();
        assert_eq!(tool.name(), "web_search");
        assert!(!tool.description().is_empty());

        let schema = tool.parameters_schema();
        assert!(schema.is_object());
        assert_eq!(schema["properties"]["num_results"]["default"], 5);
    }

    #[tokio::test]
    async fn test_search_missing_query() {
        let tool = SearchTool::from_config(&serper_config(), Some("key".to_string())).unwrap();
        assert!(matches!(
            tool.execute(json!({})).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            tool.execute(json!({"query": "   "})).await,
            Err(AppError::InvalidInput(_))
        ));
    }
}
