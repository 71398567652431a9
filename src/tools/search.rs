use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One web search hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    /// Page body as markdown, when the backend scraped it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

pub type DynWebSearch = Arc<dyn WebSearch>;

/// Offline stand-in used when no search backend is configured. Returns a
/// single descriptive hit per query.
#[derive(Clone, Debug, Default)]
pub struct PlaceholderSearch;

#[async_trait]
impl WebSearch for PlaceholderSearch {
    async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        Ok(vec![SearchHit {
            title: query.to_string(),
            url: String::new(),
            description: format!("Results for {query}"),
            content: None,
        }])
    }
}

#[cfg(feature = "http-clients")]
pub use firecrawl::FirecrawlSearch;

#[cfg(feature = "http-clients")]
mod firecrawl {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use tracing::instrument;

    use super::{SearchHit, WebSearch};
    use crate::error::{FlowError, Result};

    const DEFAULT_ENDPOINT: &str = "https://api.firecrawl.dev/v1/search";

    /// Firecrawl search + scrape backend.
    #[derive(Clone)]
    pub struct FirecrawlSearch {
        client: reqwest::Client,
        endpoint: String,
        api_key: String,
    }

    #[derive(Deserialize)]
    struct SearchResponse {
        #[serde(default)]
        success: bool,
        #[serde(default)]
        data: Vec<SearchItem>,
        #[serde(default)]
        error: Option<String>,
    }

    #[derive(Deserialize)]
    struct SearchItem {
        #[serde(default)]
        title: String,
        url: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        markdown: Option<String>,
    }

    impl FirecrawlSearch {
        pub fn new(api_key: impl Into<String>) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .map_err(|e| FlowError::Search(format!("failed to build http client: {e}")))?;
            Ok(Self {
                client,
                endpoint: DEFAULT_ENDPOINT.to_string(),
                api_key: api_key.into(),
            })
        }
    }

    #[async_trait]
    impl WebSearch for FirecrawlSearch {
        #[instrument(skip(self))]
        async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
            let body = json!({
                "query": query,
                "limit": max_results,
                "scrapeOptions": { "formats": ["markdown"] },
            });
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| FlowError::Search(format!("request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(FlowError::Search(format!("status {status}: {text}")));
            }

            let payload: SearchResponse = response
                .json()
                .await
                .map_err(|e| FlowError::Search(format!("invalid response body: {e}")))?;
            if !payload.success {
                return Err(FlowError::Search(
                    payload.error.unwrap_or_else(|| "search was not successful".to_string()),
                ));
            }

            Ok(payload
                .data
                .into_iter()
                .map(|item| SearchHit {
                    title: item.title,
                    url: item.url,
                    description: item.description,
                    content: item.markdown,
                })
                .collect())
        }
    }
}
