use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use super::keywords::{extract_keywords, search_queries};
use super::EvidenceSource;
use crate::config::RetrievalConfig;
use crate::error::{Result, VeracityError};

const USER_AGENT: &str = concat!(
    "veracity/",
    env!("CARGO_PKG_VERSION"),
    " (hallucination detection service)"
);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    query: Option<PageQuery>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    extract: Option<String>,
    #[serde(default)]
    pageprops: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Page {
    fn is_disambiguation(&self) -> bool {
        self.pageprops
            .as_ref()
            .is_some_and(|props| props.contains_key("disambiguation"))
    }
}

/// Fetches full plain-text Wikipedia articles relevant to a question via the
/// MediaWiki action API.
#[derive(Clone)]
pub struct WikipediaClient {
    http: reqwest::Client,
    api_url: String,
    max_results: usize,
}

impl WikipediaClient {
    pub fn new(config: &RetrievalConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VeracityError::Retrieval(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: config.wikipedia_api_url.clone(),
            max_results: config.max_results.max(1),
        })
    }

    /// Titles matching `query`, best first.
    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        let limit = self.max_results.to_string();
        let response: SearchResponse = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    /// The article's plain-text body after following redirects, or `None`
    /// for missing and disambiguation pages.
    async fn page(&self, title: &str) -> Result<Option<(String, String)>> {
        let response: PageResponse = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts|pageprops"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(page) = response.query.and_then(|q| q.pages.into_iter().next()) else {
            return Ok(None);
        };

        if page.missing || page.invalid {
            tracing::warn!(title = %title, "Wikipedia page not found, skipping");
            return Ok(None);
        }
        if page.is_disambiguation() {
            tracing::warn!(title = %title, "Disambiguation page, skipping");
            return Ok(None);
        }

        match page.extract.filter(|text| !text.trim().is_empty()) {
            Some(text) => Ok(Some((page.title, text))),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl EvidenceSource for WikipediaClient {
    async fn fetch_documents(&self, question: &str) -> Result<Vec<String>> {
        let keywords = extract_keywords(question);
        let queries = search_queries(question, &keywords);
        tracing::debug!(?queries, "Generated Wikipedia search queries");

        let mut candidates = Vec::new();
        let mut seen_candidates = HashSet::new();
        for query in &queries {
            match self.search(query).await {
                Ok(titles) => candidates.extend(
                    titles
                        .into_iter()
                        .filter(|title| seen_candidates.insert(title.clone())),
                ),
                Err(error) => {
                    tracing::warn!(query = %query, error = %error, "Wikipedia search failed")
                }
            }
        }

        let mut documents = Vec::new();
        let mut seen_pages = HashSet::new();
        for title in candidates {
            if documents.len() >= self.max_results {
                break;
            }
            if seen_pages.contains(&title) {
                continue;
            }
            match self.page(&title).await {
                Ok(Some((resolved_title, text))) => {
                    if seen_pages.insert(resolved_title.clone()) {
                        tracing::info!(title = %resolved_title, "Added Wikipedia evidence document");
                        documents.push(text);
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(title = %title, error = %error, "Failed to fetch Wikipedia page")
                }
            }
        }

        tracing::info!(documents = documents.len(), "Retrieved Wikipedia documents");
        Ok(documents)
    }
}
