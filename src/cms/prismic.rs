//! HTTP client for a Prismic-style repository

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::predicate::query_param;
use super::{ApiResponse, CmsError, ContentClient, Predicate, QueryOptions, Result};

/// How long a resolved master ref is reused before asking again
const MASTER_REF_TTL: Duration = Duration::from_secs(5);

/// API descriptor returned by `GET {endpoint}`
#[derive(Debug, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<RefInfo>,
}

#[derive(Debug, Deserialize)]
struct RefInfo {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

/// Repository client over HTTP
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    master_ref: RwLock<Option<(Instant, String)>>,
}

impl PrismicClient {
    /// Create a client for an API endpoint such as `https://repo.cdn.prismic.io/api/v2`
    pub fn new(endpoint: &str, access_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.is_empty()),
            master_ref: RwLock::new(None),
        }
    }

    /// Resolve the current master ref, reusing a recent answer
    async fn master_ref(&self) -> Result<String> {
        if let Some((fetched_at, reference)) = self.master_ref.read().await.as_ref() {
            if fetched_at.elapsed() < MASTER_REF_TTL {
                return Ok(reference.clone());
            }
        }

        let mut url = self.endpoint.clone();
        if let Some(token) = &self.access_token {
            url.push_str("?access_token=");
            url.push_str(&encode(token));
        }
        let body = self.get(&url).await?;
        let info: ApiInfo = serde_json::from_slice(&body)?;
        let reference = info
            .refs
            .into_iter()
            .find(|r| r.is_master)
            .map(|r| r.reference)
            .ok_or(CmsError::NoMasterRef)?;

        tracing::debug!("Resolved master ref {}", reference);
        *self.master_ref.write().await = Some((Instant::now(), reference.clone()));
        Ok(reference)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ContentClient for PrismicClient {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<ApiResponse> {
        let reference = match &options.reference {
            Some(reference) => reference.clone(),
            None => self.master_ref().await?,
        };
        let url = search_url(
            &self.endpoint,
            self.access_token.as_deref(),
            &reference,
            predicates,
            options,
        );
        tracing::debug!("Querying {}", url);
        let body = self.get(&url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn fetch_page(&self, cursor: &str) -> Result<ApiResponse> {
        if !cursor.starts_with(&self.endpoint) {
            return Err(CmsError::InvalidCursor(cursor.to_string()));
        }
        let body = self.get(cursor).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Build the `documents/search` URL for a query
pub fn search_url(
    endpoint: &str,
    access_token: Option<&str>,
    reference: &str,
    predicates: &[Predicate],
    options: &QueryOptions,
) -> String {
    let mut params: Vec<(&str, String)> = vec![("ref", reference.to_string())];
    if !predicates.is_empty() {
        params.push(("q", query_param(predicates)));
    }
    if let Some(size) = options.page_size {
        params.push(("pageSize", size.to_string()));
    }
    if let Some(page) = options.page {
        params.push(("page", page.to_string()));
    }
    if let Some(orderings) = options.orderings_param() {
        params.push(("orderings", orderings));
    }
    if !options.fetch.is_empty() {
        params.push(("fetch", options.fetch.join(",")));
    }
    if let Some(after) = &options.after {
        params.push(("after", after.clone()));
    }
    if let Some(token) = access_token {
        params.push(("access_token", token.to_string()));
    }

    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, encode(v)))
        .collect();
    format!(
        "{}/documents/search?{}",
        endpoint.trim_end_matches('/'),
        query.join("&")
    )
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::Ordering;

    #[test]
    fn test_search_url() {
        let options = QueryOptions::new()
            .page_size(2)
            .order_by(Ordering::asc("document.first_publication_date"))
            .fetch(["posts.title", "posts.author"]);
        let url = search_url(
            "https://blog.cdn.prismic.io/api/v2/",
            Some("tok"),
            "YF-master",
            &[Predicate::at("document.type", "posts")],
            &options,
        );
        assert!(url.starts_with("https://blog.cdn.prismic.io/api/v2/documents/search?ref=YF%2Dmaster"));
        assert!(url.contains("&q=%5B%5Bat%28document%2Etype%2C%22posts%22%29%5D%5D"));
        assert!(url.contains("&pageSize=2"));
        assert!(url.contains("&orderings=%5Bdocument%2Efirst%5Fpublication%5Fdate%5D"));
        assert!(url.contains("&fetch=posts%2Etitle%2Cposts%2Eauthor"));
        assert!(url.ends_with("&access_token=tok"));
    }

    #[test]
    fn test_search_url_after_cursor() {
        let options = QueryOptions::new()
            .page_size(1)
            .after("YF1")
            .order_by(Ordering::desc("document.first_publication_date"));
        let url = search_url("https://x/api/v2", None, "r", &[], &options);
        assert!(url.contains("&after=YF1"));
        assert!(url.contains("desc"));
        assert!(!url.contains("access_token"));
        assert!(!url.contains("&q="));
    }

    #[tokio::test]
    async fn test_rejects_foreign_cursor() {
        let client = PrismicClient::new("https://blog.cdn.prismic.io/api/v2", None);
        let err = client
            .fetch_page("https://elsewhere.example/api")
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::InvalidCursor(_)));
    }
}
