//! In-memory repository
//!
//! Answers the same predicate/ordering/paging queries as the remote
//! repository from a fixed list of documents. Pagination cursors are the
//! serialized request prefixed with `memory:`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;
use std::fs;
use std::path::Path;

use super::{ApiResponse, CmsError, ContentClient, Document, Ordering, Predicate, QueryOptions, Result};

const CURSOR_PREFIX: &str = "memory:";

/// Page size the remote repository uses when none is requested
const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Serialize, Deserialize)]
struct PageRequest {
    predicates: Vec<Predicate>,
    options: QueryOptions,
}

/// Fixtures file layout: a bare array or a search response
#[derive(Deserialize)]
#[serde(untagged)]
enum Fixtures {
    Documents(Vec<Document>),
    Response { results: Vec<Document> },
}

/// Repository backed by a list of documents
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    documents: Vec<Document>,
}

impl MemoryClient {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load documents from a JSON fixtures file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let documents = match serde_json::from_str::<Fixtures>(&content)? {
            Fixtures::Documents(documents) => documents,
            Fixtures::Response { results } => results,
        };
        tracing::info!(
            "Loaded {} documents from {:?}",
            documents.len(),
            path.as_ref()
        );
        Ok(Self::new(documents))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    fn run(&self, request: &PageRequest) -> Result<ApiResponse> {
        let mut matched: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| request.predicates.iter().all(|p| matches(doc, p)))
            .collect();

        let orderings = &request.options.orderings;
        if !orderings.is_empty() {
            matched.sort_by(|a, b| compare(a, b, orderings));
        }

        if let Some(after) = &request.options.after {
            if let Some(pos) = matched.iter().position(|doc| &doc.id == after) {
                matched.drain(..=pos);
            }
        }

        let page_size = request
            .options
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .max(1);
        let page = request.options.page.unwrap_or(1).max(1);
        let total = matched.len();
        let total_pages = total.div_ceil(page_size);

        let results: Vec<Document> = matched
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        let next_page = if page < total_pages {
            Some(cursor_for(request, page + 1)?)
        } else {
            None
        };
        let prev_page = if page > 1 {
            Some(cursor_for(request, page - 1)?)
        } else {
            None
        };

        Ok(ApiResponse {
            page,
            results_per_page: page_size,
            results_size: results.len(),
            total_results_size: total,
            total_pages,
            next_page,
            prev_page,
            results,
        })
    }
}

#[async_trait]
impl ContentClient for MemoryClient {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<ApiResponse> {
        self.run(&PageRequest {
            predicates: predicates.to_vec(),
            options: options.clone(),
        })
    }

    async fn fetch_page(&self, cursor: &str) -> Result<ApiResponse> {
        let request: PageRequest = cursor
            .strip_prefix(CURSOR_PREFIX)
            .and_then(|json| serde_json::from_str(json).ok())
            .ok_or_else(|| CmsError::InvalidCursor(cursor.to_string()))?;
        self.run(&request)
    }
}

fn cursor_for(request: &PageRequest, page: usize) -> Result<String> {
    let next = PageRequest {
        predicates: request.predicates.clone(),
        options: request.options.clone().page(page),
    };
    Ok(format!("{}{}", CURSOR_PREFIX, serde_json::to_string(&next)?))
}

/// Value of a predicate/ordering path on a document
fn resolve(doc: &Document, path: &str) -> Option<String> {
    match path {
        "document.id" => Some(doc.id.clone()),
        "document.type" => Some(doc.doc_type.clone()),
        _ => {
            let rest = path.strip_prefix("my.")?;
            let (doc_type, field) = rest.split_once('.')?;
            if doc_type != doc.doc_type {
                return None;
            }
            if field == "uid" {
                return doc.uid.clone();
            }
            match doc.field(field)? {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            }
        }
    }
}

fn matches(doc: &Document, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::At { path, value } => resolve(doc, path).as_deref() == Some(value.as_str()),
        Predicate::Not { path, value } => resolve(doc, path).as_deref() != Some(value.as_str()),
        Predicate::Any { path, values } => {
            resolve(doc, path).is_some_and(|v| values.iter().any(|candidate| candidate == &v))
        }
    }
}

fn compare(a: &Document, b: &Document, orderings: &[Ordering]) -> CmpOrdering {
    for ordering in orderings {
        let ord = match ordering.field.as_str() {
            "document.first_publication_date" => {
                compare_missing_last(&a.first_publication_date, &b.first_publication_date)
            }
            "document.last_publication_date" => {
                compare_missing_last(&a.last_publication_date, &b.last_publication_date)
            }
            field => compare_missing_last(&resolve(a, field), &resolve(b, field)),
        };
        let ord = if ordering.descending { ord.reverse() } else { ord };
        if ord != CmpOrdering::Equal {
            return ord;
        }
    }
    CmpOrdering::Equal
}

fn compare_missing_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> CmpOrdering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// A `posts` document published on the given day of March 2021
    pub(crate) fn post(id: &str, uid: &str, day: u32) -> Document {
        let date = Utc.with_ymd_and_hms(2021, 3, day, 12, 0, 0).unwrap();
        Document {
            id: id.to_string(),
            uid: Some(uid.to_string()),
            doc_type: "posts".to_string(),
            first_publication_date: Some(date),
            last_publication_date: Some(date),
            data: serde_json::json!({
                "title": format!("Title {}", uid),
                "subtitle": format!("Subtitle {}", uid),
                "author": "Joseph Oliveira",
                "banner": { "url": format!("https://images.example/{}.png", uid) },
                "content": []
            }),
        }
    }

    fn client() -> MemoryClient {
        MemoryClient::new(vec![
            post("C", "gamma", 20),
            post("A", "alpha", 1),
            post("B", "beta", 10),
        ])
    }

    fn uids(response: &ApiResponse) -> Vec<&str> {
        response
            .results
            .iter()
            .filter_map(|d| d.uid.as_deref())
            .collect()
    }

    #[tokio::test]
    async fn test_ordered_paging_with_cursor() {
        let client = client();
        let options = QueryOptions::new()
            .page_size(2)
            .order_by(Ordering::asc("document.first_publication_date"));
        let first = client.query_by_type("posts", &options).await.unwrap();
        assert_eq!(uids(&first), vec!["alpha", "beta"]);
        assert_eq!(first.total_pages, 2);

        let cursor = first.next_page.expect("cursor for second page");
        let second = client.fetch_page(&cursor).await.unwrap();
        assert_eq!(uids(&second), vec!["gamma"]);
        assert!(second.next_page.is_none());
    }

    #[tokio::test]
    async fn test_after_skips_through_anchor() {
        let client = client();
        let options = QueryOptions::new()
            .page_size(1)
            .after("B")
            .order_by(Ordering::desc("document.first_publication_date"));
        let response = client.query_by_type("posts", &options).await.unwrap();
        assert_eq!(uids(&response), vec!["alpha"]);
    }

    #[tokio::test]
    async fn test_get_by_uid() {
        let client = client();
        let doc = client
            .get_by_uid("posts", "beta", &QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(doc.map(|d| d.id), Some("B".to_string()));

        let missing = client
            .get_by_uid("posts", "nope", &QueryOptions::new())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_invalid_cursor() {
        let err = client().fetch_page("memory:{broken").await.unwrap_err();
        assert!(matches!(err, CmsError::InvalidCursor(_)));
    }

    #[test]
    fn test_from_file_accepts_response_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        let body = serde_json::json!({ "results": [post("A", "alpha", 1)] });
        fs::write(&path, body.to_string()).unwrap();

        let client = MemoryClient::from_file(&path).unwrap();
        assert_eq!(client.documents().len(), 1);
    }
}
