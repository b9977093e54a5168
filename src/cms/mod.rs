//! Content repository client
//!
//! The pages only ever talk to a [`ContentClient`]. Two implementations exist:
//! [`PrismicClient`] queries a remote repository over HTTP, [`MemoryClient`]
//! answers the same queries from documents held in memory (loaded from a
//! fixtures file or built in tests).

mod document;
pub mod memory;
mod predicate;
pub mod prismic;

use async_trait::async_trait;
use thiserror::Error;

pub use document::{ApiResponse, Document};
pub use memory::MemoryClient;
pub use predicate::{Ordering, Predicate, QueryOptions};
pub use prismic::PrismicClient;

/// Result type alias for repository operations
pub type Result<T> = std::result::Result<T, CmsError>;

/// Errors raised while talking to the content repository
#[derive(Error, Debug)]
pub enum CmsError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The repository answered with a non-success status
    #[error("repository returned {status} for {url}")]
    Status { status: u16, url: String },

    /// Payload could not be decoded
    #[error("failed to decode repository response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API descriptor lists no master ref
    #[error("repository exposes no master ref")]
    NoMasterRef,

    /// A pagination cursor this client did not issue
    #[error("invalid pagination cursor: {0}")]
    InvalidCursor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read access to a content repository
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Run a search with predicates, ordering, page size and cursor options
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions)
        -> Result<ApiResponse>;

    /// Fetch the page a `next_page` cursor points at
    async fn fetch_page(&self, cursor: &str) -> Result<ApiResponse>;

    /// All documents of one custom type
    async fn query_by_type(&self, doc_type: &str, options: &QueryOptions) -> Result<ApiResponse> {
        self.query(&[Predicate::at("document.type", doc_type)], options)
            .await
    }

    /// A single document by its uid, `None` when the repository has no match
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> Result<Option<Document>> {
        let predicates = [Predicate::at(format!("my.{}.uid", doc_type), uid)];
        let options = options.clone().page_size(1);
        let response = self.query(&predicates, &options).await?;
        Ok(response.results.into_iter().next())
    }

    /// A single document by its repository id
    async fn get_by_id(&self, id: &str, options: &QueryOptions) -> Result<Option<Document>> {
        let predicates = [Predicate::at("document.id", id)];
        let options = options.clone().page_size(1);
        let response = self.query(&predicates, &options).await?;
        Ok(response.results.into_iter().next())
    }
}
