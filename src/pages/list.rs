//! Post list page state
//!
//! The first page is fetched when the page is generated; further pages are
//! appended one at a time by following the pagination cursor.

use anyhow::Result;

use crate::cms::{self, ApiResponse, ContentClient, Ordering, QueryOptions};
use crate::config::SiteConfig;
use crate::content::PostSummary;

/// Outcome of a "load more" interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMore {
    /// This many posts were appended
    Appended(usize),
    /// No cursor left, nothing fetched
    Exhausted,
    /// A load is already in flight, nothing fetched
    Busy,
    /// The fetch failed; state is unchanged
    Failed,
}

/// Posts shown on the list page plus the cursor for the next page
#[derive(Debug, Clone, Default)]
pub struct PostList {
    posts: Vec<PostSummary>,
    cursor: Option<String>,
    loading: bool,
}

impl PostList {
    /// Options for the first page: ascending by publication date, list fields only
    pub fn first_page_options(config: &SiteConfig) -> QueryOptions {
        let doc_type = &config.document_type;
        QueryOptions::new()
            .page_size(config.page_size)
            .order_by(Ordering::asc("document.first_publication_date"))
            .fetch(
                ["title", "subtitle", "author"]
                    .iter()
                    .map(|field| format!("{}.{}", doc_type, field)),
            )
    }

    /// Fetch the first page
    pub async fn load(client: &dyn ContentClient, config: &SiteConfig) -> Result<Self> {
        let options = Self::first_page_options(config);
        let response = client
            .query_by_type(&config.document_type, &options)
            .await?;
        tracing::debug!(
            "Loaded {} of {} posts",
            response.results.len(),
            response.total_results_size
        );
        Ok(Self::from_response(&response))
    }

    pub fn from_response(response: &ApiResponse) -> Self {
        Self {
            posts: response
                .results
                .iter()
                .map(PostSummary::from_document)
                .collect(),
            cursor: response.next_page.clone(),
            loading: false,
        }
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Whether the "load more" control is shown
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Claim the in-flight slot and hand out the cursor to fetch
    ///
    /// Returns `None` while another load is in flight or when no cursor is left.
    pub fn begin_load_more(&mut self) -> Option<String> {
        if self.loading {
            return None;
        }
        let cursor = self.cursor.clone()?;
        self.loading = true;
        Some(cursor)
    }

    /// Apply the result of a fetch started with [`begin_load_more`](Self::begin_load_more)
    pub fn complete_load_more(&mut self, result: cms::Result<ApiResponse>) -> LoadMore {
        self.loading = false;
        match result {
            Ok(response) => {
                let appended = response.results.len();
                self.posts
                    .extend(response.results.iter().map(PostSummary::from_document));
                self.cursor = response.next_page;
                LoadMore::Appended(appended)
            }
            Err(e) => {
                tracing::error!("Failed to load more posts: {}", e);
                LoadMore::Failed
            }
        }
    }

    /// Fetch the next page and append it
    pub async fn load_more(&mut self, client: &dyn ContentClient) -> LoadMore {
        if self.loading {
            return LoadMore::Busy;
        }
        let Some(cursor) = self.begin_load_more() else {
            return LoadMore::Exhausted;
        };
        let result = client.fetch_page(&cursor).await;
        self.complete_load_more(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::memory::tests::post;
    use crate::cms::{CmsError, MemoryClient};

    fn client() -> MemoryClient {
        MemoryClient::new(vec![
            post("D", "delta", 25),
            post("B", "beta", 10),
            post("A", "alpha", 1),
            post("C", "gamma", 20),
            post("E", "epsilon", 28),
        ])
    }

    fn uids(list: &PostList) -> Vec<&str> {
        list.posts().iter().map(|p| p.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn test_first_page_is_ascending_and_sized() {
        let list = PostList::load(&client(), &SiteConfig::default())
            .await
            .unwrap();
        assert_eq!(uids(&list), vec!["alpha", "beta"]);
        assert!(list.has_more());
    }

    #[tokio::test]
    async fn test_load_more_appends_in_order() {
        let client = client();
        let mut list = PostList::load(&client, &SiteConfig::default())
            .await
            .unwrap();

        assert_eq!(list.load_more(&client).await, LoadMore::Appended(2));
        assert_eq!(uids(&list), vec!["alpha", "beta", "gamma", "delta"]);
        assert!(list.has_more());

        assert_eq!(list.load_more(&client).await, LoadMore::Appended(1));
        assert_eq!(
            uids(&list),
            vec!["alpha", "beta", "gamma", "delta", "epsilon"]
        );
        assert!(!list.has_more());
        assert_eq!(list.load_more(&client).await, LoadMore::Exhausted);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_state() {
        let client = client();
        let mut list = PostList::load(&client, &SiteConfig::default())
            .await
            .unwrap();
        let before = list.cursor().map(str::to_string);

        let cursor = list.begin_load_more().unwrap();
        assert!(list.is_loading());
        let outcome = list.complete_load_more(Err(CmsError::InvalidCursor(cursor)));

        assert_eq!(outcome, LoadMore::Failed);
        assert!(!list.is_loading());
        assert_eq!(uids(&list), vec!["alpha", "beta"]);
        assert_eq!(list.cursor().map(str::to_string), before);
    }

    #[tokio::test]
    async fn test_single_load_in_flight() {
        let client = client();
        let mut list = PostList::load(&client, &SiteConfig::default())
            .await
            .unwrap();

        assert!(list.begin_load_more().is_some());
        assert!(list.begin_load_more().is_none());
        assert_eq!(list.load_more(&client).await, LoadMore::Busy);
    }

    #[test]
    fn test_first_page_options() {
        let options = PostList::first_page_options(&SiteConfig::default());
        assert_eq!(options.page_size, Some(2));
        assert_eq!(
            options.fetch,
            vec!["posts.title", "posts.subtitle", "posts.author"]
        );
        assert_eq!(
            options.orderings,
            vec![Ordering::asc("document.first_publication_date")]
        );
    }
}
