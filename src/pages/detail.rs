//! Post detail page state

use anyhow::Result;

use crate::cms::{self, ContentClient, Ordering, QueryOptions};
use crate::config::SiteConfig;
use crate::content::{NavPost, PostDetail};
use crate::preview::Preview;

const PUBLICATION_DATE: &str = "document.first_publication_date";

/// Where unknown posts are sent
pub const REDIRECT_TARGET: &str = "/";

/// Lifecycle of a detail page
#[derive(Debug, Clone, PartialEq)]
pub enum PostPage {
    /// Post found and ready to render
    Ready(Box<PostDetail>),
    /// The uid matches no post
    Redirect(String),
}

impl PostPage {
    /// Resolve a uid into a ready page or a redirect to the list
    pub async fn resolve(
        client: &dyn ContentClient,
        config: &SiteConfig,
        uid: &str,
        preview: &Preview,
    ) -> Result<Self> {
        let reference = preview.reference().map(str::to_string);
        match load_post(client, &config.document_type, uid, reference).await? {
            Some(post) => Ok(PostPage::Ready(Box::new(post))),
            None => {
                tracing::info!("Unknown post {:?}, redirecting to {}", uid, REDIRECT_TARGET);
                Ok(PostPage::Redirect(REDIRECT_TARGET.to_string()))
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PostPage::Ready(_))
    }
}

/// Fetch a post with its neighbours, `None` for an unknown uid
pub async fn load_post(
    client: &dyn ContentClient,
    doc_type: &str,
    uid: &str,
    reference: Option<String>,
) -> Result<Option<PostDetail>> {
    let options = QueryOptions::new().reference(reference);
    let Some(doc) = client.get_by_uid(doc_type, uid, &options).await? else {
        return Ok(None);
    };

    let mut post = PostDetail::from_document(&doc)?;
    post.prev_post = adjacent(
        client,
        doc_type,
        &doc.id,
        Ordering::desc(PUBLICATION_DATE),
        &options,
    )
    .await?;
    post.next_post = adjacent(
        client,
        doc_type,
        &doc.id,
        Ordering::asc(PUBLICATION_DATE),
        &options,
    )
    .await?;
    Ok(Some(post))
}

/// The first post after `id` in the given ordering
async fn adjacent(
    client: &dyn ContentClient,
    doc_type: &str,
    id: &str,
    ordering: Ordering,
    base: &QueryOptions,
) -> cms::Result<Option<NavPost>> {
    let options = base.clone().page_size(1).after(id).order_by(ordering);
    let response = client.query_by_type(doc_type, &options).await?;
    Ok(response.results.first().map(NavPost::from_document))
}

/// Uids pre-rendered ahead of any request
pub async fn static_paths(client: &dyn ContentClient, config: &SiteConfig) -> Result<Vec<String>> {
    let options = QueryOptions::new()
        .page_size(config.static_paths)
        .fetch([format!("{}.uid", config.document_type)]);
    let response = client
        .query_by_type(&config.document_type, &options)
        .await?;
    Ok(response
        .results
        .into_iter()
        .filter_map(|doc| doc.uid)
        .collect())
}
