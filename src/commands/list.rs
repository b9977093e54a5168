//! List posts in the repository

use anyhow::Result;

use crate::pages::{LoadMore, PostList};
use crate::SpaceTraveling;

/// Print the first page of posts, or every page with `all`
pub async fn run(app: &SpaceTraveling, all: bool) -> Result<()> {
    let client = app.client.as_ref();
    let mut list = PostList::load(client, &app.config).await?;

    if all {
        loop {
            match list.load_more(client).await {
                LoadMore::Appended(n) => tracing::debug!("Fetched {} more posts", n),
                LoadMore::Failed => anyhow::bail!("Failed to fetch the next page of posts"),
                LoadMore::Exhausted | LoadMore::Busy => break,
            }
        }
    }

    println!("Posts ({}):", list.posts().len());
    for post in list.posts() {
        let date = post
            .first_publication_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        println!("  {} - {} [{}]", date, post.title, post.uid);
    }
    if list.has_more() {
        println!("  ... more posts available, use --all to list them");
    }

    Ok(())
}
