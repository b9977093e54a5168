//! Post view models built from repository documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cms::Document;
use crate::helpers::html_escape;
use crate::richtext::{self, LinkResolver, RichText};

/// Words read per minute when estimating reading time
pub const WORDS_PER_MINUTE: usize = 200;

/// List-view projection of a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            uid: doc.uid.clone().unwrap_or_else(|| doc.id.clone()),
            first_publication_date: doc.first_publication_date,
            title: doc.text_field("title").unwrap_or_default().to_string(),
            subtitle: doc.text_field("subtitle").unwrap_or_default().to_string(),
            author: doc.text_field("author").unwrap_or_default().to_string(),
        }
    }
}

/// A titled section of a post body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub body: RichText,
}

/// Link to a neighbouring post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPost {
    pub uid: String,
    pub title: String,
}

impl NavPost {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            uid: doc.uid.clone().unwrap_or_else(|| doc.id.clone()),
            title: doc.text_field("title").unwrap_or_default().to_string(),
        }
    }
}

/// Full projection of a post, including navigation context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    /// Repository id, the anchor for adjacency queries
    pub id: String,
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: String,
    pub content: Vec<ContentBlock>,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub last_publication_date: Option<DateTime<Utc>>,
    pub prev_post: Option<NavPost>,
    pub next_post: Option<NavPost>,
}

impl PostDetail {
    /// Build from a document; neighbours are filled in separately
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let content = match doc.field("content") {
            Some(value) if !value.is_null() => serde_json::from_value(value.clone())?,
            _ => Vec::new(),
        };
        let banner_url = doc
            .field("banner")
            .and_then(|b| b.get("url"))
            .and_then(|u| u.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            id: doc.id.clone(),
            uid: doc.uid.clone().unwrap_or_else(|| doc.id.clone()),
            title: doc.text_field("title").unwrap_or_default().to_string(),
            subtitle: doc.text_field("subtitle").unwrap_or_default().to_string(),
            author: doc.text_field("author").unwrap_or_default().to_string(),
            banner_url,
            content,
            first_publication_date: doc.first_publication_date,
            last_publication_date: doc.last_publication_date,
            prev_post: None,
            next_post: None,
        })
    }

    /// Whitespace-delimited words across all headings and bodies
    pub fn word_count(&self) -> usize {
        self.content
            .iter()
            .map(|block| {
                block.heading.split_whitespace().count()
                    + richtext::as_text(&block.body).split_whitespace().count()
            })
            .sum()
    }

    /// Estimated reading time in minutes, at least 1 when there is any content
    pub fn reading_time(&self) -> usize {
        if self.content.is_empty() {
            0
        } else {
            reading_time(self.word_count()).max(1)
        }
    }

    /// Whether the post was modified after its first publication
    pub fn is_edited(&self) -> bool {
        match self.last_publication_date {
            Some(last) => self.first_publication_date != Some(last),
            None => false,
        }
    }

    /// Body markup: each block's heading followed by its rendered text
    pub fn content_html(&self, links: &LinkResolver) -> String {
        self.content
            .iter()
            .map(|block| {
                format!(
                    "<h2>{}</h2>{}",
                    html_escape(&block.heading),
                    richtext::as_html(&block.body, links)
                )
            })
            .collect()
    }
}

/// Minutes needed to read `words` words, rounded up
pub fn reading_time(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE)
}
