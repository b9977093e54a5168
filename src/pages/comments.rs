//! Discussion widget embed
//!
//! The widget is a third-party script mounted into an anchor element. Each
//! embed is scoped to a page path; the page script empties the anchor and
//! mounts a fresh widget whenever the browser path changes.

use serde::Serialize;

use crate::config::CommentsConfig;

/// Id of the element the widget is mounted into
pub const ANCHOR_ID: &str = "comments";

/// Parameters the template needs to mount the widget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentEmbed {
    pub anchor_id: &'static str,
    pub path: String,
    pub script: String,
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
    pub label: Option<String>,
}

/// A configured discussion widget
#[derive(Debug, Clone)]
pub struct CommentWidget {
    config: CommentsConfig,
}

impl CommentWidget {
    /// `None` when no discussion repository is configured
    pub fn from_config(config: &CommentsConfig) -> Option<Self> {
        config.enabled().then(|| Self {
            config: config.clone(),
        })
    }

    /// Embed scoped to `path`
    pub fn embed(&self, path: &str) -> CommentEmbed {
        CommentEmbed {
            anchor_id: ANCHOR_ID,
            path: path.to_string(),
            script: self.config.script.clone(),
            repo: self.config.repo.clone(),
            issue_term: self.config.issue_term.clone(),
            theme: self.config.theme.clone(),
            label: self.config.label.clone(),
        }
    }
}
