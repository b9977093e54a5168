//! Built-in theme templates using the Tera template engine
//!
//! All templates are embedded in the binary. Autoescaping stays on; markup
//! produced by the rich-text serializer is marked `| safe` in the templates.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("home.html", include_str!("theme/home.html")),
            ("post.html", include_str!("theme/post.html")),
            ("loading.html", include_str!("theme/loading.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("theme/partials/header.html"),
            ),
            (
                "partials/exit_preview.html",
                include_str!("theme/partials/exit_preview.html"),
            ),
            (
                "partials/comments.html",
                include_str!("theme/partials/comments.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
    pub logo: String,
}

/// One entry of the post list
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub href: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub datetime: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub title: String,
    pub href: String,
}

/// Everything the detail template shows for a post
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub author: String,
    pub banner_url: String,
    pub date: Option<String>,
    pub datetime: Option<String>,
    /// Formatted last edit, absent when the post was never edited
    pub edited: Option<String>,
    pub reading_time: usize,
    pub content: String,
    pub prev: Option<NavLink>,
    pub next: Option<NavLink>,
}
