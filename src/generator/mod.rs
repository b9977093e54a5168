//! Generator module - renders pages using built-in Tera templates

use anyhow::Result;
use chrono::{Locale, TimeZone, Utc};
use std::collections::HashMap;
use tera::Context;

use crate::content::{NavPost, PostDetail, PostSummary};
use crate::helpers::{date_xml, format_date, locale_for};
use crate::i18n::I18n;
use crate::pages::{CommentWidget, PostList, PostPage, REDIRECT_TARGET};
use crate::preview::{Preview, EXIT_PREVIEW_PATH};
use crate::richtext::LinkResolver;
use crate::templates::{NavLink, PostCard, PostView, SiteData, TemplateRenderer};
use crate::SpaceTraveling;

/// Date shown on list cards and the detail header
const DATE_FORMAT: &str = "d MMM yyyy";

/// Prefix of post routes
pub const POST_BASE: &str = "/post/";

/// Endpoint the list page follows non-HTTP cursors through
pub const CURSOR_ENDPOINT: &str = "/api/posts";

/// Result of rendering a route
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Page(String),
    Redirect(String),
}

/// Page renderer using Tera templates
pub struct Generator {
    app: SpaceTraveling,
    renderer: TemplateRenderer,
    i18n: I18n,
    locale: Locale,
    comments: Option<CommentWidget>,
    links: LinkResolver,
}

impl Generator {
    /// Create a new generator
    pub fn new(app: &SpaceTraveling) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        let mut i18n = I18n::embedded(&app.config.language)?;
        i18n.load_languages(app.base_dir.join("languages"))?;

        Ok(Self {
            app: app.clone(),
            renderer,
            i18n,
            locale: locale_for(&app.config.language),
            comments: CommentWidget::from_config(&app.config.comments),
            links: LinkResolver::new(&app.config.document_type, POST_BASE),
        })
    }

    pub fn app(&self) -> &SpaceTraveling {
        &self.app
    }

    /// Render the post list with its first page
    pub async fn render_home(&self, preview: &Preview) -> Result<String> {
        let list = PostList::load(self.app.client.as_ref(), &self.app.config).await?;
        self.home_html(&list, preview)
    }

    pub fn home_html(&self, list: &PostList, preview: &Preview) -> Result<String> {
        let posts: Vec<PostCard> = list.posts().iter().map(|p| self.post_card(p)).collect();

        let mut context = self.create_base_context("/", preview);
        context.insert("posts", &posts);
        context.insert("next_page", &list.cursor());
        context.insert("months_json", &serde_json::to_string(&self.month_names())?);
        context.insert("post_base", POST_BASE);
        context.insert("cursor_endpoint", CURSOR_ENDPOINT);

        self.renderer.render("home.html", &context)
    }

    /// Render a post route, or the redirect for an unknown uid
    pub async fn render_post(&self, uid: &str, preview: &Preview) -> Result<Rendered> {
        let page =
            PostPage::resolve(self.app.client.as_ref(), &self.app.config, uid, preview).await?;
        match page {
            PostPage::Ready(post) => Ok(Rendered::Page(self.post_html(&post, preview)?)),
            PostPage::Redirect(to) => Ok(Rendered::Redirect(to)),
        }
    }

    pub fn post_html(&self, post: &PostDetail, preview: &Preview) -> Result<String> {
        let path = format!("{}{}", POST_BASE, post.uid);
        let mut context = self.create_base_context(&path, preview);
        context.insert("post", &self.post_view(post));
        context.insert("comments", &self.comments.as_ref().map(|c| c.embed(&path)));

        self.renderer.render("post.html", &context)
    }

    /// Static shell for posts that were not pre-rendered
    ///
    /// Static hosts cannot resolve a post on demand, so the shell shows the
    /// loading state and sends the reader back to the list.
    pub fn fallback_html(&self) -> Result<String> {
        let mut context = self.create_base_context(POST_BASE, &Preview::off());
        context.insert("redirect_to", REDIRECT_TARGET);
        self.renderer.render("loading.html", &context)
    }

    /// Create base context shared by every template
    fn create_base_context(&self, path: &str, preview: &Preview) -> Context {
        let config = &self.app.config;
        let mut context = Context::new();
        context.insert(
            "site",
            &SiteData {
                title: config.title.clone(),
                language: config.language.clone(),
                logo: config.logo.clone(),
            },
        );
        let strings: HashMap<String, String> = self.i18n.get_all_translations();
        context.insert("strings", &strings);
        context.insert("preview", &preview.is_active());
        context.insert("exit_preview_path", EXIT_PREVIEW_PATH);
        context.insert("path", path);
        context.insert("version", env!("CARGO_PKG_VERSION"));
        context
    }

    fn post_card(&self, post: &PostSummary) -> PostCard {
        PostCard {
            href: format!("{}{}", POST_BASE, post.uid),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date: post
                .first_publication_date
                .map(|d| format_date(&d, DATE_FORMAT, self.locale))
                .unwrap_or_default(),
            datetime: post
                .first_publication_date
                .map(|d| date_xml(&d))
                .unwrap_or_default(),
        }
    }

    fn post_view(&self, post: &PostDetail) -> PostView {
        let edited = if post.is_edited() {
            let pattern = self.i18n.get("edited_format");
            post.last_publication_date
                .map(|d| format_date(&d, &pattern, self.locale))
        } else {
            None
        };

        PostView {
            title: post.title.clone(),
            author: post.author.clone(),
            banner_url: post.banner_url.clone(),
            date: post
                .first_publication_date
                .map(|d| format_date(&d, DATE_FORMAT, self.locale)),
            datetime: post.first_publication_date.map(|d| date_xml(&d)),
            edited,
            reading_time: post.reading_time(),
            content: post.content_html(&self.links),
            prev: post.prev_post.as_ref().map(nav_link),
            next: post.next_post.as_ref().map(nav_link),
        }
    }

    /// Abbreviated month names in the site locale, for cards built in the browser
    fn month_names(&self) -> Vec<String> {
        (1..=12)
            .filter_map(|month| Utc.with_ymd_and_hms(2021, month, 1, 0, 0, 0).single())
            .map(|d| format_date(&d, "MMM", self.locale))
            .collect()
    }
}

fn nav_link(post: &NavPost) -> NavLink {
    NavLink {
        title: post.title.clone(),
        href: format!("{}{}", POST_BASE, post.uid),
    }
}
