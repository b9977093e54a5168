//! HTTP server rendering pages on demand
//!
//! Published pages are served from the revalidation cache and regenerated
//! once stale; requests carrying a preview cookie always render fresh
//! against the previewed ref.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::PageCache;
use crate::cms::CmsError;
use crate::generator::{Generator, Rendered, CURSOR_ENDPOINT, POST_BASE};
use crate::pages::static_paths;
use crate::preview::{self, Preview, EXIT_PREVIEW_PATH};
use crate::SpaceTraveling;

/// Server state
pub struct ServerState {
    generator: Generator,
    cache: PageCache,
}

impl ServerState {
    pub fn new(app: &SpaceTraveling) -> Result<Self> {
        Ok(Self {
            generator: Generator::new(app)?,
            cache: PageCache::from_secs(app.config.revalidate),
        })
    }

    fn app(&self) -> &SpaceTraveling {
        self.generator.app()
    }

    /// Render the list page and the static paths ahead of the first request
    pub async fn warm(&self) -> Result<()> {
        let preview = Preview::off();
        self.cache
            .insert("/", self.generator.render_home(&preview).await?)
            .await;

        let app = self.app();
        for uid in static_paths(app.client.as_ref(), &app.config).await? {
            if let Rendered::Page(html) = self.generator.render_post(&uid, &preview).await? {
                self.cache.insert(&post_path(&uid), html).await;
            }
        }
        tracing::info!("Pre-rendered {} pages", self.cache.len().await);
        Ok(())
    }
}

/// Build the router over shared state
pub fn router(state: Arc<ServerState>) -> Router {
    let public_dir = state.app().public_dir.clone();
    Router::new()
        .route("/", get(home_handler))
        .route("/post/:slug", get(post_handler))
        .route("/api/preview", get(preview_handler))
        .route(EXIT_PREVIEW_PATH, get(exit_preview_handler))
        .route(CURSOR_ENDPOINT, get(posts_handler))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(app: &SpaceTraveling, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(ServerState::new(app)?);
    if let Err(e) = state.warm().await {
        tracing::warn!("Failed to pre-render pages: {}", e);
    }

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn post_path(uid: &str) -> String {
    format!("{}{}", POST_BASE, uid)
}

fn server_error(e: anyhow::Error) -> Response {
    tracing::error!("Render failed: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

async fn home_handler(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let preview = Preview::from_headers(&headers);
    if !preview.is_active() {
        if let Some(html) = state.cache.get("/").await {
            return Html(html).into_response();
        }
    }

    match state.generator.render_home(&preview).await {
        Ok(html) => {
            if !preview.is_active() {
                state.cache.insert("/", html.clone()).await;
            }
            Html(html).into_response()
        }
        Err(e) => server_error(e),
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Response {
    let preview = Preview::from_headers(&headers);
    let path = post_path(&slug);
    if !preview.is_active() {
        if let Some(html) = state.cache.get(&path).await {
            return Html(html).into_response();
        }
    }

    match state.generator.render_post(&slug, &preview).await {
        Ok(Rendered::Page(html)) => {
            if !preview.is_active() {
                state.cache.insert(&path, html.clone()).await;
            }
            Html(html).into_response()
        }
        Ok(Rendered::Redirect(to)) => {
            state.cache.invalidate(&path).await;
            Redirect::temporary(&to).into_response()
        }
        Err(e) => server_error(e),
    }
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// Start a preview session and send the editor to the previewed document
async fn preview_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<PreviewParams>,
) -> Response {
    let Some(reference) = params.token.filter(|t| !t.is_empty()) else {
        return (StatusCode::UNAUTHORIZED, "Invalid token").into_response();
    };

    let app = state.app();
    let location = preview::resolve_location(
        app.client.as_ref(),
        &app.config,
        &reference,
        params.document_id.as_deref(),
    )
    .await;
    tracing::info!("Preview session started, redirecting to {}", location);

    (
        [(header::SET_COOKIE, preview::start_cookie(&reference))],
        Redirect::temporary(&location),
    )
        .into_response()
}

/// End the preview session and return to the list
async fn exit_preview_handler() -> Response {
    (
        [(header::SET_COOKIE, preview::exit_cookie())],
        Redirect::temporary("/"),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct CursorParams {
    cursor: String,
}

/// Follow a pagination cursor for the list page script
async fn posts_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<CursorParams>,
) -> Response {
    match state.app().client.fetch_page(&params.cursor).await {
        Ok(response) => Json(response).into_response(),
        Err(e @ CmsError::InvalidCursor(_)) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch page: {}", e);
            (StatusCode::BAD_GATEWAY, "Repository error").into_response()
        }
    }
}
