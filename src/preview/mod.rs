//! Preview mode
//!
//! An editorial session is carried by the `io.prismic.preview` cookie, whose
//! value is the ref of the release being previewed. The flag derived from it
//! decides whether the publication date is shown and whether the exit link
//! is rendered; the ref is passed on to detail queries.

use axum::http::{header, HeaderMap};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

use crate::cms::{ContentClient, QueryOptions};
use crate::config::SiteConfig;

/// Cookie holding the preview ref
pub const PREVIEW_COOKIE: &str = "io.prismic.preview";

/// Route that ends a preview session
pub const EXIT_PREVIEW_PATH: &str = "/api/exit-preview";

/// Preview state of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    reference: Option<String>,
}

impl Preview {
    /// Not previewing
    pub fn off() -> Self {
        Self::default()
    }

    /// Previewing the release identified by `reference`
    pub fn with_ref(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
        }
    }

    /// Read the preview cookie from a `Cookie` header value
    pub fn from_cookie_header(cookies: &str) -> Self {
        let reference = cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == PREVIEW_COOKIE)
            .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().into_owned())
            .filter(|value| !value.is_empty());
        Self { reference }
    }

    /// Read the preview cookie from request headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(Self::from_cookie_header)
            .find(Preview::is_active)
            .unwrap_or_default()
    }

    /// The boolean flag threaded into the pages
    pub fn is_active(&self) -> bool {
        self.reference.is_some()
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

/// `Set-Cookie` value starting a preview session
pub fn start_cookie(reference: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        PREVIEW_COOKIE,
        utf8_percent_encode(reference, NON_ALPHANUMERIC)
    )
}

/// `Set-Cookie` value ending a preview session
pub fn exit_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", PREVIEW_COOKIE)
}

/// Where to send the editor once a preview session starts
///
/// The previewed document's page when it resolves to a post, `/` otherwise.
pub async fn resolve_location(
    client: &dyn ContentClient,
    config: &SiteConfig,
    reference: &str,
    document_id: Option<&str>,
) -> String {
    let Some(id) = document_id else {
        return "/".to_string();
    };
    let options = QueryOptions::new().reference(Some(reference.to_string()));
    match client.get_by_id(id, &options).await {
        Ok(Some(doc)) if doc.doc_type == config.document_type => match doc.uid {
            Some(uid) => format!("/post/{}", uid),
            None => "/".to_string(),
        },
        Ok(_) => "/".to_string(),
        Err(e) => {
            tracing::warn!("Failed to resolve preview document {}: {}", id, e);
            "/".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::memory::tests::post;
    use crate::cms::MemoryClient;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_round_trip() {
        let cookie = start_cookie("https://blog.prismic.io/previews/abc?websitePreviewId=1");
        let value = cookie
            .split(';')
            .next()
            .unwrap()
            .to_string();
        let preview = Preview::from_cookie_header(&format!("theme=dark; {}", value));
        assert!(preview.is_active());
        assert_eq!(
            preview.reference(),
            Some("https://blog.prismic.io/previews/abc?websitePreviewId=1")
        );
    }

    #[test]
    fn test_no_cookie_means_off() {
        assert!(!Preview::from_cookie_header("theme=dark").is_active());
        assert!(!Preview::from_cookie_header("io.prismic.preview=").is_active());
        assert!(!Preview::from_headers(&HeaderMap::new()).is_active());
    }

    #[test]
    fn test_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("io.prismic.preview=release%2D1"),
        );
        assert_eq!(Preview::from_headers(&headers), Preview::with_ref("release-1"));
    }

    #[test]
    fn test_exit_cookie_expires() {
        assert!(exit_cookie().contains("Max-Age=0"));
        assert!(exit_cookie().starts_with("io.prismic.preview=;"));
    }

    #[tokio::test]
    async fn test_resolve_location() {
        let client = MemoryClient::new(vec![post("A", "alpha", 1)]);
        let config = SiteConfig::default();
        assert_eq!(
            resolve_location(&client, &config, "ref", Some("A")).await,
            "/post/alpha"
        );
        assert_eq!(resolve_location(&client, &config, "ref", Some("Z")).await, "/");
        assert_eq!(resolve_location(&client, &config, "ref", None).await, "/");
    }
}
