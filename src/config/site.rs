//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable that overrides `access_token`
pub const ACCESS_TOKEN_ENV: &str = "SPACETRAVELING_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub logo: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Content repository
    pub api_endpoint: String,
    pub access_token: Option<String>,
    /// JSON file of documents served instead of the remote repository
    pub fixtures: Option<String>,
    pub document_type: String,

    // Pages
    pub page_size: usize,
    pub static_paths: usize,
    pub revalidate: u64,

    // Comments
    #[serde(default)]
    pub comments: CommentsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "SpaceTraveling".to_string(),
            language: "pt-BR".to_string(),
            logo: "/logo.svg".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            api_endpoint: String::new(),
            access_token: None,
            fixtures: None,
            document_type: "posts".to_string(),

            page_size: 2,
            static_paths: 2,
            revalidate: 60,

            comments: CommentsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                self.access_token = Some(token);
            }
        }
    }
}

/// Comment widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// Repository hosting the discussion threads; empty disables the widget
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
    pub label: Option<String>,
    pub script: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
            label: None,
            script: "https://utteranc.es/client.js".to_string(),
        }
    }
}

impl CommentsConfig {
    pub fn enabled(&self) -> bool {
        !self.repo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "SpaceTraveling");
        assert_eq!(config.page_size, 2);
        assert_eq!(config.revalidate, 60);
        assert!(!config.comments.enabled());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
api_endpoint: https://spacetraveling.cdn.prismic.io/api/v2
page_size: 5
comments:
  repo: someone/blog-comments
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(
            config.api_endpoint,
            "https://spacetraveling.cdn.prismic.io/api/v2"
        );
        assert_eq!(config.page_size, 5);
        assert_eq!(config.static_paths, 2);
        assert!(config.comments.enabled());
        assert_eq!(config.comments.issue_term, "pathname");
        assert_eq!(config.comments.theme, "github-dark");
    }
}
