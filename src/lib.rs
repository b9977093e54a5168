//! spacetraveling: a blog front-end over a headless content repository
//!
//! Posts are fetched from a Prismic-style repository (or a local fixtures
//! file) and rendered with embedded Tera templates, either ahead of time into
//! a public directory or on demand by the built-in server.

pub mod cache;
pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod pages;
pub mod preview;
pub mod richtext;
pub mod server;
pub mod templates;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cms::{ContentClient, MemoryClient, PrismicClient};

/// The main application
#[derive(Clone)]
pub struct SpaceTraveling {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets copied into the output
    pub static_dir: PathBuf,
    /// Content repository
    pub client: Arc<dyn ContentClient>,
}

impl SpaceTraveling {
    /// Create a new instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config = Self::load_config(&base_dir)?;
        let client = Self::connect(&base_dir, &config)?;
        Ok(Self::with_client(base_dir, config, client))
    }

    /// Read `_config.yml` from `base_dir`, defaults when absent
    pub fn load_config(base_dir: &Path) -> Result<config::SiteConfig> {
        let config_path = base_dir.join("_config.yml");
        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Create an instance over an existing repository client
    pub fn with_client(
        base_dir: PathBuf,
        config: config::SiteConfig,
        client: Arc<dyn ContentClient>,
    ) -> Self {
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);
        Self {
            config,
            base_dir,
            public_dir,
            static_dir,
            client,
        }
    }

    /// Pick the repository: fixtures when configured, the remote API otherwise
    fn connect(base_dir: &Path, config: &config::SiteConfig) -> Result<Arc<dyn ContentClient>> {
        if let Some(fixtures) = &config.fixtures {
            let path = base_dir.join(fixtures);
            tracing::info!("Reading posts from {:?}", path);
            return Ok(Arc::new(MemoryClient::from_file(&path)?));
        }
        if config.api_endpoint.is_empty() {
            bail!("No content source: set `api_endpoint` or `fixtures` in _config.yml");
        }
        tracing::debug!("Using repository at {}", config.api_endpoint);
        Ok(Arc::new(PrismicClient::new(
            &config.api_endpoint,
            config.access_token.clone(),
        )))
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(&self.public_dir)
    }
}
