//! Generate static files

use anyhow::Result;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::generator::{Generator, Rendered};
use crate::pages::static_paths;
use crate::preview::Preview;
use crate::SpaceTraveling;

/// Page served for posts that were not pre-rendered
pub const FALLBACK_PAGE: &str = "post/_fallback.html";

/// Render the list page and the pre-rendered posts into the public directory
pub async fn run(app: &SpaceTraveling) -> Result<()> {
    let start = std::time::Instant::now();
    let generator = Generator::new(app)?;
    let preview = Preview::off();

    fs::create_dir_all(&app.public_dir)?;
    copy_static_assets(&app.static_dir, &app.public_dir)?;

    write_page(&app.public_dir, "index.html", &generator.render_home(&preview).await?)?;

    let uids = static_paths(app.client.as_ref(), &app.config).await?;
    tracing::info!("Pre-rendering {} posts", uids.len());
    for uid in &uids {
        match generator.render_post(uid, &preview).await? {
            Rendered::Page(html) => {
                write_page(&app.public_dir, &format!("post/{}/index.html", uid), &html)?
            }
            Rendered::Redirect(to) => tracing::warn!("Skipping {}: redirects to {}", uid, to),
        }
    }

    write_page(&app.public_dir, FALLBACK_PAGE, &generator.fallback_html()?)?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());
    Ok(())
}

fn write_page(public_dir: &Path, relative: &str, html: &str) -> Result<()> {
    let output_path = public_dir.join(relative);
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_path, html)?;
    tracing::debug!("Generated: {:?}", output_path);
    Ok(())
}

/// Copy static assets (logo, styles, images) into the public directory
fn copy_static_assets(static_dir: &Path, public_dir: &Path) -> Result<()> {
    if !static_dir.exists() {
        return Ok(());
    }

    for entry in WalkDir::new(static_dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(static_dir)?;
        if relative
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'))
        {
            continue;
        }
        let dest = public_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &dest)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::memory::tests::post;
    use crate::cms::MemoryClient;
    use crate::config::SiteConfig;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_generate_writes_pages() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static/logo.svg"), "<svg/>").unwrap();
        fs::write(dir.path().join("static/.hidden"), "x").unwrap();

        let client = MemoryClient::new(vec![
            post("A", "alpha", 1),
            post("B", "beta", 10),
            post("C", "gamma", 20),
        ]);
        let app = SpaceTraveling::with_client(
            dir.path().to_path_buf(),
            SiteConfig::default(),
            Arc::new(client),
        );

        run(&app).await.unwrap();

        let public = &app.public_dir;
        let index = fs::read_to_string(public.join("index.html")).unwrap();
        assert!(index.contains("Title alpha"));
        assert!(public.join("post/alpha/index.html").exists());
        assert!(public.join("post/beta/index.html").exists());
        assert!(!public.join("post/gamma").exists());
        assert!(public.join(FALLBACK_PAGE).exists());
        assert!(public.join("logo.svg").exists());
        assert!(!public.join(".hidden").exists());
    }
}
