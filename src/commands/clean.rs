//! Clean the public directory

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Remove the generated site
pub fn run(public_dir: &Path) -> Result<()> {
    if public_dir.exists() {
        fs::remove_dir_all(public_dir)?;
        tracing::info!("Deleted: {:?}", public_dir);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_public_dir() {
        let dir = tempfile::tempdir().unwrap();
        let public_dir = dir.path().join("public");
        fs::create_dir_all(public_dir.join("post")).unwrap();
        fs::write(public_dir.join("index.html"), "x").unwrap();

        run(&public_dir).unwrap();
        assert!(!public_dir.exists());
        // Nothing to remove is fine
        run(&public_dir).unwrap();
    }
}
