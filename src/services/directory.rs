//! Directory listing for rename candidates.
//!
//! Lists the regular files of a single directory (no recursion), sorted by name, as
//! UTF-8 filenames. Entries whose names are not valid UTF-8 are skipped with a warning,
//! since they cannot be matched or substituted as text.

use anyhow::{Context, Result};
use camino::Utf8Path;

/// List the filenames of the regular files in `dir`.
///
/// Symlinks are followed, so a link to a file is listed and a link to a directory is not.
/// Dotfiles are skipped unless `include_hidden` is set.
///
/// # Errors
///
/// Fails if the directory cannot be read.
pub async fn list_filenames(dir: &Utf8Path, include_hidden: bool) -> Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read directory: {}", dir))?;

    let mut filenames = Vec::new();
    let mut skipped_hidden = 0usize;

    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to read entry in directory: {}", dir))?
    {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                tracing::warn!("Skipping non UTF-8 filename in {}: {:?}", dir, raw);
                continue;
            }
        };

        let is_file = match tokio::fs::metadata(entry.path()).await {
            Ok(metadata) => metadata.is_file(),
            Err(e) => {
                // Dangling symlinks land here
                tracing::debug!("Skipping {} in {}: {}", name, dir, e);
                false
            }
        };
        if !is_file {
            continue;
        }

        if !include_hidden && name.starts_with('.') {
            skipped_hidden += 1;
            continue;
        }

        filenames.push(name);
    }

    filenames.sort();

    tracing::info!(
        "Listed {} files in {} ({} hidden skipped)",
        filenames.len(),
        dir,
        skipped_hidden
    );

    Ok(filenames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::TempDir;

    fn utf8_dir(temp_dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap()
    }

    #[tokio::test]
    async fn test_lists_sorted_files_only() {
        let temp_dir = TempDir::new().unwrap();
        let dir = utf8_dir(&temp_dir);
        fs::write(dir.join("b.jpg"), "").unwrap();
        fs::write(dir.join("a.jpg"), "").unwrap();
        fs::create_dir(dir.join("subdir")).unwrap();

        let names = list_filenames(&dir, false).await.unwrap();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[tokio::test]
    async fn test_hidden_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = utf8_dir(&temp_dir);
        fs::write(dir.join(".hidden"), "").unwrap();
        fs::write(dir.join("shown.txt"), "").unwrap();

        assert_eq!(list_filenames(&dir, false).await.unwrap(), vec!["shown.txt"]);
        assert_eq!(
            list_filenames(&dir, true).await.unwrap(),
            vec![".hidden", "shown.txt"]
        );
    }

    #[tokio::test]
    async fn test_missing_directory_errors() {
        let temp_dir = TempDir::new().unwrap();
        let dir = utf8_dir(&temp_dir).join("does-not-exist");

        assert!(list_filenames(&dir, false).await.is_err());
    }
}
