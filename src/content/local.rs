//! Local-checkout content source
//!
//! Walks a repository checkout on disk with gitignore semantics and detects
//! the technology from well-known marker files.

use async_trait::async_trait;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::source::{ContentError, ContentSource};
use crate::model::TechnologyProfile;

/// Marker files that identify a technology, checked in order
const TECHNOLOGY_MARKERS: &[(&str, &str, &[&str])] = &[
    ("pubspec.yaml", "Flutter", &["ios", "android", "web"]),
    ("Cargo.toml", "Rust", &["linux", "macos", "windows"]),
    ("go.mod", "Go", &["linux", "macos", "windows"]),
    ("package.json", "Node.js", &["web", "server"]),
    ("pyproject.toml", "Python", &["server"]),
    ("requirements.txt", "Python", &["server"]),
    ("pom.xml", "Java (Maven)", &["server", "android"]),
    ("build.gradle", "Java (Gradle)", &["server", "android"]),
    ("Gemfile", "Ruby", &["server", "web"]),
    ("composer.json", "PHP", &["server", "web"]),
];

/// Content source backed by a repository checkout on the local filesystem
pub struct LocalContentSource {
    root: PathBuf,
    max_file_bytes: usize,
}

impl LocalContentSource {
    pub fn new(root: impl Into<PathBuf>, max_file_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_file_bytes,
        }
    }

    fn resolve(&self, subpath: Option<&str>) -> PathBuf {
        match subpath {
            Some(sub) if !sub.is_empty() => self.root.join(sub),
            _ => self.root.clone(),
        }
    }
}

#[async_trait]
impl ContentSource for LocalContentSource {
    async fn list_files(&self, subpath: Option<&str>) -> Result<Vec<String>, ContentError> {
        let base = self.resolve(subpath);

        if !base.exists() {
            return Err(ContentError::NotFound {
                path: base.display().to_string(),
            });
        }
        if !base.is_dir() {
            return Err(ContentError::NotADirectory {
                path: base.display().to_string(),
            });
        }

        let has_git_dir = self.root.join(".git").exists();
        let mut files = Vec::new();

        for result in WalkBuilder::new(&base)
            .hidden(true)
            .git_ignore(has_git_dir)
            .git_global(false)
            .git_exclude(false)
            .build()
        {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "Failed to read directory entry");
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            // Paths stay relative to the repository root even when scoped to
            // a subpath, so read_file resolves them unchanged
            let rel = path.strip_prefix(&self.root).unwrap_or(path);
            files.push(rel.to_string_lossy().replace('\\', "/"));
        }

        files.sort();
        debug!(count = files.len(), base = %base.display(), "Listed repository files");

        Ok(files)
    }

    async fn read_file(&self, path: &str) -> Result<String, ContentError> {
        let full = self.root.join(path);

        let bytes = std::fs::read(&full).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ContentError::NotFound {
                    path: path.to_string(),
                }
            } else {
                ContentError::ReadFailed {
                    path: path.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let mut content = String::from_utf8_lossy(&bytes).into_owned();

        if content.len() > self.max_file_bytes {
            content = truncate_at_boundary(&content, self.max_file_bytes);
            content.push_str("\n… [truncated]");
        }

        Ok(content)
    }

    async fn detect_technology(
        &self,
        subpath: Option<&str>,
    ) -> Result<TechnologyProfile, ContentError> {
        let base = self.resolve(subpath);

        for (marker, technology, platforms) in TECHNOLOGY_MARKERS {
            let candidate = base.join(marker);
            if candidate.is_file() {
                let config_content = std::fs::read_to_string(&candidate).ok().map(|c| {
                    if c.len() > self.max_file_bytes {
                        truncate_at_boundary(&c, self.max_file_bytes)
                    } else {
                        c
                    }
                });

                debug!(marker, technology, "Detected technology profile");

                return Ok(TechnologyProfile {
                    technology: technology.to_string(),
                    platforms: platforms.iter().map(|p| p.to_string()).collect(),
                    config_path: Some(relative_marker_path(subpath, marker)),
                    config_content,
                });
            }
        }

        debug!(base = %base.display(), "No technology marker found");
        Ok(TechnologyProfile::unknown())
    }
}

fn relative_marker_path(subpath: Option<&str>, marker: &str) -> String {
    match subpath {
        Some(sub) if !sub.is_empty() => format!("{}/{}", sub.trim_end_matches('/'), marker),
        _ => marker.to_string(),
    }
}

/// Truncates at a char boundary at or below `limit` bytes
fn truncate_at_boundary(s: &str, limit: usize) -> String {
    let mut end = limit.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

impl std::fmt::Debug for LocalContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalContentSource")
            .field("root", &self.root)
            .field("max_file_bytes", &self.max_file_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        fs::write(
            base.join("Cargo.toml"),
            "[package]\nname = \"widget\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        fs::create_dir_all(base.join("src")).unwrap();
        fs::write(base.join("src/lib.rs"), "pub fn answer() -> u32 { 42 }\n").unwrap();
        fs::write(base.join("README.md"), "# widget\n").unwrap();

        dir
    }

    #[tokio::test]
    async fn test_list_files_relative_and_sorted() {
        let repo = create_test_repo();
        let source = LocalContentSource::new(repo.path(), 65_536);

        let files = source.list_files(None).await.unwrap();

        assert_eq!(
            files,
            vec!["Cargo.toml", "README.md", "src/lib.rs"]
        );
    }

    #[tokio::test]
    async fn test_list_files_scoped_to_subpath_keeps_root_relative_paths() {
        let repo = create_test_repo();
        let source = LocalContentSource::new(repo.path(), 65_536);

        let files = source.list_files(Some("src")).await.unwrap();

        assert_eq!(files, vec!["src/lib.rs"]);
    }

    #[tokio::test]
    async fn test_list_files_missing_path() {
        let repo = create_test_repo();
        let source = LocalContentSource::new(repo.path(), 65_536);

        let result = source.list_files(Some("does-not-exist")).await;
        assert!(matches!(result, Err(ContentError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_read_file_truncates_large_content() {
        let repo = create_test_repo();
        fs::write(repo.path().join("big.txt"), "x".repeat(2048)).unwrap();
        let source = LocalContentSource::new(repo.path(), 1024);

        let content = source.read_file("big.txt").await.unwrap();

        assert!(content.len() < 2048);
        assert!(content.ends_with("[truncated]"));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let repo = create_test_repo();
        let source = LocalContentSource::new(repo.path(), 65_536);

        let result = source.read_file("nope.rs").await;
        assert!(matches!(result, Err(ContentError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_detect_technology_from_marker() {
        let repo = create_test_repo();
        let source = LocalContentSource::new(repo.path(), 65_536);

        let profile = source.detect_technology(None).await.unwrap();

        assert_eq!(profile.technology, "Rust");
        assert_eq!(profile.config_path.as_deref(), Some("Cargo.toml"));
        assert!(profile
            .config_content
            .as_deref()
            .unwrap()
            .contains("widget"));
    }

    #[tokio::test]
    async fn test_detect_technology_unknown() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let source = LocalContentSource::new(dir.path(), 65_536);

        let profile = source.detect_technology(None).await.unwrap();
        assert_eq!(profile.technology, "Unknown");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "héllo wörld";
        let truncated = truncate_at_boundary(s, 2);
        assert!(truncated.len() <= 2);
        assert!(s.starts_with(&truncated));
    }
}
