//! Scriptable content source for tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::source::{ContentError, ContentSource};
use crate::model::TechnologyProfile;

/// In-memory content source with scripted listings, contents, and failures
pub struct MockContentSource {
    files: Mutex<Vec<String>>,
    contents: Mutex<HashMap<String, String>>,
    failing_paths: Mutex<HashSet<String>>,
    technology: Mutex<TechnologyProfile>,
}

impl MockContentSource {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(Vec::new()),
            contents: Mutex::new(HashMap::new()),
            failing_paths: Mutex::new(HashSet::new()),
            technology: Mutex::new(TechnologyProfile::unknown()),
        }
    }

    /// Adds a file to the listing with the given content
    pub fn add_file(&self, path: impl Into<String>, content: impl Into<String>) {
        let path = path.into();
        self.files.lock().unwrap().push(path.clone());
        self.contents.lock().unwrap().insert(path, content.into());
    }

    pub fn add_files(&self, files: impl IntoIterator<Item = (&'static str, &'static str)>) {
        for (path, content) in files {
            self.add_file(path, content);
        }
    }

    /// Makes `read_file` fail for the given path while it stays listed
    pub fn fail_read(&self, path: impl Into<String>) {
        self.failing_paths.lock().unwrap().insert(path.into());
    }

    pub fn set_technology(&self, profile: TechnologyProfile) {
        *self.technology.lock().unwrap() = profile;
    }
}

impl Default for MockContentSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentSource for MockContentSource {
    async fn list_files(&self, _subpath: Option<&str>) -> Result<Vec<String>, ContentError> {
        Ok(self.files.lock().unwrap().clone())
    }

    async fn read_file(&self, path: &str) -> Result<String, ContentError> {
        if self.failing_paths.lock().unwrap().contains(path) {
            return Err(ContentError::ReadFailed {
                path: path.to_string(),
                message: "simulated fetch failure".to_string(),
            });
        }

        self.contents
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                path: path.to_string(),
            })
    }

    async fn detect_technology(
        &self,
        _subpath: Option<&str>,
    ) -> Result<TechnologyProfile, ContentError> {
        Ok(self.technology.lock().unwrap().clone())
    }
}

impl std::fmt::Debug for MockContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockContentSource")
            .field("files", &self.files.lock().unwrap().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_lists_and_reads() {
        let source = MockContentSource::new();
        source.add_file("a.rs", "fn a() {}");
        source.add_file("src/b.rs", "fn b() {}");

        let files = source.list_files(None).await.unwrap();
        assert_eq!(files.len(), 2);

        let content = source.read_file("src/b.rs").await.unwrap();
        assert_eq!(content, "fn b() {}");
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let source = MockContentSource::new();
        source.add_file("a.rs", "fn a() {}");
        source.fail_read("a.rs");

        let result = source.read_file("a.rs").await;
        assert!(matches!(result, Err(ContentError::ReadFailed { .. })));
    }

    #[tokio::test]
    async fn test_mock_unknown_file() {
        let source = MockContentSource::new();
        let result = source.read_file("nope.rs").await;
        assert!(matches!(result, Err(ContentError::NotFound { .. })));
    }
}
