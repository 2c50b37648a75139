//! File inventory filtering
//!
//! A file survives only if it fails all three exclusions: directory names,
//! path patterns, and binary extensions.

use regex::{Regex, RegexSet};
use tracing::warn;

const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "vendor",
    "target",
    "build",
    "dist",
    "out",
    ".next",
    ".nuxt",
    "coverage",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
    ".dart_tool",
    "Pods",
    ".gradle",
];

const DEFAULT_EXCLUDED_PATTERNS: &[&str] = &[
    r"(^|/)package-lock\.json$",
    r"(^|/)yarn\.lock$",
    r"(^|/)pnpm-lock\.yaml$",
    r"(^|/)Cargo\.lock$",
    r"(^|/)Gemfile\.lock$",
    r"(^|/)composer\.lock$",
    r"(^|/)poetry\.lock$",
    r"(^|/)pubspec\.lock$",
    r"(^|/)go\.sum$",
    r"\.min\.(js|css)$",
    r"\.(g|generated)\.dart$",
    r"\.pb\.(go|rs|py)$",
    r"\.d\.ts$",
    r"(^|/)\.DS_Store$",
];

const DEFAULT_BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "ico", "icns", "svg", "pdf", "zip", "tar", "gz",
    "bz2", "xz", "7z", "jar", "war", "class", "exe", "dll", "so", "dylib", "a", "o", "bin", "dat",
    "db", "sqlite", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "wav", "avi", "mov",
    "webm", "wasm", "pyc", "keystore", "p12", "pem", "lock",
];

/// Three-stage exclusion filter over a raw file inventory
#[derive(Debug, Clone)]
pub struct FileFilter {
    excluded_dirs: Vec<String>,
    patterns: RegexSet,
    binary_extensions: Vec<String>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()),
            DEFAULT_EXCLUDED_PATTERNS.iter().copied(),
            DEFAULT_BINARY_EXTENSIONS.iter().map(|s| s.to_string()),
        )
    }
}

impl FileFilter {
    /// Builds a filter from explicit exclusion lists
    ///
    /// Invalid patterns are dropped rather than failing the whole filter.
    pub fn new<D, P, S, B>(excluded_dirs: D, patterns: P, binary_extensions: B) -> Self
    where
        D: IntoIterator<Item = String>,
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
        B: IntoIterator<Item = String>,
    {
        // Validate each pattern on its own so one bad pattern cannot take
        // the whole set down with it
        let valid: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .filter(|p| match Regex::new(p) {
                Ok(_) => true,
                Err(err) => {
                    warn!(pattern = %p, error = %err, "Dropping invalid exclusion pattern");
                    false
                }
            })
            .collect();
        let set = RegexSet::new(&valid).unwrap_or_else(|_| RegexSet::empty());

        Self {
            excluded_dirs: excluded_dirs.into_iter().collect(),
            patterns: set,
            binary_extensions: binary_extensions
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    /// Whether the path is excluded by any of the three stages
    pub fn is_excluded(&self, path: &str) -> bool {
        let mut segments = path.split('/').peekable();
        while let Some(segment) = segments.next() {
            // Only directory segments count for the directory-name stage
            if segments.peek().is_some() && self.excluded_dirs.iter().any(|d| d == segment) {
                return true;
            }
        }

        if self.patterns.is_match(path) {
            return true;
        }

        if let Some((_, ext)) = path.rsplit_once('.') {
            if self
                .binary_extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(ext))
            {
                return true;
            }
        }

        false
    }

    /// Applies the filter and returns the surviving paths, sorted
    pub fn filter(&self, files: &[String]) -> Vec<String> {
        let mut surviving: Vec<String> = files
            .iter()
            .filter(|f| !self.is_excluded(f))
            .cloned()
            .collect();
        surviving.sort();
        surviving.dedup();
        surviving
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        node_modules = { "node_modules/react/index.js" },
        nested_git = { "lib/.git/config" },
        lockfile = { "package-lock.json" },
        nested_lockfile = { "app/yarn.lock" },
        minified = { "assets/app.min.js" },
        image = { "docs/logo.png" },
        archive = { "release/bundle.tar.gz" },
    )]
    fn excluded(path: &str) {
        assert!(FileFilter::default().is_excluded(path), "{}", path);
    }

    #[parameterized(
        source = { "src/main.rs" },
        root_file = { "README.md" },
        manifest = { "Cargo.toml" },
        dotted_name = { "config.test.ts" },
        dir_named_like_ext = { "png/notes.md" },
    )]
    fn not_excluded(path: &str) {
        assert!(!FileFilter::default().is_excluded(path), "{}", path);
    }

    #[test]
    fn test_file_named_like_excluded_dir_survives() {
        // "vendor" as a file name is fine, only directory segments match
        assert!(!FileFilter::default().is_excluded("vendor"));
        assert!(FileFilter::default().is_excluded("vendor/lib.js"));
    }

    #[test]
    fn test_invalid_pattern_is_dropped_individually() {
        let filter = FileFilter::new(
            vec![],
            DEFAULT_EXCLUDED_PATTERNS
                .iter()
                .copied()
                .chain(std::iter::once("([unclosed")),
            vec![],
        );

        // The remaining patterns keep working
        assert!(filter.is_excluded("package-lock.json"));
        assert!(filter.is_excluded("assets/app.min.js"));
        assert!(!filter.is_excluded("src/main.rs"));
    }

    #[test]
    fn test_filter_sorts_and_dedups() {
        let filter = FileFilter::default();
        let files = vec![
            "src/b.rs".to_string(),
            "a.rs".to_string(),
            "src/b.rs".to_string(),
            "logo.png".to_string(),
        ];

        let surviving = filter.filter(&files);
        assert_eq!(surviving, vec!["a.rs".to_string(), "src/b.rs".to_string()]);
    }
}
