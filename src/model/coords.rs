//! Repository coordinates and storage key derivation

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Coordinates of the repository under analysis
///
/// The locator is an opaque identifier owned by the caller (a local path, a
/// `host/owner/repo` slug, a clone URL). An optional subpath narrows the
/// analysis to a subtree of the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCoords {
    pub locator: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
}

impl RepoCoords {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            subpath: None,
        }
    }

    pub fn with_subpath(locator: impl Into<String>, subpath: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            subpath: Some(subpath.into()),
        }
    }

    /// Derives a filesystem-safe storage key for these coordinates
    ///
    /// Two different locators must never collide, so the sanitized name is
    /// suffixed with a short digest of the exact coordinates.
    pub fn storage_key(&self) -> String {
        let full = match &self.subpath {
            Some(sub) => format!("{}#{}", self.locator, sub),
            None => self.locator.clone(),
        };

        let mut hasher = Sha256::new();
        hasher.update(full.as_bytes());
        let digest = hex::encode(&hasher.finalize()[..8]);

        let safe: String = self
            .locator
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            })
            .collect();

        // Keep keys short enough for any filesystem
        let safe = if safe.len() > 64 { &safe[safe.len() - 64..] } else { &safe };
        let safe = safe.trim_matches('_');

        if safe.is_empty() {
            digest
        } else {
            format!("{}-{}", safe, digest)
        }
    }
}

impl fmt::Display for RepoCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subpath {
            Some(sub) => write!(f, "{}#{}", self.locator, sub),
            None => write!(f, "{}", self.locator),
        }
    }
}
