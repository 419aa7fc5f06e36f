//! Core data types shared by the fetch, extract, and mirror stages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The kind of asset a page links to.
///
/// Declaration order is the order categories are mirrored and reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Stylesheet,
    Script,
    Image,
    Font,
}

impl AssetCategory {
    /// All categories in mirroring order.
    pub const ALL: [AssetCategory; 4] = [
        AssetCategory::Stylesheet,
        AssetCategory::Script,
        AssetCategory::Image,
        AssetCategory::Font,
    ];

    /// Name of the subdirectory under the output root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Stylesheet => "css",
            Self::Script => "js",
            Self::Image => "images",
            Self::Font => "fonts",
        }
    }

    /// Singular stem used for generated filenames (`style_1.css`).
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Stylesheet => "style",
            Self::Script => "script",
            Self::Image => "image",
            Self::Font => "font",
        }
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stylesheet => write!(f, "CSS"),
            Self::Script => write!(f, "JavaScript"),
            Self::Image => write!(f, "images"),
            Self::Font => write!(f, "fonts"),
        }
    }
}

/// One externally referenced resource found in a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    pub category: AssetCategory,
    /// Absolute URL of the asset.
    pub url: String,
}

/// All asset references of one page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedAssets {
    pub references: Vec<AssetReference>,
}

impl ExtractedAssets {
    /// URLs of a single category, in document order.
    pub fn urls(&self, category: AssetCategory) -> Vec<String> {
        self.references
            .iter()
            .filter(|r| r.category == category)
            .map(|r| r.url.clone())
            .collect()
    }

    /// Number of references in a category.
    pub fn count(&self, category: AssetCategory) -> usize {
        self.references
            .iter()
            .filter(|r| r.category == category)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }
}

/// Errors that can occur while mirroring a page.
#[derive(thiserror::Error, Debug)]
pub enum MirrorError {
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("HTML rewrite error: {0}")]
    Rewrite(String),

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MirrorError {
    /// Wrap an IO error with the path it happened on.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MirrorError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type.
pub type MirrorResult<T> = Result<T, MirrorError>;
