//! Output directory layout for one run.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::types::{AssetCategory, MirrorError, MirrorResult};

/// Name of the metadata sidecar under the output root.
pub const METADATA_FILE: &str = "metadata.json";

/// `{root}/{css,js,images,fonts}` plus top-level files.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Create the root and one subdirectory per category.
    ///
    /// Idempotent: existing directories and their files are kept as they are.
    pub async fn create(
        root: impl Into<PathBuf>,
        categories: &[AssetCategory],
    ) -> MirrorResult<Self> {
        let root = root.into();
        if fs::metadata(&root).await.is_ok_and(|m| m.is_dir()) {
            info!("Output directory already exists: {}", root.display());
        } else {
            fs::create_dir_all(&root)
                .await
                .map_err(|e| MirrorError::filesystem(&root, e))?;
            info!("Created output directory: {}", root.display());
        }

        let layout = Self { root };
        for &category in categories {
            let dir = layout.category_dir(category);
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| MirrorError::filesystem(&dir, e))?;
        }
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: AssetCategory) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Path of a top-level file such as `index.html`.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.file(METADATA_FILE)
    }

    /// Write a top-level file, replacing any previous content.
    pub async fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> MirrorResult<PathBuf> {
        let path = self.file(name);
        fs::write(&path, contents)
            .await
            .map_err(|e| MirrorError::filesystem(&path, e))?;
        Ok(path)
    }
}
