//! `metadata.json` sidecar describing one run.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::mirror::MirrorReport;
use crate::types::{AssetCategory, ExtractedAssets, MirrorError, MirrorResult};

/// Timestamp format of `download_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Summary of one run, written once after all downloads finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub source_url: String,
    pub download_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub files: FileListing,
    /// Per-category statistics keyed by directory name (`css`, `js`, ...).
    pub resources: BTreeMap<String, CategoryStats>,
}

/// Fixed file and folder names of the output tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileListing {
    pub html_original: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_clean: Option<String>,
    /// `css_folder: "css/"` and so on, one per mirrored category.
    #[serde(flatten)]
    pub folders: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    /// References found in the page.
    pub found: usize,
    /// References actually attempted (after any cap).
    pub attempted: usize,
    pub downloaded: usize,
    pub failed: usize,
}

impl RunMetadata {
    /// Build the record for a finished run, stamped with the current local time.
    pub fn new(
        source_url: &str,
        page_file: &str,
        reference_file: Option<&str>,
        assets: &ExtractedAssets,
        reports: &[MirrorReport],
    ) -> Self {
        let folders = reports
            .iter()
            .map(|r| {
                let dir = r.category.dir_name();
                (format!("{dir}_folder"), format!("{dir}/"))
            })
            .collect();

        let resources = reports
            .iter()
            .map(|r| {
                (
                    r.category.dir_name().to_string(),
                    CategoryStats {
                        found: assets.count(r.category),
                        attempted: r.attempted(),
                        downloaded: r.success_count(),
                        failed: r.failure_count(),
                    },
                )
            })
            .collect();

        Self {
            source_url: source_url.to_string(),
            download_date: chrono::Local::now().format(DATE_FORMAT).to_string(),
            description: None,
            product_name: None,
            files: FileListing {
                html_original: page_file.to_string(),
                html_clean: reference_file.map(|s| s.to_string()),
                folders,
            },
            resources,
        }
    }

    pub fn stats(&self, category: AssetCategory) -> Option<&CategoryStats> {
        self.resources.get(category.dir_name())
    }
}

/// Serialize `metadata` as pretty JSON at `path`, overwriting any prior file.
pub async fn write_metadata(metadata: &RunMetadata, path: &Path) -> MirrorResult<()> {
    let json = serde_json::to_string_pretty(metadata)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| MirrorError::filesystem(path, e))
}

/// Read a metadata file back.
pub async fn read_metadata(path: &Path) -> MirrorResult<RunMetadata> {
    let data = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MirrorError::filesystem(path, e))?;
    Ok(serde_json::from_str(&data)?)
}
