//! Sequential asset downloader.
//!
//! Each category is mirrored one URL at a time into its own subdirectory,
//! with a [`Throttle`] pause between consecutive requests. A failed asset is
//! logged and recorded; the batch always runs to the end.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::config::Throttle;
use crate::fetch::HttpClient;
use crate::types::{AssetCategory, MirrorError, MirrorResult};

/// An asset written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct MirroredAsset {
    pub url: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// An asset that could not be mirrored.
#[derive(Debug, Clone, Serialize)]
pub struct FailedAsset {
    pub url: String,
    pub error: String,
}

/// Outcome of mirroring one category.
#[derive(Debug, Clone, Serialize)]
pub struct MirrorReport {
    pub category: AssetCategory,
    pub succeeded: Vec<MirroredAsset>,
    pub failed: Vec<FailedAsset>,
}

impl MirrorReport {
    pub fn new(category: AssetCategory) -> Self {
        Self {
            category,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Downloads batches of assets through a shared [`HttpClient`].
pub struct MirrorWriter<'a> {
    client: &'a HttpClient,
}

impl<'a> MirrorWriter<'a> {
    pub fn new(client: &'a HttpClient) -> Self {
        Self { client }
    }

    /// Download every URL of `category` into `dir`, in order.
    pub async fn mirror(
        &self,
        urls: &[String],
        category: AssetCategory,
        dir: &Path,
        throttle: Throttle,
    ) -> MirrorReport {
        let mut report = MirrorReport::new(category);
        info!("Downloading {} {category} files...", urls.len());

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            let err = MirrorError::filesystem(dir, e);
            warn!("{err}");
            report.failed = urls
                .iter()
                .map(|url| FailedAsset {
                    url: url.clone(),
                    error: err.to_string(),
                })
                .collect();
            return report;
        }

        for (i, url) in urls.iter().enumerate() {
            if i > 0 {
                throttle.pause().await;
            }

            let path = dir.join(asset_filename(category, i + 1, url));
            match self.download(url, &path).await {
                Ok(bytes) => {
                    info!("Saved {}", path.display());
                    report.succeeded.push(MirroredAsset {
                        url: url.clone(),
                        path,
                        bytes,
                    });
                }
                Err(e) => {
                    warn!("Error downloading {url}: {e}");
                    report.failed.push(FailedAsset {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "{category}: {} of {} downloaded",
            report.success_count(),
            urls.len()
        );
        report
    }

    async fn download(&self, url: &str, path: &Path) -> MirrorResult<u64> {
        let resp = self.client.get(url).await?;
        tokio::fs::write(path, &resp.body)
            .await
            .map_err(|e| MirrorError::filesystem(path, e))?;
        Ok(resp.body.len() as u64)
    }
}

/// Local filename for the `index`-th (1-based) asset of a category.
///
/// Stylesheets and scripts get a fixed extension, plus the original file
/// name when the URL path hides a query string behind an encoded `?`.
/// Images and fonts keep the extension of the last path segment.
pub fn asset_filename(category: AssetCategory, index: usize, url: &str) -> String {
    let stem = format!("{}_{}", category.file_stem(), index);
    let path = url_path(url);
    let segment = path.rsplit('/').next().unwrap_or("");

    match category {
        AssetCategory::Stylesheet | AssetCategory::Script => {
            let ext = if category == AssetCategory::Stylesheet {
                "css"
            } else {
                "js"
            };
            match encoded_query_name(&path, segment, ext) {
                Some(name) => format!("{stem}_{name}.{ext}"),
                None => format!("{stem}.{ext}"),
            }
        }
        AssetCategory::Image | AssetCategory::Font => {
            let fallback = if category == AssetCategory::Image {
                "jpg"
            } else {
                "woff2"
            };
            let ext = segment_extension(segment).unwrap_or(fallback);
            format!("{stem}.{ext}")
        }
    }
}

fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(u) => u.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or("").to_string(),
    }
}

fn encoded_query_name(path: &str, segment: &str, ext: &str) -> Option<String> {
    if !path.to_ascii_lowercase().contains("%3f") {
        return None;
    }
    let cut = segment.to_ascii_lowercase().find("%3f").unwrap_or(segment.len());
    let name = &segment[..cut];
    let suffix = format!(".{ext}");
    let name = if name.to_ascii_lowercase().ends_with(&suffix) {
        &name[..name.len() - suffix.len()]
    } else {
        name
    };

    let name: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn segment_extension(segment: &str) -> Option<&str> {
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}
