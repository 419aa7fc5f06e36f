//! One run: fetch → save → clean → extract → mirror → record.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::clean::clean;
use crate::config::RunConfig;
use crate::document::parse_base;
use crate::extract::extract;
use crate::fetch::HttpClient;
use crate::layout::OutputLayout;
use crate::metadata::{write_metadata, RunMetadata};
use crate::mirror::{MirrorReport, MirrorWriter};
use crate::types::{AssetCategory, MirrorResult};

/// Where a finished run put its files.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub source_url: String,
    pub output_dir: PathBuf,
    pub page_path: PathBuf,
    pub reference_path: Option<PathBuf>,
    pub metadata_path: PathBuf,
    pub reports: Vec<MirrorReport>,
}

impl RunSummary {
    pub fn report(&self, category: AssetCategory) -> Option<&MirrorReport> {
        self.reports.iter().find(|r| r.category == category)
    }

    pub fn total_downloaded(&self) -> usize {
        self.reports.iter().map(|r| r.success_count()).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.reports.iter().map(|r| r.failure_count()).sum()
    }
}

/// Execute one run.
///
/// Failing to fetch the page or to write the page, reference copy, or
/// metadata aborts the run. Individual asset failures never do; they are
/// collected in the returned reports.
pub async fn run(config: &RunConfig, client: &HttpClient) -> MirrorResult<RunSummary> {
    let base = parse_base(config.base())?;
    let layout = OutputLayout::create(&config.output_dir, &config.categories()).await?;

    info!("Downloading main page: {}", config.target_url);
    let page = client.get(&config.target_url).await?;
    let html = page.text();
    info!(
        "Page downloaded ({} bytes, {})",
        page.body.len(),
        page.content_type.as_deref().unwrap_or("no content type")
    );

    // The page copy keeps the bytes as served; parsing works on the decoded text.
    let page_path = layout.write(&config.page_file, &page.body).await?;
    info!("HTML saved: {}", page_path.display());

    let reference_path = match &config.reference_file {
        Some(name) => {
            let cleaned = clean(&html, &base)?;
            let path = layout.write(name, cleaned).await?;
            info!("Reference HTML saved: {}", path.display());
            Some(path)
        }
        None => None,
    };

    let assets = extract(&html, &base);
    for category in config.categories() {
        info!("  - {category}: {} found", assets.count(category));
    }

    let writer = MirrorWriter::new(client);
    let mut reports = Vec::with_capacity(config.plans.len());
    for plan in &config.plans {
        let urls = assets.urls(plan.category);
        let batch = plan.apply_limit(&urls);
        let dir = layout.category_dir(plan.category);
        reports.push(
            writer
                .mirror(batch, plan.category, &dir, plan.throttle)
                .await,
        );
    }

    let mut metadata = RunMetadata::new(
        &config.target_url,
        &config.page_file,
        config.reference_file.as_deref(),
        &assets,
        &reports,
    );
    metadata.description = config.description.clone();
    metadata.product_name = config.product_name.clone();

    let metadata_path = layout.metadata_path();
    write_metadata(&metadata, &metadata_path).await?;
    info!("Metadata saved: {}", metadata_path.display());

    Ok(RunSummary {
        source_url: config.target_url.clone(),
        output_dir: layout.root().to_path_buf(),
        page_path,
        reference_path,
        metadata_path,
        reports,
    })
}
