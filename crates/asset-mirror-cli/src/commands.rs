//! `asset-mirror site` / `asset-mirror product`.

use std::time::Duration;

use anyhow::{Context, Result};

use asset_mirror::{FetchConfig, HttpClient, RunConfig, RunSummary, Throttle};

/// Which preset a run starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Site,
    Product,
}

/// Parsed command-line options for one run.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub profile: Profile,
    pub url: String,
    pub output: String,
    pub delay_ms: Option<u64>,
    /// `Some(0)` removes the cap.
    pub image_limit: Option<usize>,
    pub timeout_secs: u64,
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Interrupted,
}

/// Turn command-line options into a run configuration.
pub fn build_config(args: &RunArgs) -> RunConfig {
    let mut config = match args.profile {
        Profile::Site => RunConfig::site(&args.url, &args.output),
        Profile::Product => RunConfig::product(&args.url, &args.output),
    };
    if let Some(ms) = args.delay_ms {
        config = config.with_throttle(Throttle::from_millis(ms));
    }
    if let Some(limit) = args.image_limit {
        config = config.with_image_limit((limit > 0).then_some(limit));
    }
    config
}

/// Run the pipeline, racing it against Ctrl-C.
pub async fn run(args: RunArgs, json: bool) -> Result<Outcome> {
    let config = build_config(&args);
    tracing::debug!(?config, "Run configuration");
    let fetch = FetchConfig::default().with_timeout(Duration::from_secs(args.timeout_secs));
    let client = HttpClient::new(&fetch).context("failed to build HTTP client")?;

    if !json {
        println!("Mirroring {}", config.target_url);
        println!("{}", "=".repeat(70));
    }

    let summary = tokio::select! {
        result = asset_mirror::run(&config, &client) => {
            result.with_context(|| format!("download of {} failed", config.target_url))?
        }
        _ = tokio::signal::ctrl_c() => return Ok(Outcome::Interrupted),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(Outcome::Completed)
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "=".repeat(70));
    println!("Download completed");
    println!("Output directory: {}", summary.output_dir.display());
    println!("  - {}", summary.page_path.display());
    if let Some(path) = &summary.reference_path {
        println!("  - {}", path.display());
    }
    println!("  - {}", summary.metadata_path.display());
    for report in &summary.reports {
        println!(
            "  {:<11} {} downloaded, {} failed",
            report.category.dir_name(),
            report.success_count(),
            report.failure_count()
        );
        for failed in &report.failed {
            println!("      {} ({})", failed.url, failed.error);
        }
    }
    println!("{}", "=".repeat(70));
}
