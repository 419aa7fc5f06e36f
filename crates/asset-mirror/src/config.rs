//! Run configuration: what to fetch, where to write it, and how fast.

use std::path::PathBuf;
use std::time::Duration;

use crate::types::AssetCategory;

/// Landing page mirrored by the `site` profile.
pub const DEFAULT_SITE_URL: &str = "https://www.lovelydenim.com.ar/menorca-stories";

/// Product page snapshotted by the `product` profile.
pub const DEFAULT_PRODUCT_URL: &str =
    "https://www.lovelydenim.com.ar/camisa-larga-spotlight/p?skuId=1008283";

pub const DEFAULT_SITE_DIR: &str = "lovelydenim-reference";
pub const DEFAULT_PRODUCT_DIR: &str = "lovelydenim-product-detail-reference";

/// Images attempted by the `site` profile before the cap kicks in.
pub const DEFAULT_SITE_IMAGE_LIMIT: usize = 20;

/// Fixed pause between consecutive requests of one category.
///
/// A delay of `d` caps the request rate at `1 / d` requests per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    pub delay: Duration,
}

impl Throttle {
    /// No pause at all.
    pub const NONE: Throttle = Throttle {
        delay: Duration::ZERO,
    };

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Throttle that keeps the rate at or below `rps` requests per second.
    ///
    /// Non-positive or non-finite rates mean unthrottled.
    pub fn from_requests_per_second(rps: f64) -> Self {
        if !rps.is_finite() || rps <= 0.0 {
            return Self::NONE;
        }
        Self::new(Duration::from_secs_f64(1.0 / rps))
    }

    /// Request-rate ceiling, or `None` when unthrottled.
    pub fn requests_per_second(&self) -> Option<f64> {
        if self.delay.is_zero() {
            None
        } else {
            Some(1.0 / self.delay.as_secs_f64())
        }
    }

    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// How one asset category is mirrored.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPlan {
    pub category: AssetCategory,
    pub throttle: Throttle,
    /// Maximum number of URLs attempted; `None` means all.
    pub limit: Option<usize>,
}

impl CategoryPlan {
    pub fn new(category: AssetCategory, throttle: Throttle) -> Self {
        Self {
            category,
            throttle,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Truncate `urls` to this plan's limit.
    pub fn apply_limit<'u>(&self, urls: &'u [String]) -> &'u [String] {
        match self.limit {
            Some(limit) if limit < urls.len() => &urls[..limit],
            _ => urls,
        }
    }
}

/// Everything needed for one run of the pipeline.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target_url: String,
    /// URL relative references are resolved against; the target when `None`.
    pub base_url: Option<String>,
    pub output_dir: PathBuf,
    /// Name of the raw page copy under the output root.
    pub page_file: String,
    /// Name of the script-free reference copy, if one is written.
    pub reference_file: Option<String>,
    pub description: Option<String>,
    pub product_name: Option<String>,
    pub plans: Vec<CategoryPlan>,
}

impl RunConfig {
    /// Full mirror of a landing page: every category, images capped at 20.
    ///
    /// References resolve against the site origin.
    pub fn site(target_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        let target_url = target_url.into();
        let base_url = url::Url::parse(&target_url)
            .ok()
            .and_then(|u| u.join("/").ok())
            .map(String::from);
        let throttle = Throttle::from_millis(500);

        Self {
            target_url,
            base_url,
            output_dir: output_dir.into(),
            page_file: "index.html".to_string(),
            reference_file: None,
            description: None,
            product_name: None,
            plans: vec![
                CategoryPlan::new(AssetCategory::Stylesheet, throttle),
                CategoryPlan::new(AssetCategory::Script, throttle),
                CategoryPlan::new(AssetCategory::Image, throttle)
                    .with_limit(Some(DEFAULT_SITE_IMAGE_LIMIT)),
                CategoryPlan::new(AssetCategory::Font, throttle),
            ],
        }
    }

    /// Product-detail snapshot: raw page, script-free reference copy,
    /// stylesheets, scripts, and all images.
    pub fn product(target_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_url: target_url.into(),
            base_url: None,
            output_dir: output_dir.into(),
            page_file: "lovelydenim-product-detail.html".to_string(),
            reference_file: Some("product-detail-reference.html".to_string()),
            description: Some("Referencia de página de detalle de producto Lovely Denim".to_string()),
            product_name: Some("Camisa Larga Spotlight".to_string()),
            plans: vec![
                CategoryPlan::new(AssetCategory::Stylesheet, Throttle::from_millis(500)),
                CategoryPlan::new(AssetCategory::Script, Throttle::from_millis(500)),
                CategoryPlan::new(AssetCategory::Image, Throttle::from_millis(300)),
            ],
        }
    }

    /// Base URL used for resolution.
    pub fn base(&self) -> &str {
        self.base_url.as_deref().unwrap_or(&self.target_url)
    }

    /// Categories this run mirrors, in order.
    pub fn categories(&self) -> Vec<AssetCategory> {
        self.plans.iter().map(|p| p.category).collect()
    }

    /// Replace every plan's throttle.
    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        for plan in &mut self.plans {
            plan.throttle = throttle;
        }
        self
    }

    /// Set the cap on image downloads.
    pub fn with_image_limit(mut self, limit: Option<usize>) -> Self {
        for plan in &mut self.plans {
            if plan.category == AssetCategory::Image {
                plan.limit = limit;
            }
        }
        self
    }
}
