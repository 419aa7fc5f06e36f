//! asset-mirror — fetch a page, extract its stylesheets, scripts, images,
//! and fonts, and mirror them into a local directory tree.

pub mod clean;
pub mod config;
pub mod document;
pub mod extract;
pub mod fetch;
pub mod layout;
pub mod metadata;
pub mod mirror;
pub mod pipeline;
pub mod types;

pub use clean::clean;
pub use config::{CategoryPlan, RunConfig, Throttle};
pub use document::{resolve, Document};
pub use extract::extract;
pub use fetch::{FetchConfig, FetchResult, HttpClient};
pub use layout::OutputLayout;
pub use metadata::{read_metadata, write_metadata, RunMetadata};
pub use mirror::{asset_filename, MirrorReport, MirrorWriter};
pub use pipeline::{run, RunSummary};
pub use types::*;
