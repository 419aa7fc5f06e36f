//! Discover the assets a page links to.
//!
//! Stylesheets, scripts, images, and preloaded fonts are collected in
//! document order per category and resolved to absolute URLs.

use scraper::Selector;
use tracing::debug;
use url::Url;

use crate::document::{resolve, Document};
use crate::types::{AssetCategory, AssetReference, ExtractedAssets};

/// File extensions that mark a preload/prefetch link as a font.
pub const FONT_EXTENSIONS: [&str; 4] = [".woff", ".woff2", ".ttf", ".otf"];

/// Extract every asset reference from `html`, resolved against `base`.
pub fn extract(html: &str, base: &Url) -> ExtractedAssets {
    let document = Document::parse(html);
    let mut references = Vec::new();

    let stylesheets = selector(r#"link[rel~="stylesheet"]"#);
    let scripts = selector("script[src]");
    let images = selector("img[src]");
    let preloads = selector(r#"link[rel~="preload"], link[rel~="prefetch"]"#);

    collect(&document, &stylesheets, "href", AssetCategory::Stylesheet, base, &mut references);
    collect(&document, &scripts, "src", AssetCategory::Script, base, &mut references);
    collect(&document, &images, "src", AssetCategory::Image, base, &mut references);

    for href in document.attribute_values(&preloads, "href") {
        match resolve(href, base) {
            Some(url) if is_font_url(&url) => references.push(AssetReference {
                category: AssetCategory::Font,
                url,
            }),
            Some(_) => {}
            None => debug!("Skipping unresolvable preload href {href:?}"),
        }
    }

    ExtractedAssets { references }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("hardcoded selector is valid")
}

fn collect(
    document: &Document,
    selector: &Selector,
    attr: &str,
    category: AssetCategory,
    base: &Url,
    out: &mut Vec<AssetReference>,
) {
    for value in document.attribute_values(selector, attr) {
        match resolve(value, base) {
            Some(url) => out.push(AssetReference { category, url }),
            None => debug!("Skipping unresolvable {category} reference {value:?}"),
        }
    }
}

/// True when the URL's path ends with a font extension (case-insensitive).
pub fn is_font_url(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(u) => u.path().to_ascii_lowercase(),
        Err(_) => url.split(['?', '#']).next().unwrap_or("").to_ascii_lowercase(),
    };
    FONT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
