//! Best-effort HTML document and URL resolution.
//!
//! Parsing is delegated to `scraper` (html5ever), which recovers from any
//! malformed markup, so building a [`Document`] cannot fail.

use scraper::{Html, Selector};
use url::Url;

/// A parsed HTML page exposing only the queries the extractor needs.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full HTML document. Never fails.
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    /// Values of `attr` on every element matching `selector`, in document order.
    ///
    /// Elements where the attribute is missing, empty, or whitespace-only
    /// are skipped.
    pub fn attribute_values<'a>(
        &'a self,
        selector: &'a Selector,
        attr: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.html
            .select(selector)
            .filter_map(move |el| el.value().attr(attr))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Parse an absolute base URL.
pub fn parse_base(base: &str) -> crate::MirrorResult<Url> {
    Url::parse(base).map_err(|e| crate::MirrorError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve `reference` against `base` with standard URL-join semantics.
///
/// References that already carry a scheme are returned unchanged. Empty
/// references and references that cannot be joined yield `None`.
pub fn resolve(reference: &str, base: &Url) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if Url::parse(reference).is_ok() {
        return Some(reference.to_string());
    }
    base.join(reference).ok().map(String::from)
}

/// True when `reference` carries its own scheme (`https:`, `data:`, ...).
pub fn is_absolute(reference: &str) -> bool {
    Url::parse(reference.trim()).is_ok()
}
