//! Build a static reference copy of a page.
//!
//! Uses lol_html for streaming rewriting, so everything outside the
//! touched elements is emitted byte-for-byte.

use std::cell::Cell;

use lol_html::{element, HtmlRewriter, Settings};
use tracing::debug;
use url::Url;

use crate::document::is_absolute;
use crate::types::{MirrorError, MirrorResult};

/// Strip every `<script>` element and absolutize stylesheet and image
/// references.
///
/// References that already carry a scheme, and empty references, are
/// left untouched.
pub fn clean(html: &str, base: &Url) -> MirrorResult<String> {
    let mut output = Vec::with_capacity(html.len());
    let scripts_removed = Cell::new(0usize);
    let rewritten = Cell::new(0usize);

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("script", |el| {
                    el.remove();
                    scripts_removed.set(scripts_removed.get() + 1);
                    Ok(())
                }),
                element!(r#"link[rel~="stylesheet"][href]"#, |el| {
                    if let Some(abs) = el.get_attribute("href").and_then(|v| absolutize(&v, base)) {
                        el.set_attribute("href", &abs)?;
                        rewritten.set(rewritten.get() + 1);
                    }
                    Ok(())
                }),
                element!("img[src]", |el| {
                    if let Some(abs) = el.get_attribute("src").and_then(|v| absolutize(&v, base)) {
                        el.set_attribute("src", &abs)?;
                        rewritten.set(rewritten.get() + 1);
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| MirrorError::Rewrite(e.to_string()))?;
    rewriter
        .end()
        .map_err(|e| MirrorError::Rewrite(e.to_string()))?;

    debug!(
        "Reference copy: {} scripts removed, {} references rewritten",
        scripts_removed.get(),
        rewritten.get()
    );

    String::from_utf8(output).map_err(|e| MirrorError::Rewrite(format!("invalid UTF-8: {e}")))
}

fn absolutize(value: &str, base: &Url) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || is_absolute(value) {
        return None;
    }
    base.join(value).ok().map(String::from)
}
