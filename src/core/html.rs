// src/core/html.rs
// Download-link discovery on the menu site.
//
// Anchors are matched per line: `<a ...>LABEL ...</a>`; the first `/... .pdf`
// path inside the match is the document, made absolute with the host prefix.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{MenuError, Result};

static PDF_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/.+\.pdf").expect("valid pdf path regex"));

fn anchor_regex(label: &str) -> Result<Regex> {
    Regex::new(&format!(r"<a.+>{}.+</a>", regex::escape(label)))
        .map_err(|e| MenuError::Internal(format!("link label regex: {e}")))
}

/// All menu document links in page order. Fails if none are present.
pub fn extract_links(site: &str, label: &str, host_prefix: &str) -> Result<Vec<String>> {
    let anchors = anchor_regex(label)?;

    let mut links = Vec::new();
    for m in anchors.find_iter(site) {
        let path = PDF_PATH.find(m.as_str()).ok_or_else(|| {
            MenuError::network(format!("no pdf path in anchor {:?}", m.as_str()))
        })?;
        // host_prefix has no trailing slash and the path starts with one
        links.push(format!("{host_prefix}{}", path.as_str()));
    }

    if links.is_empty() {
        return Err(MenuError::network(format!("no \"{label}\" links found on menu site")));
    }
    Ok(links)
}
