// src/scrape.rs
//! Document acquisition: menu site page → links → raw document bytes (no parsing).

use crate::config::SourceOptions;
use crate::core::cancel::CancelToken;
use crate::core::html::extract_links;
use crate::core::net::Fetcher;
use crate::error::{MenuError, Result};

/// Fetched document with the link it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub url: String,
    pub bytes: Vec<u8>,
}

/// Links to the currently published menu documents.
pub fn discover(fetcher: &dyn Fetcher, opts: &SourceOptions, cancel: &CancelToken) -> Result<Vec<String>> {
    let page = fetcher
        .get(&opts.site_url, cancel)
        .map_err(|e| e.context("menu site"))?;
    let page = String::from_utf8_lossy(&page);

    let links = extract_links(&page, &opts.link_label, &opts.host_prefix)?;
    if links.len() > opts.max_links {
        return Err(MenuError::network(format!(
            "found {} \"{}\" links, expected at most {}",
            links.len(),
            opts.link_label,
            opts.max_links
        )));
    }
    tracing::debug!(count = links.len(), "discovered menu documents");
    Ok(links)
}

/// Every published document, in page order.
pub fn collect_documents(
    fetcher: &dyn Fetcher,
    opts: &SourceOptions,
    cancel: &CancelToken,
) -> Result<Vec<Document>> {
    let links = discover(fetcher, opts, cancel)?;
    let mut docs = Vec::with_capacity(links.len());
    for url in links {
        cancel.check()?;
        let bytes = fetcher.get(&url, cancel)?;
        docs.push(Document { url, bytes });
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeSite {
        pages: HashMap<String, Vec<u8>>,
        hits: Mutex<Vec<String>>,
    }

    impl FakeSite {
        fn new(pages: &[(&str, &str)]) -> Self {
            let pages = pages.iter().map(|(k, v)| (k.to_string(), v.as_bytes().to_vec())).collect();
            Self { pages, hits: Mutex::new(Vec::new()) }
        }
    }

    impl Fetcher for FakeSite {
        fn get(&self, url: &str, _cancel: &CancelToken) -> Result<Vec<u8>> {
            self.hits.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| MenuError::network(format!("GET {url}: HTTP 404")))
        }
    }

    fn opts() -> SourceOptions {
        SourceOptions {
            site_url: "http://site/menu.html".into(),
            host_prefix: "http://site".into(),
            ..SourceOptions::default()
        }
    }

    const SITE: &str = r#"<ul>
<li><a class="dl" href="/docs/kw47.pdf">Speiseplan Bistro KW 47</a></li>
<li><a class="dl" href="/docs/kw48.pdf">Speiseplan Bistro KW 48</a></li>
<li><a href="/docs/cafe.pdf">Speiseplan Cafeteria</a></li>
</ul>"#;

    #[test]
    fn collects_documents_in_page_order() {
        let site = FakeSite::new(&[
            ("http://site/menu.html", SITE),
            ("http://site/docs/kw47.pdf", "pdf-47"),
            ("http://site/docs/kw48.pdf", "pdf-48"),
        ]);
        let docs = collect_documents(&site, &opts(), &CancelToken::new()).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].url, "http://site/docs/kw47.pdf");
        assert_eq!(docs[0].bytes, b"pdf-47");
        assert_eq!(docs[1].bytes, b"pdf-48");
        assert_eq!(site.hits.lock().unwrap().len(), 3);
    }

    #[test]
    fn too_many_links_is_a_network_error() {
        let page = format!(
            "{SITE}\n<a href=\"/docs/kw49.pdf\">Speiseplan Bistro KW 49</a>"
        );
        let site = FakeSite::new(&[("http://site/menu.html", page.as_str())]);
        let err = discover(&site, &opts(), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, MenuError::Network(_)), "{err:?}");
    }

    #[test]
    fn missing_document_aborts_collection() {
        let site = FakeSite::new(&[
            ("http://site/menu.html", SITE),
            ("http://site/docs/kw47.pdf", "pdf-47"),
        ]);
        let err = collect_documents(&site, &opts(), &CancelToken::new()).unwrap_err();
        assert!(err.to_string().contains("kw48.pdf"), "{err}");
    }

    #[test]
    fn cancelled_before_documents() {
        let site = FakeSite::new(&[("http://site/menu.html", SITE)]);
        let cancel = CancelToken::new();
        cancel.cancel();
        // the fake ignores the token; the loop itself must notice
        let err = collect_documents(&site, &opts(), &cancel).unwrap_err();
        assert_eq!(err, MenuError::Cancelled);
    }
}
