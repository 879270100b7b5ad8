use std::path::PathBuf;
use url::Url;

use super::SiteError;
use crate::config::SitemapConfig;
use crate::markdown::{extract_links, render_markdown};

/// Plain-text sitemap built from the links of an index markdown page.
#[derive(Debug, Clone)]
pub struct Sitemap {
    index_file: PathBuf,
    base_url: String,
}

impl Sitemap {
    pub fn new(config: &SitemapConfig) -> Self {
        Self {
            index_file: config.index_file.clone(),
            base_url: config.base_url.clone(),
        }
    }

    /// Reads the index file and renders the sitemap body.
    pub fn render(&self) -> Result<String, SiteError> {
        let markdown = std::fs::read_to_string(&self.index_file).map_err(|source| SiteError::Io {
            path: self.index_file.clone(),
            source,
        })?;
        build_sitemap(&markdown, &self.base_url)
    }
}

/// Lists `base_url` followed by every link in `markdown` that resolves to a
/// URL under `base_url`, one per line, in document order.
pub fn build_sitemap(markdown: &str, base_url: &str) -> Result<String, SiteError> {
    let base = Url::parse(base_url)?;
    let mut out = base_url.to_owned();

    for href in extract_links(&render_markdown(markdown)) {
        let Ok(absolute) = base.join(&href) else {
            tracing::debug!(href = %href, "Skipping unresolvable sitemap link");
            continue;
        };
        if absolute.as_str().starts_with(base.as_str()) {
            out.push('\n');
            out.push_str(absolute.as_str());
        }
    }

    Ok(out)
}
