//! XML sitemap.
//!
//! The sitemap lists every page whose `sitemap` flag is set, as absolute URLs
//! under the configured `base_url`. It is rendered once per build and written
//! to `{output}/static/sitemap.xml`.

use crate::category::TreeError;
use crate::page::Page;
use crate::render::RenderError;
use maud::html;

const PROLOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub url: String,
    pub title: String,
}

impl SitemapEntry {
    pub fn from_page(page: &Page) -> Result<Self, TreeError> {
        Ok(Self {
            url: page.url()?.to_string(),
            title: page.title()?,
        })
    }
}

/// The sitemap collaborator.
pub trait SitemapRenderer {
    fn render(&self, entries: &[SitemapEntry], base_url: &str) -> Result<String, RenderError>;
}

/// Renders a sitemaps.org `urlset`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSitemap;

impl SitemapRenderer for XmlSitemap {
    fn render(&self, entries: &[SitemapEntry], base_url: &str) -> Result<String, RenderError> {
        let body = html! {
            urlset xmlns=(SITEMAP_NS) {
                @for entry in entries {
                    url { loc { (absolute_url(base_url, &entry.url)) } }
                }
            }
        };
        Ok(format!("{PROLOG}\n{}\n", body.into_string()))
    }
}

/// `base_url` joined with a site-relative URL; absolute URLs pass through.
pub fn absolute_url(base_url: &str, url: &str) -> String {
    if url.contains("://") {
        return url.to_string();
    }
    format!("{}{}", base_url.trim_end_matches('/'), url)
}
