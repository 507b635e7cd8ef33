//! Page rendering: the template seam and the built-in layouts.
//!
//! The build never formats HTML itself. For every page it assembles a
//! [`RenderContext`] (serde views of the page, its category and the
//! site-wide link lists) and hands it to a [`TemplateEngine`] together with
//! the page's template name. Any engine that can consume JSON can be plugged
//! in through [`RenderContext::to_json`].
//!
//! [`LayoutEngine`] is the stock engine: a registry of [maud](https://maud.lambda.xyz/)
//! closures keyed by template name, with two layouts pre-registered:
//!
//! | Name               | Used for                                   |
//! |--------------------|--------------------------------------------|
//! | `base.html`        | content pages                              |
//! | `parent_base.html` | category listing pages, with a pager       |
//!
//! The `content` attribute is treated as markdown and rendered with
//! pulldown-cmark. `css_imports` / `js_imports` list attributes become
//! `<link>` / `<script>` tags in the document head.

use crate::attributes::AttributeRecord;
use crate::category::TreeError;
use crate::page::Page;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unknown template `{0}`")]
    UnknownTemplate(String),
    #[error("Template `{template}` failed: {message}")]
    Failed { template: String, message: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The templating collaborator.
pub trait TemplateEngine {
    fn render(&self, template: &str, context: &RenderContext) -> Result<String, RenderError>;
}

// ============================================================================
// Views
// ============================================================================

/// A link to another page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LinkView {
    pub title: String,
    pub url: String,
    pub path: String,
}

impl LinkView {
    pub fn from_page(page: &Page) -> Result<Self, TreeError> {
        Ok(Self {
            title: page.title()?,
            url: page.url()?.to_string(),
            path: page.path().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub slug: String,
    pub url: String,
    pub title: String,
    pub path: String,
    pub template: String,
    pub is_index: bool,
    pub page_number: Option<usize>,
    pub attributes: AttributeRecord,
    pub prev: Option<LinkView>,
    pub next: Option<LinkView>,
    /// Children shown on a listing page.
    pub listed: Vec<LinkView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub slug: String,
    pub url: String,
    pub url_path: String,
    pub title: String,
    pub child_count: usize,
    pub index_page_count: usize,
    pub subcategories: Vec<LinkView>,
}

/// Everything a template can see.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    pub page: PageView,
    pub category: CategoryView,
    pub navigation_links: Vec<LinkView>,
    pub sitemap_links: Vec<LinkView>,
}

impl RenderContext {
    /// Assemble the context for one page. The link lists are shared by every
    /// page of a build and passed in pre-built.
    pub fn build(
        page: &Page,
        navigation_links: &[LinkView],
        sitemap_links: &[LinkView],
    ) -> Result<Self, TreeError> {
        let link = |p: Option<std::rc::Rc<Page>>| p.map(|p| LinkView::from_page(&p)).transpose();
        let listed = page
            .listed_pages()
            .iter()
            .map(|p| LinkView::from_page(p))
            .collect::<Result<Vec<_>, _>>()?;

        let page_view = PageView {
            slug: page.slug().to_string(),
            url: page.url()?.to_string(),
            title: page.title()?,
            path: page.path().to_string(),
            template: page.template_name()?.to_string(),
            is_index: page.is_index(),
            page_number: page.page_number(),
            attributes: page.data()?.clone(),
            prev: link(page.prev()?)?,
            next: link(page.next()?)?,
            listed,
        };

        let category = page.category()?;
        let subcategories = category
            .categories()?
            .iter()
            .map(|c| c.index().and_then(|p| LinkView::from_page(&p)))
            .collect::<Result<Vec<_>, _>>()?;
        let category_view = CategoryView {
            slug: category.slug().to_string(),
            url: category.url(),
            url_path: category.url_path().to_string(),
            title: category.index()?.title()?,
            child_count: category.child_count()?,
            index_page_count: category.index_page_count()?,
            subcategories,
        };

        Ok(Self {
            page: page_view,
            category: category_view,
            navigation_links: navigation_links.to_vec(),
            sitemap_links: sitemap_links.to_vec(),
        })
    }

    pub fn to_json(&self) -> Result<serde_json::Value, RenderError> {
        Ok(serde_json::to_value(self)?)
    }
}

// ============================================================================
// Layout engine
// ============================================================================

type Layout = Box<dyn Fn(&RenderContext) -> Result<Markup, RenderError>>;

/// Template engine backed by maud closures registered by name.
pub struct LayoutEngine {
    layouts: BTreeMap<String, Layout>,
}

impl Default for LayoutEngine {
    /// The stock layouts: `base.html` and `parent_base.html`.
    fn default() -> Self {
        Self::empty()
            .with_layout("base.html", |ctx| Ok(page_layout(ctx)))
            .with_layout("parent_base.html", |ctx| Ok(listing_layout(ctx)))
    }
}

impl LayoutEngine {
    /// An engine with no layouts at all.
    pub fn empty() -> Self {
        Self {
            layouts: BTreeMap::new(),
        }
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        layout: impl Fn(&RenderContext) -> Result<Markup, RenderError> + 'static,
    ) {
        self.layouts.insert(name.into(), Box::new(layout));
    }

    pub fn with_layout(
        mut self,
        name: impl Into<String>,
        layout: impl Fn(&RenderContext) -> Result<Markup, RenderError> + 'static,
    ) -> Self {
        self.register(name, layout);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }
}

impl TemplateEngine for LayoutEngine {
    fn render(&self, template: &str, context: &RenderContext) -> Result<String, RenderError> {
        let layout = self
            .layouts
            .get(template)
            .ok_or_else(|| RenderError::UnknownTemplate(template.to_string()))?;
        Ok(layout(context)?.into_string())
    }
}

/// Markdown to HTML.
pub fn markdown_to_html(source: &str) -> String {
    let parser = Parser::new(source);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
pub fn base_document(ctx: &RenderContext, content: Markup) -> Markup {
    let attrs = &ctx.page.attributes;
    let description = attrs.get_str("description");
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (ctx.page.title) }
                @if !description.is_empty() {
                    meta name="description" content=(description);
                }
                @for href in attrs.get_list("css_imports") {
                    link rel="stylesheet" href=(href);
                }
                @for src in attrs.get_list("js_imports") {
                    script src=(src) {}
                }
            }
            body class=[ctx.page.is_index.then_some("listing")] {
                (site_nav(&ctx.navigation_links, &ctx.page.url))
                (content)
            }
        }
    }
}

/// Renders the site navigation, marking the current link
pub fn site_nav(links: &[LinkView], current_url: &str) -> Markup {
    html! {
        @if !links.is_empty() {
            nav.site-nav {
                ul {
                    @for link in links {
                        li class=[(link.url == current_url).then_some("current")] {
                            a href=(link.url) { (link.title) }
                        }
                    }
                }
            }
        }
    }
}

fn body_content(attrs: &AttributeRecord) -> Markup {
    let content = attrs.get_str("content");
    html! {
        @if !content.is_empty() {
            div.content { (PreEscaped(markdown_to_html(&content))) }
        }
    }
}

// ============================================================================
// Layouts
// ============================================================================

/// `base.html`: a single content page.
pub fn page_layout(ctx: &RenderContext) -> Markup {
    let page = &ctx.page;
    let content = html! {
        main.page {
            article {
                h1 { (page.title) }
                (body_content(&page.attributes))
            }
            @if page.prev.is_some() || page.next.is_some() {
                nav.siblings {
                    @if let Some(prev) = &page.prev {
                        a.prev href=(prev.url) rel="prev" { "← " (prev.title) }
                    }
                    @if let Some(next) = &page.next {
                        a.next href=(next.url) rel="next" { (next.title) " →" }
                    }
                }
            }
        }
    };
    base_document(ctx, content)
}

/// `parent_base.html`: one listing page of a category.
pub fn listing_layout(ctx: &RenderContext) -> Markup {
    let page = &ctx.page;
    let content = html! {
        main.listing {
            h1 { (page.title) }
            (body_content(&page.attributes))
            @if !page.listed.is_empty() {
                ul.children {
                    @for child in &page.listed {
                        li { a href=(child.url) { (child.title) } }
                    }
                }
            }
            @if !ctx.category.subcategories.is_empty() && page.page_number == Some(0) {
                ul.categories {
                    @for sub in &ctx.category.subcategories {
                        li { a href=(sub.url) { (sub.title) } }
                    }
                }
            }
            @if ctx.category.index_page_count > 1 {
                nav.pager {
                    @if let Some(prev) = &page.prev {
                        a.prev href=(prev.url) rel="prev" { "Newer" }
                    }
                    span.page-count {
                        (page.page_number.unwrap_or(0) + 1) " / " (ctx.category.index_page_count)
                    }
                    @if let Some(next) = &page.next {
                        a.next href=(next.url) rel="next" { "Older" }
                    }
                }
            }
        }
    };
    base_document(ctx, content)
}

// ============================================================================
// Tests
// ============================================================================
