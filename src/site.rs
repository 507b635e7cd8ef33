//! The site: root of the content tree and driver of the build.
//!
//! A [`Site`] binds a site directory and its [`SiteConfig`] to one root
//! [`Category`], plus the two collaborators a build needs: a
//! [`TemplateEngine`] for pages and a [`SitemapRenderer`] for the sitemap.
//!
//! Cross-tree aggregates (every page, the navigation links, the sitemap
//! links) are derived from the root's `sub_pages` and memoized. They are
//! revalidated by identity against the root's current list, so a cache bust
//! anywhere in the tree (including [`Category::set_page_size`]) is picked up
//! on the next read.
//!
//! The tree is built on `Rc`/`RefCell`, so a `Site` is neither `Send` nor
//! `Sync`: only the thread that owns it can rebuild it, and two builds of the
//! same site can never overlap.

use crate::assets::AssetError;
use crate::category::{Category, PageList, TreeError};
use crate::config::{ConfigError, SiteConfig};
use crate::memo::Memo;
use crate::page::Page;
use crate::render::{LayoutEngine, RenderError, TemplateEngine};
use crate::sitemap::{SitemapRenderer, XmlSitemap};
use crate::writer::{BuildPlan, BuildSummary, Writer};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to render {page} with `{template}`: {source}")]
    Render {
        page: PathBuf,
        template: String,
        #[source]
        source: RenderError,
    },
    #[error("{second} and {first} both write {path}")]
    OutputCollision {
        path: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("Failed to render sitemap: {0}")]
    Sitemap(#[source] RenderError),
    #[error(transparent)]
    Assets(#[from] AssetError),
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Settings shared by every node of one tree.
#[derive(Debug, Clone)]
pub struct SiteContext {
    pub content_root: PathBuf,
    pub include_drafts: bool,
    pub page_size: usize,
    pub content_extension: String,
    pub page_template: String,
    pub index_template: String,
}

impl SiteContext {
    pub fn from_config(
        site_root: &Path,
        config: &SiteConfig,
        include_drafts: bool,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            content_root: config.content_root(site_root),
            include_drafts,
            page_size: config.page_size()?,
            content_extension: config.content_extension.clone(),
            page_template: config.templates.page.clone(),
            index_template: config.templates.index.clone(),
        })
    }
}

struct Aggregates {
    pages: PageList,
    navigation: PageList,
    sitemap: PageList,
}

pub struct Site {
    site_root: PathBuf,
    config: SiteConfig,
    output_root: PathBuf,
    root: Rc<Category>,
    engine: Box<dyn TemplateEngine>,
    sitemap: Box<dyn SitemapRenderer>,
    aggregates: Memo<Rc<Aggregates>>,
}

impl Site {
    /// Bind a site directory. The content root must exist.
    pub fn new(
        site_root: impl Into<PathBuf>,
        config: &SiteConfig,
        include_drafts: bool,
    ) -> Result<Self, ConfigError> {
        let site_root = site_root.into();
        let ctx = SiteContext::from_config(&site_root, config, include_drafts)?;
        if !ctx.content_root.is_dir() {
            return Err(ConfigError::MissingContentRoot(ctx.content_root));
        }
        tracing::debug!("content root: {}", ctx.content_root.display());
        Ok(Self {
            output_root: config.output_root(&site_root),
            site_root,
            config: config.clone(),
            root: Category::root(Rc::new(ctx)),
            engine: Box::new(LayoutEngine::default()),
            sitemap: Box::new(XmlSitemap),
            aggregates: Memo::new(),
        })
    }

    /// Load `config.toml` from the site directory and bind it.
    pub fn load(site_root: impl Into<PathBuf>, include_drafts: bool) -> Result<Self, ConfigError> {
        let site_root = site_root.into();
        let config = crate::config::load_config(&site_root)?;
        Self::new(site_root, &config, include_drafts)
    }

    pub fn with_output(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    pub fn with_engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    pub fn with_sitemap(mut self, sitemap: impl SitemapRenderer + 'static) -> Self {
        self.sitemap = Box::new(sitemap);
        self
    }

    pub fn root(&self) -> &Rc<Category> {
        &self.root
    }

    pub fn site_root(&self) -> &Path {
        &self.site_root
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn include_drafts(&self) -> bool {
        self.root.context().include_drafts
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn static_root(&self) -> PathBuf {
        self.config.static_root(&self.site_root)
    }

    pub fn engine(&self) -> &dyn TemplateEngine {
        self.engine.as_ref()
    }

    pub fn sitemap_renderer(&self) -> &dyn SitemapRenderer {
        self.sitemap.as_ref()
    }

    /// Directories whose changes require a rebuild: content, static assets
    /// and templates, when they exist.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        [
            self.root.path().to_path_buf(),
            self.static_root(),
            self.config.templates_root(&self.site_root),
        ]
        .into_iter()
        .filter(|p| p.is_dir())
        .collect()
    }

    fn aggregates(&self) -> Result<Rc<Aggregates>, TreeError> {
        let pages = self.root.sub_pages()?;
        if let Some(cached) = self.aggregates.peek() {
            if Rc::ptr_eq(&cached.pages, &pages) {
                return Ok(cached);
            }
            self.aggregates.clear();
        }
        self.aggregates.get_or_try_init(|| {
            let mut navigation = Vec::new();
            let mut sitemap = Vec::new();
            for page in pages.iter() {
                if page.include_in_navigation()? {
                    navigation.push((page.sort_key()?, Rc::clone(page)));
                }
                if page.sitemap()? {
                    sitemap.push(Rc::clone(page));
                }
            }
            navigation.sort_by_key(|(key, _)| *key);
            Ok(Rc::new(Aggregates {
                pages: Rc::clone(&pages),
                navigation: Rc::new(navigation.into_iter().map(|(_, p)| p).collect()),
                sitemap: Rc::new(sitemap),
            }))
        })
    }

    /// Every content and listing page in the tree.
    pub fn pages(&self) -> Result<PageList, TreeError> {
        Ok(Rc::clone(&self.aggregates()?.pages))
    }

    /// Pages flagged `include_in_navigation`, sorted by `order` (stable).
    pub fn navigation_links(&self) -> Result<PageList, TreeError> {
        Ok(Rc::clone(&self.aggregates()?.navigation))
    }

    /// Pages that belong in the sitemap.
    pub fn sitemap_links(&self) -> Result<PageList, TreeError> {
        Ok(Rc::clone(&self.aggregates()?.sitemap))
    }

    /// The root category followed by every descendant.
    pub fn categories(&self) -> Result<Vec<Rc<Category>>, TreeError> {
        let mut all = vec![Rc::clone(&self.root)];
        all.extend(self.root.sub_categories()?.iter().cloned());
        Ok(all)
    }

    /// Find a page by its URL.
    pub fn page_by_url(&self, url: &str) -> Result<Option<Rc<Page>>, TreeError> {
        for page in self.pages()?.iter() {
            if page.url()? == url {
                return Ok(Some(Rc::clone(page)));
            }
        }
        Ok(None)
    }

    /// Forget everything derived from the filesystem.
    pub fn bust_cache(&self) {
        self.aggregates.clear();
        self.root.bust_cache();
    }

    /// Render every output in memory without touching the output directory.
    pub fn plan(&self) -> Result<BuildPlan, BuildError> {
        Writer::new(self).plan()
    }

    /// Validate the whole site: same as a build, minus the writes.
    pub fn check(&self) -> Result<BuildSummary, BuildError> {
        Ok(self.plan()?.summary())
    }

    /// Write the whole site to the output directory.
    pub fn save(&self) -> Result<BuildSummary, BuildError> {
        Writer::new(self).write()
    }

    /// Re-read the filesystem and write the whole site again.
    pub fn recompile(&self) -> Result<BuildSummary, BuildError> {
        self.bust_cache();
        self.save()
    }
}

impl std::fmt::Debug for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("site_root", &self.site_root)
            .field("output_root", &self.output_root)
            .field("include_drafts", &self.include_drafts())
            .finish()
    }
}
