//! Output writer.
//!
//! A build runs in two phases with a hard boundary between them:
//!
//! 1. **plan**: walk the tree and render every output into memory. Each
//!    category contributes its output directory, then its listing pages,
//!    then its children, then recurses into its sub-categories. Pages with
//!    an explicit `url` are skipped. The sitemap is rendered last.
//! 2. **commit**: only once the whole plan succeeded, create directories,
//!    copy static assets and write every planned file.
//!
//! Any failure during planning leaves the output directory exactly as the
//! previous build left it.
//!
//! ## Output Structure
//!
//! ```text
//! .output/
//! ├── index.html              # root listing page 0
//! ├── 1.html                  # root listing page 1 (url /1)
//! ├── about.html
//! ├── blog/
//! │   ├── index.html
//! │   └── first-post.html
//! └── static/
//!     ├── sitemap.xml
//!     └── ...                 # copied from {site}/static
//! ```

use crate::assets;
use crate::category::Category;
use crate::page::Page;
use crate::render::{LinkView, RenderContext};
use crate::site::{BuildError, Site};
use crate::sitemap::SitemapEntry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Everything a build will write, fully rendered.
#[derive(Debug, Default)]
pub struct BuildPlan {
    pub directories: Vec<PathBuf>,
    pub files: Vec<PlannedFile>,
    /// Source files of pages that are link targets only.
    pub skipped: Vec<PathBuf>,
    pub static_files: Vec<PathBuf>,
    pub sitemap_entries: usize,
    /// Output path → the page file that produced it.
    claimed: HashMap<PathBuf, PathBuf>,
}

impl BuildPlan {
    /// Record `file`, rejecting a second page that lands on the same path.
    fn claim(&mut self, file: PlannedFile, source: &Path) -> Result<(), BuildError> {
        if let Some(first) = self.claimed.get(&file.path) {
            return Err(BuildError::OutputCollision {
                path: file.path,
                first: first.clone(),
                second: source.to_path_buf(),
            });
        }
        self.claimed.insert(file.path.clone(), source.to_path_buf());
        self.files.push(file);
        Ok(())
    }

    pub fn summary(&self) -> BuildSummary {
        BuildSummary {
            directories: self.directories.len(),
            // The sitemap is a planned file but not a page
            pages_written: self.files.len().saturating_sub(1),
            pages_skipped: self.skipped.len(),
            static_files: self.static_files.len(),
            sitemap_entries: self.sitemap_entries,
        }
    }
}

/// Counts reported after a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub directories: usize,
    pub pages_written: usize,
    pub pages_skipped: usize,
    pub static_files: usize,
    pub sitemap_entries: usize,
}

/// Link lists shared by every page of one build.
struct SharedLinks {
    navigation: Vec<LinkView>,
    sitemap: Vec<LinkView>,
}

pub struct Writer<'a> {
    site: &'a Site,
}

impl<'a> Writer<'a> {
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    fn output_root(&self) -> &Path {
        self.site.output_root()
    }

    /// Sitemap location: `{output}/static/sitemap.xml`.
    pub fn sitemap_path(&self) -> PathBuf {
        self.output_root().join("static").join("sitemap.xml")
    }

    pub fn plan(&self) -> Result<BuildPlan, BuildError> {
        tracing::info!("planning build of {}", self.site.root().path().display());
        let to_links = |pages: &[std::rc::Rc<Page>]| {
            pages
                .iter()
                .map(|p| LinkView::from_page(p))
                .collect::<Result<Vec<_>, _>>()
        };
        let navigation = self.site.navigation_links()?;
        let sitemap = self.site.sitemap_links()?;
        let shared = SharedLinks {
            navigation: to_links(navigation.as_slice())?,
            sitemap: to_links(sitemap.as_slice())?,
        };

        let mut plan = BuildPlan::default();
        self.plan_category(self.site.root(), &shared, &mut plan)?;

        let static_dir = self.output_root().join("static");
        if !plan.directories.contains(&static_dir) {
            plan.directories.push(static_dir);
        }
        plan.static_files = assets::list_static(&self.site.static_root())?;

        let entries = sitemap
            .iter()
            .map(|p| SitemapEntry::from_page(p))
            .collect::<Result<Vec<_>, _>>()?;
        let xml = self
            .site
            .sitemap_renderer()
            .render(&entries, self.site.base_url())
            .map_err(BuildError::Sitemap)?;
        plan.sitemap_entries = entries.len();
        plan.files.push(PlannedFile {
            path: self.sitemap_path(),
            contents: xml,
        });

        tracing::info!(
            "planned {} files in {} directories",
            plan.files.len(),
            plan.directories.len()
        );
        Ok(plan)
    }

    fn plan_category(
        &self,
        category: &Category,
        shared: &SharedLinks,
        plan: &mut BuildPlan,
    ) -> Result<(), BuildError> {
        plan.directories.push(category.output_dir(self.output_root()));
        for page in category.index_pages()?.iter() {
            self.plan_page(page, shared, plan)?;
        }
        for page in category.children()?.iter() {
            self.plan_page(page, shared, plan)?;
        }
        for sub in category.categories()?.iter() {
            self.plan_category(sub, shared, plan)?;
        }
        Ok(())
    }

    fn plan_page(
        &self,
        page: &Page,
        shared: &SharedLinks,
        plan: &mut BuildPlan,
    ) -> Result<(), BuildError> {
        if page.no_render()? {
            tracing::debug!("skipping {} (explicit url)", page.file_path().display());
            plan.skipped.push(page.file_path().to_path_buf());
            return Ok(());
        }
        let template = page.template_name()?;
        let context = RenderContext::build(page, &shared.navigation, &shared.sitemap)?;
        let contents = self
            .site
            .engine()
            .render(template, &context)
            .map_err(|source| BuildError::Render {
                page: page.file_path().to_path_buf(),
                template: template.to_string(),
                source,
            })?;
        plan.claim(
            PlannedFile {
                path: page.output_path(self.output_root()),
                contents,
            },
            page.file_path(),
        )
    }

    /// Write a finished plan to disk.
    pub fn commit(&self, plan: BuildPlan) -> Result<BuildSummary, BuildError> {
        let summary = plan.summary();
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| BuildError::Io { path, source }
        };

        for dir in &plan.directories {
            fs::create_dir_all(dir).map_err(io_err(dir))?;
        }
        assets::copy_static(&self.site.static_root(), &self.output_root().join("static"))?;
        for file in &plan.files {
            fs::write(&file.path, &file.contents).map_err(io_err(&file.path))?;
        }

        tracing::info!(
            "wrote {} pages to {}",
            summary.pages_written,
            self.output_root().display()
        );
        Ok(summary)
    }

    /// Plan, then commit.
    pub fn write(&self) -> Result<BuildSummary, BuildError> {
        let plan = self.plan()?;
        self.commit(plan)
    }
}
