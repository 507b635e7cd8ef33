//! Categories: the directory nodes of the content tree.
//!
//! Every directory below the content root is a [`Category`]. A category owns
//! three kinds of derived values, all computed lazily from the filesystem and
//! memoized until [`Category::bust_cache`] is called:
//!
//! - **children**: the `.page` files in the directory (except `index.page`),
//!   drafts filtered out unless the site includes them, sorted by `order`
//! - **categories**: one child category per subdirectory
//! - **index pages**: the children split into chunks of `page_size`, each
//!   wrapped in a listing page. A category with no children still gets one
//!   empty listing page, so every category has an index.
//!
//! ```text
//! pages/                    url_path ""
//! ├── index.page            → /            (index page 0)
//! ├── about.page            → /about
//! └── blog/                 url_path "blog"
//!     ├── index.page        → /blog, /blog/1, ...
//!     ├── first_post.page   → /blog/first-post
//!     └── 2024/             url_path "blog/2024"
//! ```
//!
//! ## Ordering
//!
//! Directory entries are discovered in file-name order. Children are then
//! stably sorted by their `order` attribute; pages without one sort last and
//! keep their discovery order among themselves.
//!
//! ## Invalidation
//!
//! `bust_cache` clears this category's memos and cascades into every child
//! category that had been discovered. Page objects are not touched: they are
//! dropped with the memo and recreated on next access, which re-reads their
//! files.

use crate::attributes::AttributeRecord;
use crate::config::{self, ConfigError};
use crate::memo::Memo;
use crate::naming;
use crate::page::Page;
use crate::reader::{self, ReadError};
use crate::site::SiteContext;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("Directory not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error listing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: non-numeric value for `:order:`: {value:?}")]
    InvalidOrder { path: PathBuf, value: String },
    #[error("{path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
    #[error("No sub-category `{slug}` in category `{category}`")]
    NoSuchCategory { category: String, slug: String },
    #[error("Page {0} outlived its category")]
    Detached(PathBuf),
}

pub type PageList = Rc<Vec<Rc<Page>>>;
pub type CategoryList = Rc<Vec<Rc<Category>>>;

/// Directory entries relevant to the tree, in discovery order.
#[derive(Debug)]
struct Listing {
    pages: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

/// One memo slot per derived value.
#[derive(Default)]
struct CategoryMemo {
    listing: Memo<Rc<Listing>>,
    all_pages: Memo<PageList>,
    children: Memo<PageList>,
    child_positions: Memo<Rc<HashMap<PathBuf, usize>>>,
    categories: Memo<CategoryList>,
    index_record: Memo<Rc<AttributeRecord>>,
    index_pages: Memo<PageList>,
    child_template: Memo<String>,
    sub_pages: Memo<PageList>,
    sub_categories: Memo<CategoryList>,
}

impl CategoryMemo {
    fn clear(&self) {
        self.listing.clear();
        self.all_pages.clear();
        self.children.clear();
        self.child_positions.clear();
        self.categories.clear();
        self.index_record.clear();
        self.index_pages.clear();
        self.child_template.clear();
        self.sub_pages.clear();
        self.sub_categories.clear();
    }
}

pub struct Category {
    ctx: Rc<SiteContext>,
    path: PathBuf,
    slug: String,
    url_path: String,
    this: Weak<Category>,
    parent: Weak<Category>,
    page_size_override: Cell<Option<usize>>,
    memo: CategoryMemo,
}

impl Category {
    /// The root category, bound to the site's content root.
    pub(crate) fn root(ctx: Rc<SiteContext>) -> Rc<Self> {
        let path = ctx.content_root.clone();
        Self::build(ctx, path, String::new(), Weak::new())
    }

    fn child(&self, path: PathBuf) -> Rc<Self> {
        let slug = dir_name(&path);
        let url_path = naming::child_url_path(&self.url_path, &slug);
        Self::build(Rc::clone(&self.ctx), path, url_path, self.this.clone())
    }

    fn build(ctx: Rc<SiteContext>, path: PathBuf, url_path: String, parent: Weak<Self>) -> Rc<Self> {
        let slug = dir_name(&path);
        Rc::new_cyclic(|this| Self {
            ctx,
            path,
            slug,
            url_path,
            this: this.clone(),
            parent,
            page_size_override: Cell::new(None),
            memo: CategoryMemo::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory base name.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Path segments below the content root joined with `/`; `""` at the root.
    pub fn url_path(&self) -> &str {
        &self.url_path
    }

    pub fn url(&self) -> String {
        naming::category_url(&self.url_path)
    }

    pub fn is_root(&self) -> bool {
        self.parent.upgrade().is_none() && self.url_path.is_empty()
    }

    pub fn parent(&self) -> Option<Rc<Category>> {
        self.parent.upgrade()
    }

    pub(crate) fn context(&self) -> &SiteContext {
        &self.ctx
    }

    /// Source file for this category's listing pages.
    pub fn index_file(&self) -> PathBuf {
        self.path
            .join(format!("index.{}", self.ctx.content_extension))
    }

    /// Clear every memoized value here and in all discovered sub-categories.
    pub fn bust_cache(&self) {
        if let Some(categories) = self.memo.categories.peek() {
            for category in categories.iter() {
                category.bust_cache();
            }
        }
        self.memo.clear();
    }

    fn listing(&self) -> Result<Rc<Listing>, TreeError> {
        self.memo.listing.get_or_try_init(|| {
            let read = fs::read_dir(&self.path).map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    TreeError::NotFound(self.path.clone())
                } else {
                    TreeError::Io {
                        path: self.path.clone(),
                        source: e,
                    }
                }
            })?;

            let mut entries: Vec<PathBuf> = read
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| !is_hidden(p))
                .collect();
            entries.sort();

            let index_name = format!("index.{}", self.ctx.content_extension);
            let mut pages = Vec::new();
            let mut dirs = Vec::new();
            for entry in entries {
                if entry.is_dir() {
                    dirs.push(entry);
                } else if entry.is_file()
                    && has_extension(&entry, &self.ctx.content_extension)
                    && entry.file_name().is_some_and(|n| n != index_name.as_str())
                {
                    pages.push(entry);
                }
            }
            tracing::debug!(
                "discovered {} pages, {} categories in {}",
                pages.len(),
                dirs.len(),
                self.path.display()
            );
            Ok(Rc::new(Listing { pages, dirs }))
        })
    }

    /// Every content page in the directory, drafts included, in discovery order.
    pub fn all_pages(&self) -> Result<PageList, TreeError> {
        self.memo.all_pages.get_or_try_init(|| {
            let listing = self.listing()?;
            Ok(Rc::new(
                listing
                    .pages
                    .iter()
                    .map(|p| Rc::new(Page::content(p.clone(), &self.url_path, self.this.clone())))
                    .collect(),
            ))
        })
    }

    /// Published content pages sorted by `order` (stable).
    pub fn children(&self) -> Result<PageList, TreeError> {
        self.memo.children.get_or_try_init(|| {
            let mut keyed = Vec::new();
            for page in self.all_pages()?.iter() {
                if !self.ctx.include_drafts && page.is_draft()? {
                    continue;
                }
                keyed.push((page.sort_key()?, Rc::clone(page)));
            }
            keyed.sort_by_key(|(key, _)| *key);
            Ok(Rc::new(keyed.into_iter().map(|(_, page)| page).collect()))
        })
    }

    /// Index of `page` among [`children`](Self::children), looked up by file.
    pub fn child_position(&self, page: &Page) -> Result<Option<usize>, TreeError> {
        let positions = self.memo.child_positions.get_or_try_init(|| {
            let children = self.children()?;
            Ok::<_, TreeError>(Rc::new(
                children
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (p.file_path().to_path_buf(), i))
                    .collect(),
            ))
        })?;
        Ok(positions.get(page.file_path()).copied())
    }

    pub fn child_count(&self) -> Result<usize, TreeError> {
        Ok(self.children()?.len())
    }

    /// One category per immediate subdirectory, in discovery order.
    pub fn categories(&self) -> Result<CategoryList, TreeError> {
        self.memo.categories.get_or_try_init(|| {
            let listing = self.listing()?;
            Ok(Rc::new(
                listing.dirs.iter().map(|d| self.child(d.clone())).collect(),
            ))
        })
    }

    /// Parsed `index.page`, or an empty record when the file does not exist.
    pub fn index_record(&self) -> Result<Rc<AttributeRecord>, TreeError> {
        self.memo.index_record.get_or_try_init(|| {
            match reader::read_file(&self.index_file()) {
                Ok(record) => Ok(Rc::new(record)),
                Err(ReadError::NotFound(_)) => Ok(Rc::new(AttributeRecord::new())),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Children per listing page.
    ///
    /// Precedence: [`set_page_size`](Self::set_page_size) → `page_size` in
    /// `index.page` → site config.
    pub fn page_size(&self) -> Result<usize, TreeError> {
        if let Some(size) = self.page_size_override.get() {
            return Ok(size);
        }
        match self.index_record()?.get_int("page_size") {
            Some(size) => config::validate_page_size(size).map_err(|source| TreeError::Config {
                path: self.index_file(),
                source,
            }),
            None => Ok(self.ctx.page_size),
        }
    }

    /// Override the pagination size for this category only.
    ///
    /// Invalidates this category's listing pages and the aggregated page
    /// lists of its ancestors; nothing else is recomputed.
    pub fn set_page_size(&self, page_size: i64) -> Result<(), ConfigError> {
        let size = config::validate_page_size(page_size)?;
        self.page_size_override.set(Some(size));
        self.memo.index_pages.clear();
        self.memo.sub_pages.clear();
        let mut ancestor = self.parent.upgrade();
        while let Some(category) = ancestor {
            category.memo.sub_pages.clear();
            ancestor = category.parent.upgrade();
        }
        Ok(())
    }

    /// Listing pages: children chunked by `page_size`, never empty.
    pub fn index_pages(&self) -> Result<PageList, TreeError> {
        self.memo.index_pages.get_or_try_init(|| {
            let children = self.children()?;
            let record = self.index_record()?;
            let size = self.page_size()?;

            let mut pages: Vec<Rc<Page>> = children
                .chunks(size)
                .enumerate()
                .map(|(n, chunk)| self.new_index_page(n, chunk.to_vec(), &record))
                .collect();
            if pages.is_empty() {
                pages.push(self.new_index_page(0, Vec::new(), &record));
            }
            Ok(Rc::new(pages))
        })
    }

    fn new_index_page(
        &self,
        page_number: usize,
        pages: Vec<Rc<Page>>,
        record: &Rc<AttributeRecord>,
    ) -> Rc<Page> {
        Rc::new(Page::index(
            self.index_file(),
            &self.url_path,
            self.this.clone(),
            page_number,
            pages,
            Rc::clone(record),
        ))
    }

    pub fn index_page_count(&self) -> Result<usize, TreeError> {
        Ok(self.index_pages()?.len())
    }

    /// The canonical listing page (page 0).
    pub fn index(&self) -> Result<Rc<Page>, TreeError> {
        let pages = self.index_pages()?;
        // index_pages always yields at least one page
        Ok(Rc::clone(&pages[0]))
    }

    /// Default template for children: the index's `child_template`, else the
    /// site's page template.
    pub fn child_template(&self) -> Result<String, TreeError> {
        self.memo.child_template.get_or_try_init(|| {
            let explicit = self.index_record()?.get_str("child_template");
            Ok(if explicit.is_empty() {
                self.ctx.page_template.clone()
            } else {
                explicit
            })
        })
    }

    /// Children and listing pages of this category and every descendant.
    pub fn sub_pages(&self) -> Result<PageList, TreeError> {
        self.memo.sub_pages.get_or_try_init(|| {
            let mut pages: Vec<Rc<Page>> = self.children()?.iter().cloned().collect();
            pages.extend(self.index_pages()?.iter().cloned());
            for category in self.categories()?.iter() {
                pages.extend(category.sub_pages()?.iter().cloned());
            }
            Ok(Rc::new(pages))
        })
    }

    /// Every descendant category, depth-first, parents before children.
    pub fn sub_categories(&self) -> Result<CategoryList, TreeError> {
        self.memo.sub_categories.get_or_try_init(|| {
            let mut all = Vec::new();
            for category in self.categories()?.iter() {
                all.push(Rc::clone(category));
                all.extend(category.sub_categories()?.iter().cloned());
            }
            Ok(Rc::new(all))
        })
    }

    /// Direct sub-category with the given slug, if any.
    pub fn subcategory(&self, slug: &str) -> Result<Option<Rc<Category>>, TreeError> {
        Ok(self
            .categories()?
            .iter()
            .find(|c| c.slug == slug)
            .cloned())
    }

    /// Direct sub-category with the given slug; missing is an error.
    pub fn category(&self, slug: &str) -> Result<Rc<Category>, TreeError> {
        self.subcategory(slug)?
            .ok_or_else(|| TreeError::NoSuchCategory {
                category: naming::category_url(&self.url_path),
                slug: slug.to_string(),
            })
    }

    /// Walk nested slugs: `"blog/2024"`. The empty path is this category.
    pub fn lookup(&self, path: &str) -> Result<Rc<Category>, TreeError> {
        let mut current = self
            .this
            .upgrade()
            .ok_or_else(|| TreeError::Detached(self.path.clone()))?;
        for slug in path.split('/').filter(|s| !s.is_empty()) {
            current = current.category(slug)?;
        }
        Ok(current)
    }

    /// Output directory for this category.
    pub fn output_dir(&self, output_root: &Path) -> PathBuf {
        let mut dir = output_root.to_path_buf();
        for segment in self.url_path.split('/').filter(|s| !s.is_empty()) {
            dir.push(segment);
        }
        dir
    }

    #[cfg(test)]
    pub(crate) fn children_cached(&self) -> bool {
        self.memo.children.is_cached()
    }
}

impl fmt::Debug for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Category")
            .field("path", &self.path)
            .field("url_path", &self.url_path)
            .finish()
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|e| e == extension)
}
