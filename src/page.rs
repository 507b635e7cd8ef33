//! Pages: one content unit mapped to at most one output file.
//!
//! A [`Page`] is either an ordinary content page backed by its own
//! `<slug>.page` file, or one listing page of a category ([`PageKind::Index`]),
//! backed by the category's `index.page`. Both kinds expose the same derived
//! values (slug, url, order, template, neighbors); the index variant changes
//! how several of them are computed.
//!
//! Pages are created only by their owning [`Category`] and hold a weak
//! back-reference to it. Attribute parsing is deferred until a value that
//! needs the file contents is requested.

use crate::attributes::AttributeRecord;
use crate::category::{Category, TreeError};
use crate::naming;
use crate::reader;
use once_cell::unsync::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

/// Sort key for pages without an explicit `order`: after everything else.
pub const UNORDERED: i64 = i64::MAX;

/// Distinguishes content pages from category listing pages.
pub enum PageKind {
    Content,
    Index {
        /// 0-based position among the category's listing pages.
        page_number: usize,
        /// The slice of the category's children shown on this page.
        pages: Vec<Rc<Page>>,
    },
}

pub struct Page {
    file_path: PathBuf,
    url_path: String,
    category: Weak<Category>,
    kind: PageKind,
    data: OnceCell<Rc<AttributeRecord>>,
    slug: OnceCell<String>,
    url: OnceCell<String>,
    template_name: OnceCell<String>,
}

impl Page {
    pub(crate) fn content(file_path: PathBuf, url_path: &str, category: Weak<Category>) -> Self {
        Self {
            file_path,
            url_path: url_path.to_string(),
            category,
            kind: PageKind::Content,
            data: OnceCell::new(),
            slug: OnceCell::new(),
            url: OnceCell::new(),
            template_name: OnceCell::new(),
        }
    }

    /// A listing page. `record` is the category's already-parsed index file,
    /// shared by every listing page of that category.
    pub(crate) fn index(
        file_path: PathBuf,
        url_path: &str,
        category: Weak<Category>,
        page_number: usize,
        pages: Vec<Rc<Page>>,
        record: Rc<AttributeRecord>,
    ) -> Self {
        Self {
            file_path,
            url_path: url_path.to_string(),
            category,
            kind: PageKind::Index { page_number, pages },
            data: OnceCell::with_value(record),
            slug: OnceCell::new(),
            url: OnceCell::new(),
            template_name: OnceCell::new(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// URL path of the owning category (`""` at the root).
    pub fn url_path(&self) -> &str {
        &self.url_path
    }

    pub fn kind(&self) -> &PageKind {
        &self.kind
    }

    pub fn is_index(&self) -> bool {
        matches!(self.kind, PageKind::Index { .. })
    }

    pub fn page_number(&self) -> Option<usize> {
        match self.kind {
            PageKind::Index { page_number, .. } => Some(page_number),
            PageKind::Content => None,
        }
    }

    /// Children listed on this page; empty for content pages.
    pub fn listed_pages(&self) -> &[Rc<Page>] {
        match &self.kind {
            PageKind::Index { pages, .. } => pages,
            PageKind::Content => &[],
        }
    }

    pub fn category(&self) -> Result<Rc<Category>, TreeError> {
        self.category
            .upgrade()
            .ok_or_else(|| TreeError::Detached(self.file_path.clone()))
    }

    /// Parsed attributes, read from disk on first access.
    pub fn data(&self) -> Result<&AttributeRecord, TreeError> {
        let record = self.data.get_or_try_init(|| {
            tracing::debug!("parsing {}", self.file_path.display());
            reader::read_file(&self.file_path).map(Rc::new)
        })?;
        Ok(record)
    }

    pub fn slug(&self) -> &str {
        self.slug.get_or_init(|| match self.kind {
            PageKind::Index { page_number: 0, .. } => "index".to_string(),
            PageKind::Index { page_number, .. } => page_number.to_string(),
            PageKind::Content => naming::slug_from_path(&self.file_path),
        })
    }

    /// Human label for the page's section: the category url path, or `home`.
    pub fn path(&self) -> &str {
        if self.url_path.is_empty() {
            "home"
        } else {
            &self.url_path
        }
    }

    pub fn url(&self) -> Result<&str, TreeError> {
        let url = self.url.get_or_try_init(|| {
            let explicit = self.data()?.get_str("url");
            if !explicit.is_empty() {
                return Ok::<_, TreeError>(explicit);
            }
            Ok(match self.kind {
                PageKind::Index { page_number, .. } => {
                    naming::index_url(&self.url_path, page_number)
                }
                PageKind::Content => naming::page_url(&self.url_path, self.slug()),
            })
        })?;
        Ok(url)
    }

    /// `title` attribute, falling back to the slug with hyphens as spaces.
    /// Listing pages fall back to their category's name instead.
    pub fn title(&self) -> Result<String, TreeError> {
        let title = self.data()?.get_str("title");
        if !title.is_empty() {
            return Ok(title);
        }
        Ok(match self.kind {
            PageKind::Index { .. } => {
                naming::display_title(self.path().rsplit('/').next().unwrap_or_default())
            }
            PageKind::Content => naming::display_title(self.slug()),
        })
    }

    /// Explicit `order` attribute. Accepts `:order[int]:` or a numeric string.
    pub fn order(&self) -> Result<Option<i64>, TreeError> {
        use crate::attributes::Value;
        match self.data()?.get("order") {
            None => Ok(None),
            Some(Value::Int(n)) => Ok(Some(*n)),
            Some(Value::Str(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::Str(s)) => s.trim().parse().map(Some).map_err(|_| {
                TreeError::InvalidOrder {
                    path: self.file_path.clone(),
                    value: s.clone(),
                }
            }),
            Some(Value::List(items)) => Err(TreeError::InvalidOrder {
                path: self.file_path.clone(),
                value: items.join(", "),
            }),
        }
    }

    /// Sort key: the explicit order, or [`UNORDERED`].
    pub fn sort_key(&self) -> Result<i64, TreeError> {
        Ok(self.order()?.unwrap_or(UNORDERED))
    }

    /// Pages with an explicit `url` are link targets only and never written.
    pub fn no_render(&self) -> Result<bool, TreeError> {
        Ok(!self.data()?.get_str("url").is_empty())
    }

    pub fn sitemap(&self) -> Result<bool, TreeError> {
        Ok(!self.data()?.flag("no_sitemap") && !self.no_render()?)
    }

    /// A draft sets a truthy `draft`, or sets `published` to a falsy value.
    pub fn is_draft(&self) -> Result<bool, TreeError> {
        let data = self.data()?;
        Ok(data.flag("draft") || (data.contains("published") && !data.flag("published")))
    }

    /// Listing pages past the first are never navigation targets.
    pub fn include_in_navigation(&self) -> Result<bool, TreeError> {
        let requested = self.data()?.flag("include_in_navigation");
        Ok(match self.kind {
            PageKind::Index { page_number, .. } => requested && page_number == 0,
            PageKind::Content => requested,
        })
    }

    /// Template to render with.
    ///
    /// - content page: `template` → category `child_template` → site page default
    /// - listing page: `template` → site index default
    pub fn template_name(&self) -> Result<&str, TreeError> {
        let name = self.template_name.get_or_try_init(|| {
            let explicit = self.data()?.get_str("template");
            if !explicit.is_empty() {
                return Ok::<_, TreeError>(explicit);
            }
            let category = self.category()?;
            Ok(match self.kind {
                PageKind::Index { .. } => category.context().index_template.clone(),
                PageKind::Content => category.child_template()?,
            })
        })?;
        Ok(name)
    }

    pub fn prev(&self) -> Result<Option<Rc<Page>>, TreeError> {
        self.neighbor(-1)
    }

    pub fn next(&self) -> Result<Option<Rc<Page>>, TreeError> {
        self.neighbor(1)
    }

    /// Content pages step through the category's ordered children; listing
    /// pages step through the category's listing pages.
    fn neighbor(&self, offset: isize) -> Result<Option<Rc<Page>>, TreeError> {
        let category = self.category()?;
        let (siblings, position) = match self.kind {
            PageKind::Index { page_number, .. } => (category.index_pages()?, Some(page_number)),
            PageKind::Content => (category.children()?, category.child_position(self)?),
        };
        Ok(position
            .and_then(|i| i.checked_add_signed(offset))
            .and_then(|i| siblings.get(i))
            .cloned())
    }

    /// `{output_root}/{category url path}/{slug}.html`
    pub fn output_path(&self, output_root: &Path) -> PathBuf {
        let mut path = output_root.to_path_buf();
        for segment in self.url_path.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.push(format!("{}.html", self.slug()));
        path
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Page");
        s.field("file_path", &self.file_path)
            .field("url_path", &self.url_path);
        if let Some(n) = self.page_number() {
            s.field("page_number", &n)
                .field("listed", &self.listed_pages().len());
        }
        s.finish()
    }
}
