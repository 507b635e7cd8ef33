//! Shared test utilities for the pagetree test suite.
//!
//! Provides a throwaway site builder and lookup helpers that work with the
//! content tree (`Site`, `Category`, `Page`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fx = SiteFixture::new();
//! fx.page("blog/index.page", ":title: Blog\n");
//! fx.page("blog/first_post.page", ":title: First\n");
//!
//! let site = fx.site();
//! let blog = site.root().category("blog").unwrap();
//! let post = find_page(&blog.children().unwrap(), "first-post");
//! assert_eq!(post.url().unwrap(), "/blog/first-post");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::page::Page;
use crate::site::Site;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// An empty site in a temp directory with the stock layout
/// (`dynamic/pages` content root, `.output` output).
pub struct SiteFixture {
    tmp: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("dynamic/pages")).unwrap();
        Self { tmp }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn content_root(&self) -> PathBuf {
        self.root().join("dynamic/pages")
    }

    pub fn output_root(&self) -> PathBuf {
        self.root().join(".output")
    }

    /// Write a page file relative to the content root, creating parents.
    pub fn page(&self, rel: &str, contents: &str) {
        self.write(rel, contents);
    }

    /// Write any file relative to the content root.
    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.content_root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// Create an empty category directory.
    pub fn dir(&self, rel: &str) {
        fs::create_dir_all(self.content_root().join(rel)).unwrap();
    }

    pub fn site(&self) -> Site {
        Site::new(self.root(), &SiteConfig::default(), false).unwrap()
    }

    pub fn site_with_drafts(&self) -> Site {
        Site::new(self.root(), &SiteConfig::default(), true).unwrap()
    }
}

// =========================================================================
// Page lookups: panic with a clear message on miss
// =========================================================================

/// Find a page by slug. Panics if not found.
pub fn find_page(pages: &[Rc<Page>], slug: &str) -> Rc<Page> {
    pages
        .iter()
        .find(|p| p.slug() == slug)
        .cloned()
        .unwrap_or_else(|| {
            panic!(
                "page '{}' not found. Available: {:?}",
                slug,
                page_slugs(pages)
            )
        })
}

/// Slugs in list order.
pub fn page_slugs(pages: &[Rc<Page>]) -> Vec<&str> {
    pages.iter().map(|p| p.slug()).collect()
}

/// Read an output file relative to a root. Panics with the path on miss.
pub fn read_output(root: &Path, rel: &str) -> String {
    let path = root.join(rel);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}
