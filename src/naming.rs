//! Slug and URL derivation from source paths.
//!
//! Everything a page or category is called on the published site comes from
//! its position on disk:
//!
//! - `pages/blog/first_post.page` → slug `first-post`
//! - `pages/blog/2024/` → category url path `blog/2024`
//! - url path `blog` + slug `first-post` → url `/blog/first-post`
//!
//! Underscores in file names become hyphens in slugs; directory names are
//! used as-is.

use std::path::Path;

/// Slug for a page file: the file name up to its first `.`, underscores → hyphens.
///
/// - `first_post.page` → `first-post`
/// - `index.page` → `index`
/// - `notes.draft.page` → `notes`
pub fn slug_from_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();
    stem.replace('_', "-")
}

/// URL path of a sub-category: the parent's url path plus the directory name.
///
/// - `("", "blog")` → `blog`
/// - `("blog", "2024")` → `blog/2024`
pub fn child_url_path(parent: &str, dir_name: &str) -> String {
    if parent.is_empty() {
        dir_name.to_string()
    } else {
        format!("{parent}/{dir_name}")
    }
}

/// Base URL of a category: `/` for the root, `/{url_path}` otherwise.
pub fn category_url(url_path: &str) -> String {
    let trimmed = url_path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// URL of a page with `slug` inside the category at `url_path`.
///
/// At the root, `index` collapses to `/`.
pub fn page_url(url_path: &str, slug: &str) -> String {
    let base = url_path.trim_matches('/');
    match (base.is_empty(), slug == "index") {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{slug}"),
        (false, _) => format!("/{base}/{slug}"),
    }
}

/// URL of listing page `page_number` for the category at `url_path`.
///
/// Page 0 is the category URL itself; later pages append `/{n}`.
pub fn index_url(url_path: &str, page_number: usize) -> String {
    let base = category_url(url_path);
    match (page_number, base.as_str()) {
        (0, _) => base,
        (n, "/") => format!("/{n}"),
        (n, _) => format!("{base}/{n}"),
    }
}

/// Human-readable fallback title: hyphens become spaces.
pub fn display_title(slug: &str) -> String {
    slug.replace('-', " ")
}
