//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every page leads with
//! its position among its siblings and its title; the output file (or the
//! external URL, for link-only pages) is shown after an arrow. Categories are
//! headers, with their contents indented one level below.
//!
//! # Output Format
//!
//! ## Tree
//!
//! ```text
//! / (2 pages, 1 listing page)
//!     001 About → about.html
//!     002 GitHub → https://github.com/example (link only)
//!     blog/ (2 pages, 1 listing page)
//!         001 First post → blog/first-post.html
//!         002 Second post → blog/second-post.html
//! ```
//!
//! ## Build
//!
//! ```text
//! Wrote 6 pages to .output
//!     Directories: 3
//!     Skipped: 1 (link only)
//!     Static files: 1
//!     Sitemap: 5 entries
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions do no I/O beyond reading the (already cached) tree.

use crate::category::{Category, TreeError};
use crate::site::Site;
use crate::writer::BuildSummary;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`.
fn count(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Category header: url path with a trailing slash, plus counts.
///
/// ```text
/// blog/ (12 pages, 3 listing pages)
/// ```
fn category_header(category: &Category) -> Result<String, TreeError> {
    let name = if category.url_path().is_empty() {
        "/".to_string()
    } else {
        format!("{}/", category.slug())
    };
    Ok(format!(
        "{} ({}, {})",
        name,
        count(category.child_count()?, "page", "pages"),
        count(category.index_page_count()?, "listing page", "listing pages")
    ))
}

// ============================================================================
// Tree
// ============================================================================

/// Format the content tree: categories, their pages, and where each lands.
pub fn format_tree(site: &Site) -> Result<Vec<String>, TreeError> {
    let mut lines = Vec::new();
    format_category(site.root(), site.output_root(), 0, &mut lines)?;
    Ok(lines)
}

fn format_category(
    category: &Category,
    output_root: &Path,
    depth: usize,
    lines: &mut Vec<String>,
) -> Result<(), TreeError> {
    lines.push(format!("{}{}", indent(depth), category_header(category)?));
    for (i, page) in category.children()?.iter().enumerate() {
        let target = if page.no_render()? {
            format!("{} (link only)", page.url()?)
        } else {
            let path = page.output_path(output_root);
            path.strip_prefix(output_root)
                .unwrap_or(&path)
                .display()
                .to_string()
        };
        let draft = if page.is_draft()? { " [draft]" } else { "" };
        lines.push(format!(
            "{}{} {}{} → {}",
            indent(depth + 1),
            format_index(i + 1),
            page.title()?,
            draft,
            target
        ));
    }
    for sub in category.categories()?.iter() {
        format_category(sub, output_root, depth + 1, lines)?;
    }
    Ok(())
}

pub fn print_tree(site: &Site) -> Result<(), TreeError> {
    for line in format_tree(site)? {
        println!("{}", line);
    }
    Ok(())
}

// ============================================================================
// Build summary
// ============================================================================

/// Format the result of a build.
pub fn format_summary(summary: &BuildSummary, output_root: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Wrote {} to {}",
        count(summary.pages_written, "page", "pages"),
        output_root.display()
    )];
    lines.push(format!("{}Directories: {}", indent(1), summary.directories));
    if summary.pages_skipped > 0 {
        lines.push(format!(
            "{}Skipped: {} (link only)",
            indent(1),
            summary.pages_skipped
        ));
    }
    if summary.static_files > 0 {
        lines.push(format!("{}Static files: {}", indent(1), summary.static_files));
    }
    lines.push(format!(
        "{}Sitemap: {}",
        indent(1),
        count(summary.sitemap_entries, "entry", "entries")
    ));
    lines
}

pub fn print_summary(summary: &BuildSummary, output_root: &Path) {
    for line in format_summary(summary, output_root) {
        println!("{}", line);
    }
}

/// One line for `check`: nothing was written.
pub fn format_check(summary: &BuildSummary) -> String {
    format!(
        "Site is valid: {} across {}",
        count(summary.pages_written, "page", "pages"),
        count(summary.directories, "directory", "directories")
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn format_index_single_digit() {
        assert_eq!(format_index(1), "001");
    }

    #[test]
    fn format_index_triple_digit() {
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn count_forms() {
        assert_eq!(count(1, "page", "pages"), "1 page");
        assert_eq!(count(0, "entry", "entries"), "0 entries");
    }

    #[test]
    fn tree_lists_categories_and_pages() {
        let fx = SiteFixture::new();
        fx.page("about.page", ":title: About\n:order[int]: 1\n");
        fx.page("github.page", ":title: GitHub\n:url: https://github.com/example\n");
        fx.page("blog/first_post.page", ":title: First post\n");
        let site = fx.site();

        assert_eq!(
            format_tree(&site).unwrap(),
            vec![
                "/ (2 pages, 1 listing page)",
                "    001 About → about.html",
                "    002 GitHub → https://github.com/example (link only)",
                "    blog/ (1 page, 1 listing page)",
                "        001 First post → blog/first-post.html",
            ]
        );
    }

    #[test]
    fn tree_marks_drafts() {
        let fx = SiteFixture::new();
        fx.page("wip.page", ":title: WIP\n:draft: yes\n");
        let site = fx.site_with_drafts();
        let lines = format_tree(&site).unwrap();
        assert_eq!(lines[1], "    001 WIP [draft] → wip.html");
    }

    #[test]
    fn summary_lines() {
        let summary = BuildSummary {
            directories: 3,
            pages_written: 6,
            pages_skipped: 1,
            static_files: 0,
            sitemap_entries: 5,
        };
        assert_eq!(
            format_summary(&summary, Path::new(".output")),
            vec![
                "Wrote 6 pages to .output",
                "    Directories: 3",
                "    Skipped: 1 (link only)",
                "    Sitemap: 5 entries",
            ]
        );
    }

    #[test]
    fn check_line() {
        let summary = BuildSummary {
            directories: 1,
            pages_written: 1,
            ..BuildSummary::default()
        };
        assert_eq!(format_check(&summary), "Site is valid: 1 page across 1 directory");
    }

    #[test]
    fn fixture_site_tree() {
        let tmp = setup_fixtures();
        let site = Site::load(tmp.path(), false).unwrap();
        let lines = format_tree(&site).unwrap();
        assert!(lines[0].starts_with("/ ("));
        assert!(lines.iter().any(|l| l.trim_start().starts_with("blog/")));
    }
}
