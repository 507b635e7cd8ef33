//! End-to-end builds of `fixtures/site/`.
//!
//! Each test copies the fixture site into a temp directory, builds it through
//! the public API (or the compiled binary), and inspects the output tree.

use pagetree::{BuildError, Site};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use walkdir::WalkDir;

fn fixture_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    for entry in WalkDir::new(&src).into_iter().filter_map(|e| e.ok()) {
        let rel = entry.path().strip_prefix(&src).unwrap();
        let dest = tmp.path().join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).unwrap();
        } else {
            fs::copy(entry.path(), &dest).unwrap();
        }
    }
    tmp
}

/// Every file under `root`, relative path → contents.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read_to_string(e.path()).unwrap())
        })
        .collect()
}

fn file_list(root: &Path) -> Vec<String> {
    snapshot(root)
        .keys()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .collect()
}

#[test]
fn builds_expected_files() {
    let tmp = fixture_site();
    let site = Site::load(tmp.path(), false).unwrap();
    let summary = site.save().unwrap();
    let out = tmp.path().join(".output");

    assert_eq!(
        file_list(&out),
        vec![
            "about.html",
            "blog/first-post.html",
            "blog/index.html",
            "blog/second-post.html",
            "index.html",
            "static/css/site.css",
            "static/sitemap.xml",
        ]
    );
    assert_eq!(summary.pages_written, 5);
    assert_eq!(summary.pages_skipped, 1);
    assert_eq!(summary.static_files, 1);
}

#[test]
fn pages_carry_content_and_navigation() {
    let tmp = fixture_site();
    let site = Site::load(tmp.path(), false).unwrap();
    site.save().unwrap();
    let out = tmp.path().join(".output");

    let about = fs::read_to_string(out.join("about.html")).unwrap();
    assert!(about.contains("<title>About</title>"));
    assert!(about.contains("<strong>one person</strong>"));
    assert!(about.contains(r#"href="/static/css/site.css""#));

    // Navigation: Home (0), Blog (10), About (20), GitHub (30)
    let home = about.find(r#"href="/">Home"#).unwrap();
    let blog = about.find(r#"href="/blog">Blog"#).unwrap();
    let about_link = about.find(r#"href="/about">About"#).unwrap();
    let github = about.find(r#"href="https://github.com/example">GitHub"#).unwrap();
    assert!(home < blog && blog < about_link && about_link < github);

    let listing = fs::read_to_string(out.join("blog/index.html")).unwrap();
    let first = listing.find("/blog/first-post").unwrap();
    let second = listing.find("/blog/second-post").unwrap();
    assert!(first < second);
    assert!(!listing.contains("Unfinished"));

    let post = fs::read_to_string(out.join("blog/first-post.html")).unwrap();
    assert!(post.contains("<em>first</em>"));
    assert!(post.contains(r#"href="/blog/second-post" rel="next""#));
}

#[test]
fn sitemap_lists_rendered_pages() {
    let tmp = fixture_site();
    let site = Site::load(tmp.path(), false).unwrap();
    site.save().unwrap();

    let xml = fs::read_to_string(tmp.path().join(".output/static/sitemap.xml")).unwrap();
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    for loc in [
        "https://example.com/",
        "https://example.com/about",
        "https://example.com/blog",
        "https://example.com/blog/first-post",
        "https://example.com/blog/second-post",
    ] {
        assert!(xml.contains(&format!("<loc>{loc}</loc>")), "missing {loc}");
    }
    assert!(!xml.contains("github.com"));
    assert!(!xml.contains("unfinished"));
}

#[test]
fn drafts_included_on_request() {
    let tmp = fixture_site();
    let site = Site::load(tmp.path(), true).unwrap();
    site.save().unwrap();
    assert!(tmp.path().join(".output/blog/unfinished.html").exists());
}

#[test]
fn rebuild_is_idempotent() {
    let tmp = fixture_site();
    let site = Site::load(tmp.path(), false).unwrap();
    let out = tmp.path().join(".output");

    site.save().unwrap();
    let first = snapshot(&out);
    site.recompile().unwrap();
    assert_eq!(snapshot(&out), first);
}

#[test]
fn failed_rebuild_leaves_output_untouched() {
    let tmp = fixture_site();
    let site = Site::load(tmp.path(), false).unwrap();
    let out = tmp.path().join(".output");
    site.save().unwrap();
    let before = snapshot(&out);

    let pages = tmp.path().join("dynamic/pages");
    fs::write(pages.join("about.page"), ":title: Changed\n").unwrap();
    fs::write(pages.join("blog/broken.page"), ":order[int]: later\n").unwrap();

    let err = site.recompile().unwrap_err();
    assert!(matches!(err, BuildError::Tree(_)));
    assert!(err.to_string().contains("broken.page"));
    assert_eq!(snapshot(&out), before);

    // Fixing the file makes the next rebuild succeed
    fs::remove_file(pages.join("blog/broken.page")).unwrap();
    site.recompile().unwrap();
    let about = fs::read_to_string(out.join("about.html")).unwrap();
    assert!(about.contains("<title>Changed</title>"));
}

#[test]
fn output_override() {
    let tmp = fixture_site();
    let target = tmp.path().join("public");
    let site = Site::load(tmp.path(), false).unwrap().with_output(&target);
    site.save().unwrap();
    assert!(target.join("index.html").exists());
    assert!(!tmp.path().join(".output").exists());
}

#[test]
fn cli_build_and_check() {
    let tmp = fixture_site();
    let bin = env!("CARGO_BIN_EXE_pagetree");

    let check = Command::new(bin)
        .arg("check")
        .arg(tmp.path())
        .output()
        .unwrap();
    assert!(check.status.success());
    assert!(String::from_utf8_lossy(&check.stdout).contains("Site is valid: 5 pages"));
    assert!(!tmp.path().join(".output").exists());

    let build = Command::new(bin)
        .arg("build")
        .arg(tmp.path())
        .arg("--output")
        .arg(tmp.path().join("dist"))
        .output()
        .unwrap();
    assert!(build.status.success());
    assert!(tmp.path().join("dist/blog/first-post.html").exists());
}

#[test]
fn cli_fails_on_broken_site() {
    let tmp = fixture_site();
    fs::write(
        tmp.path().join("dynamic/pages/bad.page"),
        ":weight[float]: 1.5\n",
    )
    .unwrap();
    let status = Command::new(env!("CARGO_BIN_EXE_pagetree"))
        .arg("build")
        .arg(tmp.path())
        .status()
        .unwrap();
    assert!(!status.success());
}

#[test]
fn cli_gen_config_parses() {
    let out = Command::new(env!("CARGO_BIN_EXE_pagetree"))
        .arg("gen-config")
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    let config: pagetree::config::SiteConfig = toml::from_str(&text).unwrap();
    assert_eq!(config.page_size, 5);
}
