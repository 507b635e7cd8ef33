//! Site configuration module.
//!
//! Handles loading and validating the `config.toml` at the site root. Every
//! key is optional: missing keys take their stock defaults, so a site only
//! lists the values it wants to change.
//!
//! ## Site Layout
//!
//! ```text
//! my-site/
//! ├── config.toml              # Optional, this module
//! ├── dynamic/
//! │   ├── pages/               # content_dir: the category/page tree
//! │   │   ├── index.page
//! │   │   ├── about.page
//! │   │   └── blog/
//! │   │       ├── index.page
//! │   │       └── first_post.page
//! │   └── templates/           # templates_dir: watched for changes
//! └── static/                  # static_dir: copied to <output>/static
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! base_url = ""                    # Absolute site URL used in the sitemap
//! content_dir = "dynamic/pages"    # Relative to the site root
//! templates_dir = "dynamic/templates"
//! static_dir = "static"
//! output_dir = ".output"
//! content_extension = "page"       # Files ending in .page are pages
//! page_size = 5                    # Children per listing page
//!
//! [templates]
//! page = "base.html"               # Default template for pages
//! index = "parent_base.html"       # Default template for listing pages
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Content root not found: {0}")]
    MissingContentRoot(PathBuf),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute URL the site is published under, used by the sitemap.
    pub base_url: String,
    /// Directory holding the category/page tree, relative to the site root.
    pub content_dir: String,
    /// Template directory, relative to the site root. Only watched.
    pub templates_dir: String,
    /// Static assets directory, copied to `<output>/static`.
    pub static_dir: String,
    /// Output directory, relative to the site root unless absolute.
    pub output_dir: String,
    /// Extension (without the dot) that marks a file as a page.
    pub content_extension: String,
    /// Number of children listed per index page.
    pub page_size: i64,
    /// Default template names.
    pub templates: TemplatesConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            content_dir: "dynamic/pages".to_string(),
            templates_dir: "dynamic/templates".to_string(),
            static_dir: "static".to_string(),
            output_dir: ".output".to_string(),
            content_extension: "page".to_string(),
            page_size: 5,
            templates: TemplatesConfig::default(),
        }
    }
}

/// Fallback template names when a page does not choose its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Template for ordinary pages whose category sets no `child_template`.
    pub page: String,
    /// Template for category listing pages.
    pub index: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            page: "base.html".to_string(),
            index: "parent_base.html".to_string(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_page_size(self.page_size)?;
        if self.content_extension.trim().is_empty() {
            return Err(ConfigError::Validation(
                "content_extension must not be empty".into(),
            ));
        }
        if self.content_extension.starts_with('.') {
            return Err(ConfigError::Validation(
                "content_extension must not start with a dot".into(),
            ));
        }
        if self.templates.page.trim().is_empty() || self.templates.index.trim().is_empty() {
            return Err(ConfigError::Validation(
                "templates.page and templates.index must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Validated page size as a count.
    pub fn page_size(&self) -> Result<usize, ConfigError> {
        validate_page_size(self.page_size)
    }

    pub fn content_root(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.content_dir)
    }

    pub fn static_root(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.static_dir)
    }

    pub fn templates_root(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.templates_dir)
    }

    /// Output directory; absolute `output_dir` values are used as-is.
    pub fn output_root(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.output_dir)
    }
}

/// Check a pagination size and convert it to a count.
pub fn validate_page_size(page_size: i64) -> Result<usize, ConfigError> {
    if page_size <= 0 {
        return Err(ConfigError::Validation(format!(
            "page_size must be greater than zero (got {page_size})"
        )));
    }
    usize::try_from(page_size)
        .map_err(|_| ConfigError::Validation(format!("page_size {page_size} is too large")))
}

// =============================================================================
// Config loading
// =============================================================================

/// Load `config.toml` from the site root. A missing file means all defaults;
/// keys the file leaves out are filled from `SiteConfig::default()`.
pub fn load_config(site_root: &Path) -> Result<SiteConfig, ConfigError> {
    if !site_root.is_dir() {
        return Err(ConfigError::MissingContentRoot(site_root.to_path_buf()));
    }
    let config_path = site_root.join("config.toml");
    let config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)?;
        toml::from_str::<SiteConfig>(&content)?
    } else {
        SiteConfig::default()
    };
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pagetree configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Absolute URL the site is published under. Prefixed to every sitemap entry.
base_url = ""

# The category/page tree. Each directory is a category, each .page file a page,
# and index.page describes the category's own listing page.
content_dir = "dynamic/pages"

# Templates live here. The directory is watched in `watch` mode so template
# edits trigger a rebuild.
templates_dir = "dynamic/templates"

# Copied verbatim to <output_dir>/static on every build.
static_dir = "static"

# Where the compiled site is written.
output_dir = ".output"

# Files with this extension are pages.
content_extension = "page"

# Number of child pages per listing page. A category can override this with
# `:page-size[int]:` in its index.page.
page_size = 5

# ---------------------------------------------------------------------------
# Default templates
# ---------------------------------------------------------------------------
[templates]
# Used by pages that set no `:template:` and whose category index sets no
# `:child-template:`.
page = "base.html"

# Used by category listing pages that set no `:template:`.
index = "parent_base.html"
"##
}
