//! # pagetree
//!
//! A content tree compiler for static websites. The filesystem is the data
//! source: directories become categories, `.page` files become pages, and
//! each category's `index.page` describes its own paginated listing.
//!
//! # Architecture: Lazy Tree, Two-Phase Write
//!
//! ```text
//! dynamic/pages/  →  Category / Page tree  →  BuildPlan  →  .output/
//!                    (lazy, memoized)         (in memory)    (commit)
//! ```
//!
//! - **Reading** is lazy. Nothing is parsed until a value that needs it is
//!   asked for, and every derived value is memoized on its node until the
//!   node's cache is busted.
//! - **Writing** happens in two phases. The whole site is rendered into
//!   memory first; the output directory is only touched once that succeeded,
//!   so a broken page never leaves a half-written site behind.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`attributes`] | Typed attribute values and the per-file record |
//! | [`reader`] | `:name[type]: value` content file parser |
//! | [`page`] | Content pages and category listing pages |
//! | [`category`] | Directory nodes: discovery, ordering, drafts, pagination, caching |
//! | [`memo`] | Invalidatable memo slots backing every derived value |
//! | [`naming`] | Slug and URL derivation from paths |
//! | [`site`] | Root of the tree, site-wide aggregates, build entry points |
//! | [`writer`] | Plan / commit build phases |
//! | [`render`] | Template seam, render context views, stock maud layouts |
//! | [`sitemap`] | Sitemap seam and XML renderer |
//! | [`assets`] | Static directory copy |
//! | [`watch`] | Rebuild-on-change loop |
//! | [`config`] | `config.toml` loading, validation, merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Filesystem Order Is the Tie-Break
//!
//! Pages sort by their `order` attribute; pages without one come last. Among
//! equal keys the order is the directory listing sorted by file name, so the
//! same tree always produces the same site on every platform.
//!
//! ## Single-Threaded Tree
//!
//! The tree is `Rc` + `RefCell`. A [`site::Site`] cannot cross threads, which
//! makes "one rebuild at a time" a compile-time property instead of a lock.
//!
//! ## Maud Layouts Behind a Trait
//!
//! The stock layouts are [Maud](https://maud.lambda.xyz/) closures: checked at
//! compile time and escaped by default. They sit behind
//! [`render::TemplateEngine`], and the render context is plain serde data,
//! so any other engine can be plugged in.

pub mod assets;
pub mod attributes;
pub mod category;
pub mod config;
pub mod memo;
pub mod naming;
pub mod output;
pub mod page;
pub mod reader;
pub mod render;
pub mod site;
pub mod sitemap;
pub mod watch;
pub mod writer;

pub use site::{BuildError, Site};

#[cfg(test)]
pub(crate) mod test_helpers;
