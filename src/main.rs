use clap::{Parser, Subcommand};
use pagetree::{Site, config, output, watch};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site location and build flags shared by every command that reads a site.
#[derive(clap::Args, Clone)]
struct SiteArgs {
    /// Site directory (holds config.toml, dynamic/pages, static)
    #[arg(default_value = ".")]
    site: PathBuf,

    /// Output directory (overrides `output_dir` from config.toml)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Include draft pages
    #[arg(long)]
    drafts: bool,
}

#[derive(Parser)]
#[command(name = "pagetree")]
#[command(about = "Compile a directory tree of .page files into a static site")]
#[command(long_about = "\
Compile a directory tree of .page files into a static site

Directories become categories, .page files become pages, and each category's
index.page describes its paginated listing.

Site structure:

  my-site/
  ├── config.toml                  # Optional, see `pagetree gen-config`
  ├── dynamic/
  │   ├── pages/
  │   │   ├── index.page           # Home listing (/)
  │   │   ├── about.page           # /about
  │   │   └── blog/
  │   │       ├── index.page       # /blog, /blog/1, ...
  │   │       └── first_post.page  # /blog/first-post
  │   └── templates/               # Watched for changes
  └── static/                      # Copied to <output>/static

Page format:

  :title: First post
  :order[int]: 10
  :tags[list]:
    rust
    web
  :content:
  Markdown body, until the next header.")]
#[command(version)]
struct Cli {
    /// Log every parsed file and discovered category
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile the site into the output directory
    Build(SiteArgs),
    /// Build, then rebuild on every change until interrupted
    Watch(SiteArgs),
    /// Render everything in memory and report problems without writing
    Check(SiteArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build(args) => {
            let site = open_site(&args)?;
            println!("==> Building {}", site.site_root().display());
            let summary = site.save()?;
            output::print_summary(&summary, site.output_root());
        }
        Command::Watch(args) => {
            let site = open_site(&args)?;
            println!(
                "==> Watching {} (Ctrl+C to stop)",
                site.site_root().display()
            );
            let output_root = site.output_root().to_path_buf();
            watch::watch(&site, |summary| {
                output::print_summary(summary, &output_root);
            })?;
        }
        Command::Check(args) => {
            let site = open_site(&args)?;
            println!("==> Checking {}", site.site_root().display());
            output::print_tree(&site)?;
            let summary = site.check()?;
            println!("{}", output::format_check(&summary));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pagetree=debug" } else { "pagetree=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn open_site(args: &SiteArgs) -> Result<Site, config::ConfigError> {
    let site = Site::load(&args.site, args.drafts)?;
    Ok(match &args.output {
        Some(output) => site.with_output(output),
        None => site,
    })
}
