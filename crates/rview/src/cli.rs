#![forbid(unsafe_code)]

//! Command-line interface for the `rview` binary.
//!
//! Every option can also come from an `RVIEW_*` environment variable; a flag
//! on the command line wins over the environment.
//!
//! ```text
//! rview render [--data-dir DIR | --base-url URL] [--out FILE] [--category NAME]... [--advance N]
//! rview format [FILE]
//! ```

use std::error::Error;
use std::path::PathBuf;

use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use rview_core::{Category, FileSource, HttpSource, ProblemSource};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::page::render_page;

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "RVIEW_LOG";

/// rview
///
/// Renders problem comparison pages and formats mixed markup.
#[derive(Debug, Parser)]
#[command(name = "rview")]
#[command(about = "rview: problem comparison renderer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Cmd,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Cmd {
    /// Render a standalone HTML page of the selected categories.
    Render(RenderArgs),
    /// Format markup from a file or stdin and print the HTML.
    Format(FormatArgs),
}

/// Trait for executing CLI subcommands.
#[async_trait]
pub trait Command {
    async fn execute(self) -> Result<(), Box<dyn Error>>;
}

#[async_trait]
impl Command for Cmd {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        match self {
            Self::Render(args) => args.execute().await,
            Self::Format(args) => args.execute().await,
        }
    }
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

/// Arguments for `rview render`.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Directory holding the category data files.
    #[arg(long, env = "RVIEW_DATA_DIR", value_name = "DIR", conflicts_with = "base_url")]
    pub data_dir: Option<PathBuf>,

    /// Base URL the category data files are served from.
    #[arg(long, env = "RVIEW_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Write the page here instead of stdout.
    #[arg(long, short, env = "RVIEW_OUT", value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Category to include; repeat for several. Defaults to all four.
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<Category>,

    /// Advance every category this many problems before rendering.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub advance: usize,
}

impl RenderArgs {
    /// The selected categories, all of them when none were named.
    #[must_use]
    pub fn selected(&self) -> Vec<Category> {
        if self.categories.is_empty() {
            Category::ALL.to_vec()
        } else {
            self.categories.clone()
        }
    }

    /// The data source: the base URL if given, else the data directory,
    /// else the current directory.
    #[must_use]
    pub fn source(&self) -> Box<dyn ProblemSource> {
        match (&self.base_url, &self.data_dir) {
            (Some(url), _) => Box::new(HttpSource::new(url.clone())),
            (None, Some(dir)) => Box::new(FileSource::new(dir.clone())),
            (None, None) => Box::new(FileSource::new(".")),
        }
    }
}

#[async_trait]
impl Command for RenderArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let categories = self.selected();
        debug!(?categories, advance = self.advance, "rendering page");
        let source = self.source();
        let page = render_page(source.as_ref(), &categories, self.advance).await;
        match &self.out {
            Some(path) => tokio::fs::write(path, page).await?,
            None => print!("{page}"),
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// format
// ---------------------------------------------------------------------------

/// Arguments for `rview format`.
#[derive(Debug, Args)]
pub struct FormatArgs {
    /// Markup file; reads stdin when omitted or `-`.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[async_trait]
impl Command for FormatArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let input = match self.file.as_deref() {
            Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path).await?,
            _ => {
                let mut buf = String::new();
                tokio::io::stdin().read_to_string(&mut buf).await?;
                buf
            }
        };
        println!("{}", rview_text::format_plain_text(&input));
        Ok(())
    }
}
