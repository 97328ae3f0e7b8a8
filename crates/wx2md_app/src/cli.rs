use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use wx2md_core::DEFAULT_ARTICLE_HOST;
use wx2md_engine::PackageFormat;

use crate::history_file::DEFAULT_HISTORY_FILE;
use crate::logging::LogDestination;

#[derive(Parser, Debug)]
#[command(name = "wx2md")]
#[command(about = "Convert WeChat public-account articles to Markdown with local images")]
#[command(version)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Where log output goes
    #[arg(long, global = true, value_enum, default_value = "file")]
    pub log: LogDestination,

    /// History file (RON)
    #[arg(long, global = true, env = "WX2MD_HISTORY", default_value = DEFAULT_HISTORY_FILE)]
    pub history_file: PathBuf,

    /// Host substring every article URL must contain
    #[arg(long, global = true, env = "WX2MD_HOST", default_value = DEFAULT_ARTICLE_HOST)]
    pub host: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "WX2MD_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Preview an article: title and raw content markup
    Fetch {
        url: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert an article to Markdown and download its images
    Convert {
        url: String,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        /// Package layout
        #[arg(short, long, value_enum, default_value = "dir")]
        format: FormatArg,
        /// Print the conversion result as JSON instead of writing files
        #[arg(long)]
        json: bool,
    },

    /// Inspect and manage saved articles
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Package every converted article in history into one archive
    Export {
        /// Archive path
        #[arg(short, long, default_value = "wechat_articles.zip")]
        out: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List saved articles, newest first
    List,
    /// Print the Markdown (or preview markup) of a saved article
    Show {
        id: String,
        /// Print the full entry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a saved conversion to disk without refetching
    Save {
        id: String,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        #[arg(short, long, value_enum, default_value = "dir")]
        format: FormatArg,
    },
    /// Delete one saved article
    Remove { id: String },
    /// Delete all saved articles
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Markdown file only
    Md,
    /// Zip with Markdown and images
    Zip,
    /// Markdown plus an images/ directory
    Dir,
}

impl From<FormatArg> for PackageFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Md => PackageFormat::Markdown,
            FormatArg::Zip => PackageFormat::Zip,
            FormatArg::Dir => PackageFormat::Directory,
        }
    }
}
