//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use crate::config::CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// penmark static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Site root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root
    #[arg(short = 'C', long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a new site with the bundled default theme
    Init {
        /// the name(path) of site directory, related to `root`
        name: Option<PathBuf>,
    },

    /// Build the site once into the output directory
    Build,

    /// Build, serve the output directory and rebuild on change
    Watch {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create a new post in the content directory
    Post(PostArgs),
}

/// Fields written into a new post's frontmatter
#[derive(clap::Args, Debug, Clone)]
pub struct PostArgs {
    /// Post title
    #[arg(short, long)]
    pub title: String,

    /// Publication date as YYYY-MM-DD (default: today)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Author name (default: `[base].author`)
    #[arg(short, long)]
    pub author: Option<String>,

    /// Author image URL (default: `[base].author_image`)
    #[arg(long)]
    pub author_image: Option<String>,

    /// Short description shown on the index page
    #[arg(long)]
    pub description: Option<String>,

    /// Overwrite an existing post with the same date and title
    #[arg(short, long)]
    pub force: bool,
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }
}
