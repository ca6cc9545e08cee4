//! Command line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sushi", version, about = "Index and serve local glTF model libraries")]
pub struct Cli {
    /// Use this directory for the database, settings and logs
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan in the background and serve model files until Ctrl-C (default)
    Serve,
    /// Register a watch folder and scan it
    AddFolder { path: PathBuf },
    /// Unregister a watch folder and forget its assets
    RemoveFolder { folder_id: i64 },
    /// List watch folders
    Folders,
    /// Re-scan one watch folder, or all of them
    Rescan { folder_id: Option<i64> },
    /// List assets
    Assets {
        /// Only assets carrying this tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Match any of the tags instead of all of them
        #[arg(long, requires = "tags")]
        any: bool,
        #[arg(long, conflicts_with_all = ["tags", "untagged"])]
        favorites: bool,
        #[arg(long, conflicts_with = "tags")]
        untagged: bool,
    },
    /// List tags with usage counts
    Tags,
    /// Show store statistics
    Stats,
}
