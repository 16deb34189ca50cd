use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Import FB2 book archives into a SQLite library and export it as Hugo content.
#[derive(Clone, Parser)]
#[command(name = "fb2shelf")]
#[command(about = "Import FB2 archives into a library database; export it as Hugo content bundles.")]
pub struct Cli {
    /// Path to the library database. Default: fb2shelf.db (or FB2SHELF_DB, or .fb2shelf.toml).
    #[arg(long, short, global = true)]
    pub db: Option<PathBuf>,

    /// Verbose output (debug logging, progress bar).
    #[arg(long, short = 'v', global = true, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Read every recognized document in ARCHIVE (zip file or directory) and upsert it.
    Import {
        /// Zip archive or directory containing FB2 files.
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Number of worker threads.
        #[arg(long, short = 'w')]
        workers: Option<usize>,

        /// Recognized entry suffix (case-insensitive).
        #[arg(long, short = 's')]
        suffix: Option<String>,

        /// Capacity of the work queue between the archive reader and the workers.
        #[arg(long)]
        channel_cap: Option<usize>,
    },
    /// Write one Hugo page bundle per stored book under OUT/content/books.
    Export {
        /// Output directory (Hugo site root).
        #[arg(long, short = 'o', value_name = "OUT")]
        out: PathBuf,
    },
}
