//! CLI command handlers: import and export.

use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::engine::arg_parser::{Cli, Commands};
use crate::export::export_from_store;
use crate::ingest::import_archive;
use crate::utils::{Settings, resolve_settings, setup_logging};

use super::db_ops::SqliteStore;

/// Settings from file and environment, then CLI flags on top. Sets up logging.
fn setup_settings(cli: &Cli) -> Settings {
    let mut settings = resolve_settings(Path::new("."));
    if let Some(db) = &cli.db {
        settings.db_path = db.clone();
    }
    if let Some(verbose) = cli.verbose {
        settings.verbose = verbose;
    }
    if let Commands::Import {
        workers,
        suffix,
        channel_cap,
        ..
    } = &cli.command
    {
        if let Some(n) = workers {
            settings.ingest.workers = *n;
        }
        if let Some(s) = suffix {
            settings.ingest.suffix = s.clone();
        }
        if let Some(n) = channel_cap {
            settings.ingest.channel_cap = *n;
        }
    }
    setup_logging(settings.verbose);
    settings
}

/// Run the selected subcommand.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let settings = setup_settings(cli);
    debug!("{} settings: {:#?}", env!("CARGO_PKG_NAME"), settings);
    let store = SqliteStore::open(&settings.db_path)?;
    match &cli.command {
        Commands::Import { archive, .. } => {
            import_archive(archive, &store, &settings)?;
            println!("Import succeeded.");
        }
        Commands::Export { out } => {
            let n = export_from_store(&store, out)?;
            debug!("exported {} books to {}", n, out.display());
            println!("Export succeeded.");
        }
    }
    Ok(())
}
