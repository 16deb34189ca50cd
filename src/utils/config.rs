//! Application configuration constants.
//! Names, limits and timings in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    db_filename: String,
    settings_filename: String,
    db_env_var: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                db_filename: format!("{pkg}.db"),
                settings_filename: format!(".{pkg}.toml"),
                db_env_var: format!("{}_DB", pkg.to_uppercase()),
            }
        })
    }

    /// Default library database file name (relative to the working directory).
    pub fn db_filename(&self) -> &str {
        &self.db_filename
    }

    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }

    /// Environment variable that overrides the database path.
    pub fn db_env_var(&self) -> &str {
        &self.db_env_var
    }
}

// ---- Pipeline ----

/// Upper bound on buffer preallocation from a (possibly lying) entry size header (bytes). 64 MB.
pub const MAX_ENTRY_PREALLOC: u64 = 64 * 1024 * 1024;

/// How often a producer blocked on a full channel re-checks the cancel flag.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(200);

// ---- Export ----

/// Layout of the exported content tree.
pub struct ExportConsts;

impl ExportConsts {
    /// Bundle directory below the output root.
    pub const CONTENT_DIR: [&'static str; 2] = ["content", "books"];
    /// Markdown file inside each bundle.
    pub const INDEX_FILE: &'static str = "index.md";
    /// Cover file stem inside each bundle (extension sniffed from the image bytes).
    pub const COVER_STEM: &'static str = "cover";
}
