//! Resolve CLI settings: defaults, then `.fb2shelf.toml`, then environment, then flags.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::IngestConfig;
use crate::utils::config::PackagePaths;

/// Resolved settings for one CLI run.
#[derive(Clone, Debug)]
pub struct Settings {
    pub db_path: PathBuf,
    pub verbose: bool,
    pub ingest: IngestConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(PackagePaths::get().db_filename()),
            verbose: false,
            ingest: IngestConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SettingsFile {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    db_path: Option<String>,
    workers: Option<usize>,
    suffix: Option<String>,
    channel_cap: Option<usize>,
    verbose: Option<bool>,
}

/// Load the settings file from `dir` if present. Returns None if missing or invalid (invalid is logged).
pub(crate) fn load_settings_file(dir: &Path) -> Option<SettingsFile> {
    let path = dir.join(PackagePaths::get().settings_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_settings_file(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub(crate) fn parse_settings_file(s: &str) -> Result<SettingsFile, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite settings field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $target:expr, $field:ident) => {
        if let Some(v) = $sec.$field.clone() {
            $target.$field = v;
        }
    };
}

/// Apply file values (only fields present in the file). Call before env and CLI.
pub(crate) fn apply_file_to_settings(file: &SettingsFile, settings: &mut Settings) {
    let sec = &file.settings;
    if let Some(ref p) = sec.db_path {
        settings.db_path = PathBuf::from(p);
    }
    apply_file_opt!(sec, settings, verbose);
    apply_file_opt!(sec, settings.ingest, workers);
    apply_file_opt!(sec, settings.ingest, suffix);
    apply_file_opt!(sec, settings.ingest, channel_cap);
}

/// Apply the database path from the environment (`.env` is loaded first by the binary).
pub(crate) fn apply_env_to_settings(settings: &mut Settings) {
    if let Ok(p) = std::env::var(PackagePaths::get().db_env_var())
        && !p.trim().is_empty()
    {
        settings.db_path = PathBuf::from(p);
    }
}

/// Defaults, then the settings file in `dir`, then the environment. CLI flags are applied by the caller.
pub fn resolve_settings(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    if let Some(file) = load_settings_file(dir) {
        apply_file_to_settings(&file, &mut settings);
    }
    apply_env_to_settings(&mut settings);
    settings
}
