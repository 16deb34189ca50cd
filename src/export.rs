//! Static export: one Hugo page bundle per stored record.
//!
//! Layout: `OUT/content/books/<safe-title>_<id>/index.md`, plus `cover.<ext>` when the
//! record carries cover bytes. The id suffix keeps same-titled books apart.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use upon::{Engine, Template};

use crate::Record;
use crate::engine::db_ops::RecordStore;
use crate::engine::tools::safe_file_name;
use crate::utils::config::ExportConsts;

/// Markdown page with YAML front matter. Every scalar goes through `yaml` (double-quoted).
const BOOK_TEMPLATE: &str = r#"---
title: {{ title|yaml }}
authors: {{ authors|yaml }}
genres: {{ genres|yaml }}
language: {{ language|yaml }}
annotation: {{ annotation|yaml }}
cover: {{ cover|yaml }}
file_name: {{ file_name|yaml }}
series: {{ series|yaml }}
series_number: {{ series_number|yaml }}
draft: false
---
{% if cover %}
![Cover image]({{ cover }})
{% endif %}
{{ annotation }}
"#;

/// Values exposed to [`BOOK_TEMPLATE`].
#[derive(Serialize)]
struct BookPage<'a> {
    title: &'a str,
    authors: &'a [String],
    genres: &'a [String],
    language: &'a str,
    annotation: &'a str,
    cover: Option<String>,
    file_name: &'a str,
    series: Option<&'a str>,
    series_number: Option<i64>,
}

/// Compiled page template; shared by all export threads.
pub struct PageRenderer {
    engine: Engine<'static>,
    template: Template<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        let template = engine
            .compile(BOOK_TEMPLATE)
            .context("compile page template")?;
        Ok(Self { engine, template })
    }

    /// Render the `index.md` text for `record`; `cover` is the cover file name, if any.
    pub fn render(&self, record: &Record, cover: Option<&str>) -> Result<String> {
        let page = BookPage {
            title: record.title(),
            authors: &record.authors,
            genres: &record.genres,
            language: &record.language,
            annotation: &record.annotation,
            cover: cover.map(str::to_string),
            file_name: &record.entry_name,
            series: record.series.as_deref(),
            series_number: record.series_number,
        };
        self.template
            .render(&self.engine, &page)
            .to_string()
            .with_context(|| format!("render page for {}", record.entry_name))
    }
}

/// `<safe-title>_<id>`. Fails for records that were never stored.
pub fn bundle_dir_name(record: &Record) -> Result<String> {
    let id = record.id.with_context(|| {
        format!(
            "{} has no id; only stored records can be exported",
            record.entry_name
        )
    })?;
    Ok(format!("{}_{}", safe_file_name(record.title()), id))
}

/// File extension for cover bytes, sniffed from the magic number (JPEG when unknown).
pub fn cover_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG") {
        "png"
    } else if bytes.starts_with(b"GIF8") {
        "gif"
    } else {
        "jpg"
    }
}

/// Directory holding all bundles below `out_dir`.
pub fn content_dir(out_dir: &Path) -> PathBuf {
    ExportConsts::CONTENT_DIR
        .iter()
        .fold(out_dir.to_path_buf(), |dir, part| dir.join(part))
}

fn write_bundle(base: &Path, record: &Record, renderer: &PageRenderer) -> Result<()> {
    let dir = base.join(bundle_dir_name(record)?);
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

    let cover = match record.cover.as_deref() {
        Some(bytes) if !bytes.is_empty() => {
            let name = format!("{}.{}", ExportConsts::COVER_STEM, cover_extension(bytes));
            let path = dir.join(&name);
            fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
            Some(name)
        }
        _ => None,
    };

    let page = renderer.render(record, cover.as_deref())?;
    let path = dir.join(ExportConsts::INDEX_FILE);
    fs::write(&path, page).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write one bundle per record under `out_dir`. Returns the number of bundles written.
pub fn export_site(records: &[Record], out_dir: &Path) -> Result<usize> {
    let base = content_dir(out_dir);
    fs::create_dir_all(&base).with_context(|| format!("create {}", base.display()))?;
    let renderer = PageRenderer::new()?;
    records
        .par_iter()
        .try_for_each(|record| write_bundle(&base, record, &renderer))?;
    Ok(records.len())
}

/// Full scan of `store`, then [`export_site`].
pub fn export_from_store(store: &dyn RecordStore, out_dir: &Path) -> Result<usize> {
    let records = store.list_all().context("load books")?;
    export_site(&records, out_dir)
}

/// Custom [`upon`] formatter for YAML front matter.
mod addons {
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};

    /// YAML double-quoted scalar.
    fn write_quoted(f: &mut upon_fmt::Formatter<'_>, s: &str) -> std::fmt::Result {
        f.write_char('"')?;
        for c in s.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
                c => f.write_char(c)?,
            }
        }
        f.write_char('"')
    }

    /// Strings quoted, lists as flow sequences, none as an empty string.
    fn yaml_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::None => write_quoted(f, "")?,
            Value::String(s) => write_quoted(f, s)?,
            Value::List(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    yaml_formatter(f, item)?;
                }
                f.write_char(']')?;
            }
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.add_formatter("yaml", yaml_formatter);
    }
}
