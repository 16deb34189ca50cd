//! Name and path utilities

use std::path::{Path, PathBuf};

/// Convert absolute path to relative path from base
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// Path as an entry name: forward slashes on every platform, like names inside a zip.
pub fn path_to_entry_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Last component of an entry name.
pub fn entry_file_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// OS metadata files that sneak into archives (macOS resource forks, Windows thumbnails).
pub fn is_os_hidden_file(name: &str) -> bool {
    let file_name = entry_file_name(name);
    if name.starts_with("__MACOSX/") || name.contains("/__MACOSX/") {
        return true;
    }
    match file_name {
        ".DS_Store" | "Thumbs.db" | "ehthumbs.db" | "Desktop.ini" => true,
        // macOS resource fork files start with ._
        _ => file_name.starts_with("._"),
    }
}

/// True if the entry should be handed to a worker: suffix matches (ASCII case-insensitive)
/// and the name is not OS clutter.
pub fn is_recognized_entry(name: &str, suffix: &str) -> bool {
    let file_name = entry_file_name(name);
    if file_name.len() <= suffix.len() || is_os_hidden_file(name) {
        return false;
    }
    let split = file_name.len() - suffix.len();
    file_name.is_char_boundary(split) && file_name[split..].eq_ignore_ascii_case(suffix)
}

/// Filesystem-safe folder name for a title: lowercase, whitespace runs become `-`,
/// characters reserved on common filesystems are dropped.
pub fn safe_file_name(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.trim().chars() {
        if c.is_whitespace() || c == '-' {
            pending_dash = !out.is_empty();
            continue;
        }
        if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.')
        {
            continue;
        }
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        out.extend(c.to_lowercase());
    }
    if out.is_empty() {
        "untitled".to_string()
    } else {
        out
    }
}
