//! Output file naming.
//!
//! Recovered names come from inside a carrier and are untrusted, so they are
//! reduced to a safe character set before touching the file system.

use std::path::{Path, PathBuf};

/// Returns true for characters allowed in a recovered file name.
fn is_safe_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | ' ')
}

/// Keeps letters, digits, `.`, `_`, `-` and space.
///
/// Returns `fallback` if nothing usable is left (empty, only spaces, or only
/// dots). Sanitizing an already safe name returns it unchanged.
pub fn sanitize_file_name(name: &str, fallback: &str) -> String {
    let cleaned: String = name.chars().filter(|&c| is_safe_char(c)).collect();

    if cleaned.trim().is_empty() || cleaned.chars().all(|c| c == '.') {
        return fallback.to_string();
    }

    cleaned
}

/// Normalizes a recovered image extension to `".ext"` form.
///
/// `None` (undecodable) and empty extensions become `fallback`.
pub fn normalize_extension(extension: Option<&str>, fallback: &str) -> String {
    let Some(ext) = extension else {
        return fallback.to_string();
    };

    let cleaned: String = ext
        .chars()
        .filter(|&c| is_safe_char(c) && c != ' ')
        .collect();
    let stem = cleaned.trim_start_matches('.');

    if stem.is_empty() {
        return fallback.to_string();
    }

    format!(".{stem}")
}

/// `<dir>/<stem><suffix><extension>` next to `path`.
pub fn sibling_with_suffix(path: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = path.parent().unwrap_or_else(|| Path::new(""));

    dir.join(format!("{stem}{suffix}{extension}"))
}

/// Forces `path` to carry `extension` (without dot), replacing any other.
pub fn with_forced_extension(path: &Path, extension: &str) -> PathBuf {
    let matches = path
        .extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
        .unwrap_or(false);

    if matches {
        path.to_path_buf()
    } else {
        path.with_extension(extension)
    }
}
