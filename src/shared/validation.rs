use lazy_static::lazy_static;
use regex::Regex;

use crate::shared::constants::{ANY_MIME_TYPE, MAX_FILENAME_BYTES, UNNAMED_FILE};

lazy_static! {
    /// Characters never allowed in a stored filename
    /// - Replaced: `< > : " | ? * \ /`
    pub static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r#"[<>:"|?*\\/]"#).unwrap();
}

/// Sanitize a client-supplied filename before it is stored.
///
/// Drops any leading path, replaces unsafe characters with `_` and caps the
/// result at 255 bytes while keeping the extension intact.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit('/').next().unwrap_or(filename);
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(base, "_");

    if cleaned.is_empty() {
        return UNNAMED_FILE.to_string();
    }

    truncate_preserving_extension(&cleaned, MAX_FILENAME_BYTES)
}

/// Extension of `name` including the leading dot, or `""` when there is none.
///
/// Leading dots of hidden files (e.g. `.env`) are not treated as an extension.
pub fn file_extension(name: &str) -> &str {
    split_extension(name).1
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if name[..idx].chars().any(|c| c != '.') => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

fn truncate_preserving_extension(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }

    let (stem, ext) = split_extension(name);
    if ext.len() >= max_bytes {
        return truncate_at_char_boundary(name, max_bytes).to_string();
    }

    format!(
        "{}{}",
        truncate_at_char_boundary(stem, max_bytes - ext.len()),
        ext
    )
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Check a MIME type against the configured allow-list.
///
/// Entries match exactly, as a `type/*` wildcard, or `*/*` for anything.
/// Parameters such as `; charset=utf-8` are ignored.
pub fn is_mime_type_allowed(content_type: &str, allowed: &[String]) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    if essence.is_empty() {
        return false;
    }

    allowed.iter().any(|entry| {
        let entry = entry.trim().to_ascii_lowercase();
        if entry == ANY_MIME_TYPE {
            true
        } else if let Some(base) = entry.strip_suffix("/*") {
            essence
                .strip_prefix(base)
                .is_some_and(|rest| rest.starts_with('/'))
        } else {
            essence == entry
        }
    })
}
