//! Utility functions for slugs, escaping, log truncation and file system checks.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static SLUG_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9áéíóúüñ]+").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a character boundary near `max` bytes with an
/// ellipsis and a count of the dropped bytes.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Convert a post title into a file-name slug.
///
/// Runs of lowercase ASCII letters, digits and Spanish accented letters are
/// kept and joined with `-`; everything else is a separator.
///
/// ```ignore
/// assert_eq!(slugify("¿Cómo ahorrar 100€ al mes?"), "cómo-ahorrar-100-al-mes");
/// ```
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let slug = SLUG_WORD
        .find_iter(&lower)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() { "post".to_string() } else { slug }
}

/// Capitalize the first character of a string.
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Turn a file stem like `regla-1-1-1` into `Regla 1 1 1`.
pub fn title_from_stem(stem: &str) -> String {
    stem.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(upcase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escape text for an HTML element body or a quoted attribute.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Take at most `max` characters of `s`.
pub fn take_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    fs::write(&probe_path, b"").await?;
    let _ = fs::remove_file(&probe_path).await;
    info!("Output directory is writable");
    Ok(())
}
