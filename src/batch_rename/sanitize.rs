//! Filesystem-safe name normalization.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum length of a sanitized name in characters.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Name used when nothing usable is left after sanitizing.
pub const FALLBACK_NAME: &str = "unnamed";

static RE_RESERVED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("Failed to compile reserved character regex"));

static RE_CONTROL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x1F\x7F]").expect("Failed to compile control character regex"));

/// Matches two or more consecutive dots.
static RE_CONSECUTIVE_DOTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.{2,}").expect("Failed to create regex pattern for consecutive dots"));

static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

/// Normalize a candidate name into a filesystem-safe, non-empty string.
///
/// Reserved characters `< > : " / \ | ? *` and control characters are removed,
/// repeated dots and whitespace are collapsed, and the result is limited to
/// [`MAX_FILENAME_LENGTH`] characters while keeping the extension when possible.
///
/// ```rust
/// use map_rename::batch_rename::sanitize_name;
///
/// assert_eq!(sanitize_name("Report: Q1/Q2?.pdf"), "Report Q1Q2.pdf");
/// assert_eq!(sanitize_name("  a...b  "), "a.b");
/// assert_eq!(sanitize_name("   "), "unnamed");
/// ```
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    if name.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    let sanitized = RE_RESERVED.replace_all(name, "");
    let sanitized = RE_CONTROL.replace_all(&sanitized, "");
    let sanitized = RE_CONSECUTIVE_DOTS.replace_all(&sanitized, ".");
    let sanitized = RE_WHITESPACE.replace_all(&sanitized, " ");
    let sanitized = truncate_to_limit(sanitized.trim());

    if sanitized.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        sanitized
    }
}

/// Split a name into stem and extension, where the extension includes the leading dot.
///
/// Leading dots do not start an extension, so `.bashrc` has no extension.
///
/// ```rust
/// use map_rename::batch_rename::split_extension;
///
/// assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
/// assert_eq!(split_extension("folder"), ("folder", ""));
/// ```
#[must_use]
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if name[..pos].chars().any(|c| c != '.') => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    }
}

/// Shorten the name to the length limit, preferring to cut the stem and keep the extension.
fn truncate_to_limit(name: &str) -> String {
    if name.chars().count() <= MAX_FILENAME_LENGTH {
        return name.to_string();
    }

    let (stem, extension) = split_extension(name);
    let extension_length = extension.chars().count();
    if extension_length < MAX_FILENAME_LENGTH {
        let stem: String = stem.chars().take(MAX_FILENAME_LENGTH - extension_length).collect();
        // A cut stem must not end in whitespace or a dot that would merge with the extension dot
        let stem = stem.trim_end_matches(|c: char| c.is_whitespace() || c == '.');
        format!("{stem}{extension}")
    } else {
        let truncated: String = name.chars().take(MAX_FILENAME_LENGTH).collect();
        truncated.trim_end().to_string()
    }
}
