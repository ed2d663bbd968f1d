use std::path::Path;

use crate::constants::EXPORT_SUFFIX;

const MAX_STEM_LEN: usize = 200;

/// Sanitize a file name for cross-platform use.
/// Replaces characters invalid on Windows, macOS or Linux with `_`.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // Leading/trailing spaces and dots are problematic on Windows
    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');

    let upper = trimmed.to_ascii_uppercase();
    let reserved = matches!(upper.as_str(), "CON" | "PRN" | "AUX" | "NUL")
        || ((upper.starts_with("COM") || upper.starts_with("LPT"))
            && upper.len() == 4
            && upper.as_bytes()[3].is_ascii_digit()
            && upper.as_bytes()[3] != b'0');
    if reserved {
        return format!("_{}", trimmed);
    }

    let truncated: String = trimmed.chars().take(MAX_STEM_LEN).collect();
    if truncated.is_empty() {
        "untitled".to_string()
    } else {
        truncated
    }
}

/// Name offered in the save dialog: `report.pdf` becomes `report_annotated.pdf`.
pub fn suggested_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    format!("{}{}.pdf", sanitize_filename(stem), EXPORT_SUFFIX)
}
