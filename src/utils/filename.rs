use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use std::path::Path;

pub const SOURCE_SUFFIX: &str = ".m4a";
pub const TARGET_SUFFIX: &str = ".mp3";

/// Name used when an upload arrives without a usable filename
pub const FALLBACK_UPLOAD_NAME: &str = "audio.m4a";

/// Name used when a converted download has no usable filename
pub const FALLBACK_DOWNLOAD_NAME: &str = "audio.mp3";

/// Suggested download name for a converted file.
///
/// Textual substitution of the first `.m4a` occurrence, not extension aware:
/// `foo.m4a.m4a` becomes `foo.mp3.m4a` and names without `.m4a` pass through.
pub fn download_name(filename: &str) -> String {
    filename.replacen(SOURCE_SUFFIX, TARGET_SUFFIX, 1)
}

/// Name the server attaches to its response. Unlike [`download_name`] this
/// always ends up with an `.mp3` suffix.
pub fn converted_name(filename: &str) -> String {
    let name = download_name(filename);
    if name.to_lowercase().ends_with(TARGET_SUFFIX) {
        return name;
    }

    let lower = name.to_lowercase();
    match lower.rfind('.') {
        Some(idx) if idx > 0 && lower[idx..].eq_ignore_ascii_case(SOURCE_SUFFIX) => {
            format!("{}{}", &name[..idx], TARGET_SUFFIX)
        }
        _ => format!("{}{}", name, TARGET_SUFFIX),
    }
}

/// Strip any path and characters that are unsafe in a filename or header.
pub fn sanitize_filename(filename: &str) -> String {
    sanitize_filename_or(filename, FALLBACK_UPLOAD_NAME)
}

/// [`sanitize_filename`] with a caller-chosen name for when nothing usable is left.
pub fn sanitize_filename_or(filename: &str, fallback: &str) -> String {
    // Browsers on Windows may send full paths
    let normalized = filename.replace('\\', "/");
    let name = Path::new(&normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from upload name: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    let sanitized = sanitized.trim().to_string();
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        return fallback.to_string();
    }

    // Limit length safely for UTF-8
    if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    }
}

/// `Content-Disposition` value with an ASCII fallback and an RFC 5987 name.
pub fn attachment_disposition(filename: &str) -> String {
    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .take(128)
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        FALLBACK_DOWNLOAD_NAME
    } else {
        &ascii_filename
    };

    let encoded_filename = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    )
}
