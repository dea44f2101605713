use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use reqwest::{Url, header::HeaderValue};

use super::{Error, extension};

const FALLBACK_FILENAME: &str = "download";
pub(super) const MAX_DUPLICATE_ATTEMPTS: u32 = 10_000;

static FILENAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\*?=(?:UTF-8''|)?"?([^";\r\n]+)"?"#)
        .expect("filename pattern is valid")
});

pub(super) fn percent_decode(raw: &str) -> String {
    percent_encoding::percent_decode_str(raw)
        .decode_utf8_lossy()
        .into_owned()
}

/// Keeps only the final path component so a header cannot point outside the target directory.
fn last_component(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next()?.trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

pub(super) fn extract_filename_from_header(
    content_disposition: &Option<&HeaderValue>,
) -> Option<String> {
    let value = content_disposition.and_then(|value| value.to_str().ok())?;
    let captures = FILENAME_REGEX.captures(value)?;
    last_component(&percent_decode(&captures[1]))
}

pub(super) fn extract_filename_from_url(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    last_component(&percent_decode(segment))
}

fn append_extension(mut name: String, content_type: &Option<&HeaderValue>) -> String {
    let extension = content_type
        .and_then(|value| value.to_str().ok())
        .and_then(extension::guess_extension);
    if let Some(extension) = extension {
        if !name.to_ascii_lowercase().ends_with(extension) {
            name.push_str(extension);
        }
    }
    name
}

pub(super) fn extract_filename(
    raw_url: &str,
    content_disposition: &Option<&HeaderValue>,
    content_type: &Option<&HeaderValue>,
) -> String {
    if let Some(filename) = extract_filename_from_header(content_disposition) {
        return filename;
    };
    let name = extract_filename_from_url(raw_url).unwrap_or(String::from(FALLBACK_FILENAME));
    append_extension(name, content_type)
}

/// Picks the first unused path among `name`, `(1) name`, `(2) name`, ...
pub(super) fn resolve_duplicate(directory: &Path, name: &str) -> Result<PathBuf, Error> {
    let candidate = directory.join(name);
    if !candidate.exists() {
        return Ok(candidate);
    }
    for count in 1..=MAX_DUPLICATE_ATTEMPTS {
        let candidate = directory.join(format!("({count}) {name}"));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(Error::NameExhausted(name.to_string()))
}
