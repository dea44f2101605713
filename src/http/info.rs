use reqwest::header::HeaderValue;

use super::filename_utils;

#[derive(Debug, Clone)]
pub struct HttpDownloadInfo {
    filename: String,
    content_length: Option<u64>,
    accepts_ranges: bool,
}

impl HttpDownloadInfo {
    pub(super) fn default() -> Self {
        Self {
            filename: String::new(),
            content_length: None,
            accepts_ranges: false,
        }
    }

    pub(super) fn extract_and_set_filename(
        mut self,
        raw_url: &str,
        content_disposition: &Option<&HeaderValue>,
        content_type: &Option<&HeaderValue>,
    ) -> Self {
        self.filename =
            filename_utils::extract_filename(raw_url, content_disposition, content_type);
        self
    }

    pub(super) fn extract_and_set_content_length(
        mut self,
        content_length: &Option<&HeaderValue>,
    ) -> Self {
        // A negative or malformed length fails to parse as u64 and is treated as unknown.
        self.content_length = content_length
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        self
    }

    pub(super) fn extract_and_set_accepts_ranges(
        mut self,
        accept_ranges: &Option<&HeaderValue>,
    ) -> Self {
        self.accepts_ranges = match accept_ranges {
            Some(value) => value
                .to_str()
                .map_or(false, |s| s.to_ascii_lowercase().contains("bytes")),
            None => false,
        };
        self
    }

    #[cfg(test)]
    pub(super) fn set_content_length(mut self, content_length: Option<u64>) -> Self {
        self.content_length = content_length;
        self
    }

    #[cfg(test)]
    pub(super) fn set_accepts_ranges(mut self, accepts_ranges: bool) -> Self {
        self.accepts_ranges = accepts_ranges;
        self
    }
}

impl HttpDownloadInfo {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn accepts_ranges(&self) -> bool {
        self.accepts_ranges
    }
}
