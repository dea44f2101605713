use std::time::Duration;

use reqwest::{
    Client, StatusCode, Url,
    header::{ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
};

use super::{Error, info::HttpDownloadInfo, request_utils::RequestBuilderExt};

/// Accepts only absolute `http`/`https` URLs.
pub(super) fn validate_url(raw_url: &str) -> Result<Url, Error> {
    let url = Url::parse(raw_url.trim())
        .map_err(|e| Error::InvalidArgument(format!("invalid URL {raw_url:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::InvalidArgument(format!(
            "unsupported scheme {scheme:?}, must be http or https"
        ))),
    }
}

/// Issues the initial request and reads size, range support, and filename hints from
/// its headers. The body is never read.
pub(super) async fn probe(
    client: &Client,
    url: &Url,
    timeout: Option<Duration>,
) -> Result<HttpDownloadInfo, Error> {
    let response = client
        .get(url.clone())
        .with_optional_timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_connect() {
                Error::Connection {
                    code: None,
                    url: url.to_string(),
                }
            } else {
                Error::Network(e)
            }
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::Connection {
            code: Some(status.as_u16()),
            url: url.to_string(),
        });
    }

    let headers = response.headers();
    Ok(HttpDownloadInfo::default()
        .extract_and_set_filename(
            url.as_str(),
            &headers.get(CONTENT_DISPOSITION),
            &headers.get(CONTENT_TYPE),
        )
        .extract_and_set_content_length(&headers.get(CONTENT_LENGTH))
        .extract_and_set_accepts_ranges(&headers.get(ACCEPT_RANGES)))
}
