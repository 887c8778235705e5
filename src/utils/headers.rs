//! Response header helpers.
//!
//! Small functions extracting what a transfer reports in its `Started`
//! event: content size, media type and a file name for the content.

use reqwest::{
    header::{CONTENT_RANGE, CONTENT_TYPE},
    Response, Url,
};

/// Name used when a URL has no usable last path segment.
pub const DEFAULT_CONTENT_NAME: &str = "download";

/// Extract the content size, preferring the total of a Content-Range header.
///
/// Returns `None` when the server announces no size at all.
pub fn content_size(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range_total)
        .or_else(|| response.content_length())
}

/// Parse Content-Range header to extract total size.
///
/// Content-Range header format: "bytes start-end/total"
///
/// ```rust
/// use omadl::utils::parse_content_range_total;
///
/// assert_eq!(parse_content_range_total("bytes 0-1023/2048"), Some(2048));
/// ```
pub fn parse_content_range_total(content_range: &str) -> Option<u64> {
    let (_, total) = content_range.rsplit_once('/')?;
    total.trim().parse::<u64>().ok()
}

/// The media type of a response, without parameters and lowercased.
pub fn media_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_media_type)
}

/// Strip parameters from a Content-Type value.
///
/// ```rust
/// use omadl::utils::parse_media_type;
///
/// assert_eq!(
///     parse_media_type("application/vnd.oma.dd+xml; charset=UTF-8").as_deref(),
///     Some("application/vnd.oma.dd+xml")
/// );
/// ```
pub fn parse_media_type(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim();
    if essence.is_empty() {
        None
    } else {
        Some(essence.to_ascii_lowercase())
    }
}

/// Derive a file name from the last path segment of `url`.
pub fn content_name_from_url(url: &Url) -> String {
    let name: String = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| {
            form_urlencoded::parse(segment.as_bytes())
                .map(|(key, val)| [key, val].concat())
                .collect()
        })
        .unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." {
        DEFAULT_CONTENT_NAME.to_string()
    } else {
        name
    }
}
