//! Shared utility functions.
//!
//! This module contains helpers used by the HTTP transport to describe a
//! response before its body is streamed.
//!
//! - [`headers`] - Content size, media type and content name extraction

pub mod headers;

pub use headers::{
    content_name_from_url, content_size, media_type, parse_content_range_total, parse_media_type,
    DEFAULT_CONTENT_NAME,
};
