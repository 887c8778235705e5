//! Descriptor module containing the OMA download descriptor grammar.
//!
//! This module turns the small XML manifest that announces an out-of-band
//! download into a validated [`Descriptor`].
//!
//! # Overview
//!
//! - [`descriptor`] - The `Descriptor` record, its summary and media type constants
//! - [`parser`] - The per-session, event-driven parser and its errors
//! - [`text`] - Whitespace stripping and entity decoding
//! - [`version`] - The `DDVersion` grammar
//! - [`xml`] - Byte stream tokenizing into parser events
//!
//! # Examples
//!
//! ```rust
//! use omadl::descriptor::{parse_document, ParseError};
//!
//! let xml = br#"<media><type>video/mp4</type><size>10</size></media>"#;
//! assert_eq!(
//!     parse_document(xml),
//!     Err(ParseError::MissingMandatoryTag("objectURI"))
//! );
//! ```

pub mod descriptor;
pub mod parser;
pub mod text;
pub mod version;
pub mod xml;

pub use descriptor::{
    is_drm_exempt, DdVersion, Descriptor, DescriptorSummary, DESCRIPTOR_MIME, DRM_EXEMPT_MIMES,
    SUPPORTED_MAJOR_VERSION,
};
pub use parser::{parse, DescriptorEvent, Element, ParseError, ParseSession};
pub use text::{decode_entities, normalize_uri, strip_whitespace};
pub use version::parse_version;
pub use xml::{feed_document, parse_document};
