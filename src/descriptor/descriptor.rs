//! The parsed download descriptor and its user-facing summary.
//!
//! A [`Descriptor`] is only ever produced by a successful parse; it always
//! carries a primary media type, an object URI and a declared size.
//!
//! # Examples
//!
//! ```rust
//! use omadl::descriptor::parse_document;
//!
//! let xml = br#"<media xmlns="http://www.openmobilealliance.org/xmlns/dd">
//!     <type>audio/mpeg</type>
//!     <size>1024</size>
//!     <objectURI>http://example.com/song.mp3</objectURI>
//! </media>"#;
//!
//! let descriptor = parse_document(xml)?;
//! assert_eq!(descriptor.primary_type, "audio/mpeg");
//! assert!(descriptor.accepts_type("audio/mpeg"));
//! # Ok::<(), omadl::descriptor::ParseError>(())
//! ```

use std::fmt;

/// Media type announcing an OMA download descriptor.
pub const DESCRIPTOR_MIME: &str = "application/vnd.oma.dd+xml";

/// DRM wrapper media types that may legitimately differ from the declared type.
pub const DRM_EXEMPT_MIMES: [&str; 2] = [
    "application/vnd.oma.drm.message",
    "application/vnd.oma.drm.content",
];

/// Highest descriptor major version this crate understands.
pub const SUPPORTED_MAJOR_VERSION: u32 = 1;

/// A `DDVersion` value: `major.minor[.micro]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct DdVersion {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
}

impl fmt::Display for DdVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.micro > 0 {
            write!(f, ".{}", self.micro)?;
        }
        Ok(())
    }
}

/// A download descriptor, immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    /// Media type of the first `type` element.
    pub primary_type: String,
    /// Media types of any further `type` elements, in document order.
    pub alternate_types: Vec<String>,
    /// Human readable name of the content.
    pub name: Option<String>,
    /// Where the content itself is fetched from.
    pub object_uri: String,
    /// Declared content size in bytes.
    ///
    /// Zero when the `size` element was present but not a valid number.
    pub size_bytes: u64,
    pub major_version: u32,
    pub minor_version: u32,
    pub vendor: Option<String>,
    pub description: Option<String>,
    pub icon_uri: Option<String>,
    pub info_uri: Option<String>,
    pub next_uri: Option<String>,
    /// Where the install status report is posted to.
    pub install_notify_uri: Option<String>,
    /// Opaque installer argument. No element of the recognized grammar sets it.
    pub install_param: Option<String>,
    pub progressive_download: bool,
}

impl Descriptor {
    /// Get the descriptor version as a [`DdVersion`].
    pub fn version(&self) -> DdVersion {
        DdVersion {
            major: self.major_version,
            minor: self.minor_version,
            micro: 0,
        }
    }

    /// Whether this descriptor version can be processed.
    pub fn is_version_supported(&self) -> bool {
        self.major_version <= SUPPORTED_MAJOR_VERSION
    }

    /// Iterate the primary type followed by every alternate type.
    pub fn declared_types(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_type.as_str())
            .chain(self.alternate_types.iter().map(String::as_str))
    }

    /// Check whether `mime` matches one of the declared media types.
    ///
    /// Media type comparison is case-insensitive.
    pub fn accepts_type(&self, mime: &str) -> bool {
        self.declared_types().any(|t| t.eq_ignore_ascii_case(mime))
    }

    /// Build the summary shown to the user before the content is fetched.
    pub fn summary(&self) -> DescriptorSummary {
        DescriptorSummary {
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            mime: self.primary_type.clone(),
            version: self.version(),
            vendor: self.vendor.clone(),
            description: self.description.clone(),
        }
    }
}

/// Returns true for the DRM wrapper types exempt from the media type check.
pub fn is_drm_exempt(mime: &str) -> bool {
    DRM_EXEMPT_MIMES.iter().any(|m| m.eq_ignore_ascii_case(mime))
}

/// What the user is asked to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSummary {
    pub name: Option<String>,
    pub size_bytes: u64,
    pub mime: String,
    pub version: DdVersion,
    pub vendor: Option<String>,
    pub description: Option<String>,
}

impl fmt::Display for DescriptorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name.as_deref().unwrap_or("-"))?;
        writeln!(f, "Size: {} bytes", self.size_bytes)?;
        writeln!(f, "Type: {}", self.mime)?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Vendor: {}", self.vendor.as_deref().unwrap_or("-"))?;
        write!(
            f,
            "Description: {}",
            self.description.as_deref().unwrap_or("-")
        )
    }
}
