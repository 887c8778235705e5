//! Event-driven descriptor parsing.
//!
//! A [`ParseSession`] consumes a finite sequence of [`DescriptorEvent`]s and
//! produces a [`Descriptor`]. All element tracking lives in the session, so
//! concurrent parses never share state.
//!
//! The first error latches: every later event is ignored and
//! [`ParseSession::finish`] reports that error.
//!
//! # Examples
//!
//! ```rust
//! use omadl::descriptor::{DescriptorEvent, ParseSession};
//!
//! let mut session = ParseSession::new();
//! for event in [
//!     DescriptorEvent::Start("media"),
//!     DescriptorEvent::Start("type"),
//!     DescriptorEvent::Text("text/plain"),
//!     DescriptorEvent::End("type"),
//!     DescriptorEvent::Start("size"),
//!     DescriptorEvent::Text("12"),
//!     DescriptorEvent::End("size"),
//!     DescriptorEvent::Start("objectURI"),
//!     DescriptorEvent::Text("http://example.com/"),
//!     DescriptorEvent::Text("notes.txt"),
//!     DescriptorEvent::End("objectURI"),
//!     DescriptorEvent::End("media"),
//! ] {
//!     session.feed(event);
//! }
//!
//! let descriptor = session.finish()?;
//! assert_eq!(descriptor.object_uri, "http://example.com/notes.txt");
//! # Ok::<(), omadl::descriptor::ParseError>(())
//! ```

use super::descriptor::Descriptor;
use super::text::{decode_entities, normalize_uri, strip_whitespace};
use super::version::parse_version;

use thiserror::Error;
use tracing::{debug, warn};

/// Errors produced while parsing a descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An element outside the descriptor grammar was opened.
    #[error("unknown element <{0}>")]
    UnknownElement(String),

    /// An element was closed without having been opened.
    #[error("unexpected closing tag </{0}>")]
    InternalParsingError(String),

    /// A `DDVersion` value does not follow `major.minor[.micro]`.
    #[error("invalid DDVersion \"{0}\"")]
    InvalidVersionString(String),

    /// One of `type`, `size` or `objectURI` never appeared, or `type` and
    /// `objectURI` only appeared empty.
    #[error("missing mandatory element <{0}>")]
    MissingMandatoryTag(&'static str),

    /// The byte stream is not well-formed XML or not UTF-8.
    #[error("malformed descriptor: {0}")]
    Malformed(String),
}

/// A single step of a descriptor document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorEvent<'a> {
    /// An element was opened. Carries the local name.
    Start(&'a str),
    /// An element was closed. Carries the local name.
    End(&'a str),
    /// Raw character data, entities not yet decoded.
    Text(&'a str),
}

/// The thirteen element names of the descriptor grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Type,
    Size,
    ObjectUri,
    Media,
    Name,
    InstallNotifyUri,
    NextUrl,
    DdVersion,
    Description,
    Vendor,
    InfoUrl,
    IconUri,
    ProgressiveDownloadFlag,
}

impl Element {
    /// Every recognized element.
    pub const ALL: [Element; 13] = [
        Element::Type,
        Element::Size,
        Element::ObjectUri,
        Element::Media,
        Element::Name,
        Element::InstallNotifyUri,
        Element::NextUrl,
        Element::DdVersion,
        Element::Description,
        Element::Vendor,
        Element::InfoUrl,
        Element::IconUri,
        Element::ProgressiveDownloadFlag,
    ];

    /// Look up an element by its tag name. Matching is case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Element::ALL.into_iter().find(|e| e.name() == name)
    }

    /// The tag name as written in a descriptor.
    pub fn name(self) -> &'static str {
        match self {
            Element::Type => "type",
            Element::Size => "size",
            Element::ObjectUri => "objectURI",
            Element::Media => "media",
            Element::Name => "name",
            Element::InstallNotifyUri => "installNotifyURI",
            Element::NextUrl => "nextURL",
            Element::DdVersion => "DDVersion",
            Element::Description => "description",
            Element::Vendor => "vendor",
            Element::InfoUrl => "infoURL",
            Element::IconUri => "iconURI",
            Element::ProgressiveDownloadFlag => "progressiveDownloadFlag",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Which mandatory elements have been seen.
#[derive(Debug, Default, Clone, Copy)]
struct MandatoryTracker {
    type_seen: bool,
    size_seen: bool,
    uri_seen: bool,
}

impl MandatoryTracker {
    fn first_missing(&self) -> Option<&'static str> {
        if !self.type_seen {
            Some(Element::Type.name())
        } else if !self.size_seen {
            Some(Element::Size.name())
        } else if !self.uri_seen {
            Some(Element::ObjectUri.name())
        } else {
            None
        }
    }
}

/// An element instance that is currently open, with its text so far.
#[derive(Debug)]
struct OpenElement {
    element: Element,
    text: String,
}

/// Per-parse state of the descriptor parser.
#[derive(Debug, Default)]
pub struct ParseSession {
    descriptor: Descriptor,
    mandatory: MandatoryTracker,
    /// Open instance count per element, indexed by [`Element::index`].
    open_counts: [u32; 13],
    open: Vec<OpenElement>,
    error: Option<ParseError>,
}

impl ParseSession {
    /// Start an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// The error latched so far, if any.
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// The notification URI captured so far.
    ///
    /// Available even when the session later fails, so a rejection can still
    /// be reported to the server.
    pub fn install_notify_uri(&self) -> Option<&str> {
        self.descriptor.install_notify_uri.as_deref()
    }

    /// Latch `error` unless one is already latched.
    pub fn fail(&mut self, error: ParseError) {
        if self.error.is_none() {
            debug!("Descriptor parse latched error: {}", error);
            self.error = Some(error);
        }
    }

    /// Consume one event.
    pub fn feed(&mut self, event: DescriptorEvent<'_>) {
        if self.error.is_some() {
            return;
        }
        match event {
            DescriptorEvent::Start(name) => self.start_element(name),
            DescriptorEvent::End(name) => self.end_element(name),
            DescriptorEvent::Text(text) => self.characters(text),
        }
    }

    /// End the stream and produce the descriptor.
    pub fn finish(self) -> Result<Descriptor, ParseError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if let Some(missing) = self.mandatory.first_missing() {
            return Err(ParseError::MissingMandatoryTag(missing));
        }
        Ok(self.descriptor)
    }

    fn start_element(&mut self, name: &str) {
        let Some(element) = Element::from_name(name) else {
            self.fail(ParseError::UnknownElement(name.to_string()));
            return;
        };
        self.open_counts[element.index()] += 1;
        self.open.push(OpenElement {
            element,
            text: String::new(),
        });
    }

    fn end_element(&mut self, name: &str) {
        let element = match Element::from_name(name) {
            Some(element) if self.open_counts[element.index()] > 0 => element,
            _ => {
                self.fail(ParseError::InternalParsingError(name.to_string()));
                return;
            }
        };
        self.open_counts[element.index()] -= 1;

        let Some(position) = self.open.iter().rposition(|o| o.element == element) else {
            self.fail(ParseError::InternalParsingError(name.to_string()));
            return;
        };
        let closed = self.open.remove(position);
        self.route(closed);
    }

    fn characters(&mut self, text: &str) {
        // Text outside any element, e.g. before the root, is dropped.
        if let Some(current) = self.open.last_mut() {
            current.text.push_str(text);
        }
    }

    /// Store the joined text of a closed element instance.
    fn route(&mut self, closed: OpenElement) {
        let OpenElement { element, text } = closed;
        let d = &mut self.descriptor;

        match element {
            Element::Type => {
                let mime = normalize_uri(&text);
                if mime.is_empty() {
                    debug!("Ignoring empty type element");
                } else if self.mandatory.type_seen {
                    d.alternate_types.push(mime);
                } else {
                    d.primary_type = mime;
                    self.mandatory.type_seen = true;
                }
            }
            Element::Size => {
                let digits = strip_whitespace(&text);
                match parse_size(&digits) {
                    Some(size) => d.size_bytes = size,
                    None => warn!("Ignoring invalid descriptor size {:?}", text),
                }
                self.mandatory.size_seen = true;
            }
            Element::ObjectUri => {
                let uri = normalize_uri(&text);
                if uri.is_empty() {
                    debug!("Ignoring empty objectURI element");
                } else if self.mandatory.uri_seen {
                    debug!("Ignoring repeated objectURI element");
                } else {
                    d.object_uri = uri;
                    self.mandatory.uri_seen = true;
                }
            }
            Element::Media => {}
            Element::Name => append_text(&mut d.name, &decode_entities(text.trim())),
            Element::Vendor => append_text(&mut d.vendor, &decode_entities(text.trim())),
            Element::Description => {
                append_text(&mut d.description, &decode_entities(text.trim()))
            }
            Element::InstallNotifyUri => {
                append_text(&mut d.install_notify_uri, &normalize_uri(&text))
            }
            Element::InfoUrl => append_text(&mut d.info_uri, &normalize_uri(&text)),
            Element::IconUri => append_text(&mut d.icon_uri, &normalize_uri(&text)),
            Element::NextUrl => append_text(&mut d.next_uri, &normalize_uri(&text)),
            Element::DdVersion => match parse_version(&text) {
                Ok(version) => {
                    d.major_version = version.major;
                    d.minor_version = version.minor;
                }
                Err(e) => warn!("{}, keeping default version", e),
            },
            Element::ProgressiveDownloadFlag => {
                d.progressive_download = text.trim().eq_ignore_ascii_case("true");
            }
        }
    }
}

/// Accept only ASCII digits that fit in a `u64`.
fn parse_size(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn append_text(field: &mut Option<String>, text: &str) {
    if text.is_empty() {
        return;
    }
    match field {
        Some(existing) => existing.push_str(text),
        None => *field = Some(text.to_string()),
    }
}

/// Run a whole event sequence through a fresh session.
pub fn parse<'a, I>(events: I) -> Result<Descriptor, ParseError>
where
    I: IntoIterator<Item = DescriptorEvent<'a>>,
{
    let mut session = ParseSession::new();
    for event in events {
        session.feed(event);
    }
    session.finish()
}
