//! Turns descriptor bytes into [`DescriptorEvent`]s.
//!
//! Tokenizing is delegated to `quick-xml`; every grammar decision stays in
//! [`ParseSession`]. Text is passed through raw so the session applies its
//! own entity table.

use super::descriptor::Descriptor;
use super::parser::{DescriptorEvent, ParseError, ParseSession};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Feed a complete document into `session`.
///
/// Tokenizer failures latch [`ParseError::Malformed`] in the session, so
/// anything captured before the failure stays readable.
pub fn feed_document(bytes: &[u8], session: &mut ParseSession) {
    let mut reader = Reader::from_reader(bytes);
    let config = reader.config_mut();
    config.trim_text(false);
    // Unbalanced closing tags are the session's call, not the tokenizer's.
    config.check_end_names = false;

    let mut buf = Vec::new();
    loop {
        if session.error().is_some() {
            return;
        }
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                session.fail(ParseError::Malformed(format!(
                    "{} at byte {}",
                    e,
                    reader.buffer_position()
                )));
                return;
            }
        };
        match event {
            Event::Start(start) => {
                let name = start.local_name();
                match utf8(name.as_ref()) {
                    Ok(name) => session.feed(DescriptorEvent::Start(name)),
                    Err(e) => session.fail(e),
                }
            }
            Event::Empty(start) => {
                let name = start.local_name();
                match utf8(name.as_ref()) {
                    Ok(name) => {
                        session.feed(DescriptorEvent::Start(name));
                        session.feed(DescriptorEvent::End(name));
                    }
                    Err(e) => session.fail(e),
                }
            }
            Event::End(end) => {
                let name = end.local_name();
                match utf8(name.as_ref()) {
                    Ok(name) => session.feed(DescriptorEvent::End(name)),
                    Err(e) => session.fail(e),
                }
            }
            Event::Text(text) => match utf8(&text) {
                Ok(text) => session.feed(DescriptorEvent::Text(text)),
                Err(e) => session.fail(e),
            },
            Event::CData(data) => match utf8(&data) {
                Ok(text) => session.feed(DescriptorEvent::Text(text)),
                Err(e) => session.fail(e),
            },
            Event::Eof => return,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
        buf.clear();
    }
}

/// Parse a complete descriptor document.
pub fn parse_document(bytes: &[u8]) -> Result<Descriptor, ParseError> {
    let mut session = ParseSession::new();
    feed_document(bytes, &mut session);
    session.finish()
}

fn utf8(bytes: &[u8]) -> Result<&str, ParseError> {
    std::str::from_utf8(bytes).map_err(|e| ParseError::Malformed(e.to_string()))
}
