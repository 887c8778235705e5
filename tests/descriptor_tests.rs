//! Tests for the descriptor module functionality.
//!
//! This file contains tests for:
//! - The event-driven ParseSession
//! - Document parsing through the XML tokenizer
//! - Mandatory element, version and size handling

use omadl::descriptor::{
    parse, parse_document, DescriptorEvent, ParseError, ParseSession, DESCRIPTOR_MIME,
};

mod common;
use common::helpers::*;

use DescriptorEvent::{End, Start, Text};

fn element<'a>(name: &'a str, text: &'a str) -> [DescriptorEvent<'a>; 3] {
    [Start(name), Text(text), End(name)]
}

fn minimal_events<'a>() -> Vec<DescriptorEvent<'a>> {
    let mut events = vec![Start("media")];
    events.extend(element("type", "audio/mpeg"));
    events.extend(element("size", "2048"));
    events.extend(element("objectURI", "http://provider.example/song.mp3"));
    events.push(End("media"));
    events
}

#[test]
fn test_sample_document() -> color_eyre::Result<()> {
    let descriptor = parse_document(sample_descriptor_xml().as_bytes())?;

    assert_eq!(descriptor.primary_type, "audio/mpeg");
    assert!(descriptor.alternate_types.is_empty());
    assert_eq!(descriptor.size_bytes, 2048);
    assert_eq!(descriptor.object_uri, CONTENT_URL);
    assert_eq!(descriptor.install_notify_uri.as_deref(), Some(NOTIFY_URL));
    assert_eq!(
        descriptor.next_uri.as_deref(),
        Some("http://provider.example/thanks")
    );
    assert_eq!(descriptor.name.as_deref(), Some("Summer Song"));
    assert_eq!(descriptor.vendor.as_deref(), Some("Example Music"));
    assert_eq!(
        descriptor.description.as_deref(),
        Some("A song for the summer")
    );
    assert_eq!((descriptor.major_version, descriptor.minor_version), (1, 0));
    assert!(descriptor.is_version_supported());
    assert!(!descriptor.progressive_download);
    assert_eq!(descriptor.install_param, None);
    Ok(())
}

#[test]
fn test_minimal_events() -> color_eyre::Result<()> {
    let descriptor = parse(minimal_events())?;

    assert_eq!(descriptor.primary_type, "audio/mpeg");
    assert_eq!(descriptor.size_bytes, 2048);
    assert_eq!(descriptor.object_uri, "http://provider.example/song.mp3");
    assert_eq!(descriptor.install_notify_uri, None);
    assert_eq!((descriptor.major_version, descriptor.minor_version), (0, 0));
    Ok(())
}

#[test]
fn test_missing_mandatory_elements() {
    let without = |skipped: &str| {
        let mut events = vec![Start("media")];
        for (name, text) in [
            ("type", "audio/mpeg"),
            ("size", "1"),
            ("objectURI", "http://provider.example/a"),
        ] {
            if name != skipped {
                events.extend(element(name, text));
            }
        }
        events.push(End("media"));
        parse(events)
    };

    assert_eq!(
        without("type"),
        Err(ParseError::MissingMandatoryTag("type"))
    );
    assert_eq!(
        without("size"),
        Err(ParseError::MissingMandatoryTag("size"))
    );
    assert_eq!(
        without("objectURI"),
        Err(ParseError::MissingMandatoryTag("objectURI"))
    );
}

#[test]
fn test_empty_mandatory_elements_are_missing() {
    let blank = b"<media><type></type><size>1</size><objectURI>  </objectURI></media>";
    assert_eq!(
        parse_document(blank),
        Err(ParseError::MissingMandatoryTag("type"))
    );

    let self_closing = b"<media><type/><size>1</size><objectURI/></media>";
    assert_eq!(
        parse_document(self_closing),
        Err(ParseError::MissingMandatoryTag("type"))
    );

    let empty_uri = b"<media><type>audio/mpeg</type><size>1</size><objectURI>\n\t</objectURI></media>";
    assert_eq!(
        parse_document(empty_uri),
        Err(ParseError::MissingMandatoryTag("objectURI"))
    );
}

#[test]
fn test_empty_type_is_not_an_alternate() {
    let xml = b"<media><type/><type>audio/mpeg</type><type> </type><size>1</size><objectURI/><objectURI>a.mp3</objectURI></media>";

    let descriptor = parse_document(xml).unwrap();
    assert_eq!(descriptor.primary_type, "audio/mpeg");
    assert!(descriptor.alternate_types.is_empty());
    assert_eq!(descriptor.object_uri, "a.mp3");
}

#[test]
fn test_empty_document() {
    assert_eq!(
        parse_document(b""),
        Err(ParseError::MissingMandatoryTag("type"))
    );
}

#[test]
fn test_text_chunks_are_joined() {
    let mut events = vec![Start("media")];
    events.extend(element("type", "text/plain"));
    events.extend(element("size", "3"));
    events.extend([
        Start("objectURI"),
        Text("ab"),
        Text("cd"),
        Text("ef"),
        End("objectURI"),
    ]);
    events.push(End("media"));

    assert_eq!(parse(events).unwrap().object_uri, "abcdef");
}

#[test]
fn test_uri_whitespace_and_entities() {
    let xml = br#"<media>
        <type>audio/mpeg</type>
        <size>1</size>
        <objectURI>
            http://provider.example/get?id=1&amp;fmt=mp3
        </objectURI>
        <name>  Rock &amp;amp; Roll  </name>
    </media>"#;

    let descriptor = parse_document(xml).unwrap();
    assert_eq!(
        descriptor.object_uri,
        "http://provider.example/get?id=1&fmt=mp3"
    );
    assert_eq!(descriptor.name.as_deref(), Some("Rock & Roll"));
}

#[test]
fn test_cdata_is_text() {
    let xml = br#"<media><type>text/plain</type><size>1</size>
        <objectURI><![CDATA[http://provider.example/a.txt]]></objectURI></media>"#;

    assert_eq!(
        parse_document(xml).unwrap().object_uri,
        "http://provider.example/a.txt"
    );
}

#[test]
fn test_repeated_types_keep_document_order() {
    let mut events = vec![Start("media")];
    events.extend(element("type", "audio/mpeg"));
    events.extend(element("type", "audio/mp4"));
    events.extend(element("type", "audio/ogg"));
    events.extend(element("size", "1"));
    events.extend(element("objectURI", "http://provider.example/a"));
    events.push(End("media"));

    let descriptor = parse(events).unwrap();
    assert_eq!(descriptor.primary_type, "audio/mpeg");
    assert_eq!(descriptor.alternate_types, vec!["audio/mp4", "audio/ogg"]);
    assert!(descriptor.accepts_type("AUDIO/OGG"));
    assert!(!descriptor.accepts_type("video/mp4"));
}

#[test]
fn test_repeated_object_uri_keeps_first() {
    let mut events = minimal_events();
    events.pop();
    events.extend(element("objectURI", "http://provider.example/other"));
    events.push(End("media"));

    assert_eq!(
        parse(events).unwrap().object_uri,
        "http://provider.example/song.mp3"
    );
}

#[test]
fn test_unknown_element_latches() {
    let mut session = ParseSession::new();
    session.feed(Start("media"));
    session.feed(Start("price"));
    assert_eq!(
        session.error(),
        Some(&ParseError::UnknownElement("price".to_string()))
    );

    // Everything after the first error is ignored.
    for event in minimal_events() {
        session.feed(event);
    }
    assert_eq!(
        session.finish(),
        Err(ParseError::UnknownElement("price".to_string()))
    );
}

#[test]
fn test_closing_unopened_element() {
    let mut events = minimal_events();
    events.insert(1, End("name"));

    assert_eq!(
        parse(events),
        Err(ParseError::InternalParsingError("name".to_string()))
    );
}

#[test]
fn test_closing_unknown_element_in_document() {
    let xml = b"<media><type>a/b</type></price></media>";

    assert_eq!(
        parse_document(xml),
        Err(ParseError::InternalParsingError("price".to_string()))
    );
}

#[test]
fn test_invalid_size_is_lenient() {
    let mut events = vec![Start("media")];
    events.extend(element("type", "audio/mpeg"));
    events.extend(element("size", "12kB"));
    events.extend(element("objectURI", "http://provider.example/a"));
    events.push(End("media"));

    assert_eq!(parse(events).unwrap().size_bytes, 0);
}

#[test]
fn test_size_ignores_whitespace() {
    let xml = b"<media><type>a/b</type><size>\n  1 024\t</size><objectURI>u</objectURI></media>";

    assert_eq!(parse_document(xml).unwrap().size_bytes, 1024);
}

#[test]
fn test_invalid_version_keeps_default() {
    let mut events = minimal_events();
    events.pop();
    events.extend(element("DDVersion", "one.two"));
    events.push(End("media"));

    let descriptor = parse(events).unwrap();
    assert_eq!((descriptor.major_version, descriptor.minor_version), (0, 0));
    assert!(descriptor.is_version_supported());
}

#[test]
fn test_unsupported_version_is_parsed() {
    let descriptor = parse_document(descriptor_xml("2.0", "audio/mpeg").as_bytes()).unwrap();

    assert_eq!(descriptor.major_version, 2);
    assert!(!descriptor.is_version_supported());
}

#[test]
fn test_progressive_download_flag() {
    let with_flag = |value: &str| {
        let mut events = minimal_events();
        events.pop();
        events.extend(element("progressiveDownloadFlag", value));
        events.push(End("media"));
        parse(events).unwrap().progressive_download
    };

    assert!(with_flag("true"));
    assert!(with_flag(" TRUE "));
    assert!(!with_flag("false"));
    assert!(!with_flag("yes"));
}

#[test]
fn test_namespaced_elements() {
    let xml = br#"<dd:media xmlns:dd="http://www.openmobilealliance.org/xmlns/dd">
        <dd:type>image/png</dd:type><dd:size>5</dd:size><dd:objectURI>i.png</dd:objectURI>
    </dd:media>"#;

    assert_eq!(parse_document(xml).unwrap().primary_type, "image/png");
}

#[test]
fn test_malformed_bytes() {
    let xml = b"<media><type>a/b</type><size>1</size><objectURI>\xff\xfe</objectURI></media>";

    assert!(matches!(
        parse_document(xml),
        Err(ParseError::Malformed(_))
    ));
}

#[test]
fn test_notify_uri_survives_failure() {
    let mut session = ParseSession::new();
    omadl::descriptor::feed_document(descriptor_without_size_xml().as_bytes(), &mut session);

    assert_eq!(session.install_notify_uri(), Some(NOTIFY_URL));
    assert_eq!(
        session.finish(),
        Err(ParseError::MissingMandatoryTag("size"))
    );
}

#[test]
fn test_summary_of_sample() {
    let descriptor = parse_document(sample_descriptor_xml().as_bytes()).unwrap();
    let summary = descriptor.summary();

    assert_eq!(summary.name.as_deref(), Some("Summer Song"));
    assert_eq!(summary.size_bytes, 2048);
    assert_eq!(summary.mime, "audio/mpeg");
    let text = summary.to_string();
    assert!(text.contains("Summer Song"));
    assert!(text.contains("2048 bytes"));
}

#[test]
fn test_descriptor_mime() {
    assert_eq!(DESCRIPTOR_MIME, "application/vnd.oma.dd+xml");
}
