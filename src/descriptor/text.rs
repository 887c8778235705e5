//! Text preprocessing for descriptor element content.

/// Entities recognized in descriptor text, with their decoded character.
const ENTITIES: [(&str, &str); 5] = [
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
];

/// Remove every space, tab, carriage return and line feed.
pub fn strip_whitespace(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '\r' | '\n'))
        .collect()
}

/// Decode the fixed entity table.
///
/// Scanning is repeated until no entity literal remains, so `&amp;lt;`
/// decodes all the way down to `<`. Every pass shortens the string, which
/// bounds the loop.
pub fn decode_entities(text: &str) -> String {
    let mut decoded = text.to_string();
    loop {
        let mut replaced = false;
        for (entity, ch) in ENTITIES {
            if decoded.contains(entity) {
                decoded = decoded.replace(entity, ch);
                replaced = true;
            }
        }
        if !replaced {
            return decoded;
        }
    }
}

/// Strip whitespace then decode entities, as applied to URI-bearing fields.
pub fn normalize_uri(text: &str) -> String {
    decode_entities(&strip_whitespace(text))
}
