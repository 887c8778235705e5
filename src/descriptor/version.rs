//! The `DDVersion` grammar: `major '.' minor ['.' micro]`.
//!
//! Each component is one or more ASCII digits. Whitespace anywhere inside a
//! component is skipped. Anything else is rejected.

use super::descriptor::DdVersion;
use super::parser::ParseError;

/// Parse a `DDVersion` string.
///
/// ```rust
/// use omadl::descriptor::parse_version;
///
/// let v = parse_version("1.2.3").unwrap();
/// assert_eq!((v.major, v.minor, v.micro), (1, 2, 3));
/// assert!(parse_version("1x.2").is_err());
/// ```
pub fn parse_version(text: &str) -> Result<DdVersion, ParseError> {
    let invalid = || ParseError::InvalidVersionString(text.to_string());

    let mut components: Vec<u32> = Vec::with_capacity(3);
    let mut current: Option<u32> = None;

    for c in text.chars() {
        match c {
            ' ' | '\t' | '\r' | '\n' => continue,
            '0'..='9' => {
                let digit = c.to_digit(10).ok_or_else(invalid)?;
                let value = current
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit))
                    .ok_or_else(invalid)?;
                current = Some(value);
            }
            '.' => {
                // A separator must close a non-empty component, and there
                // are at most two of them.
                let value = current.take().ok_or_else(invalid)?;
                components.push(value);
                if components.len() > 2 {
                    return Err(invalid());
                }
            }
            _ => return Err(invalid()),
        }
    }

    components.push(current.ok_or_else(invalid)?);

    match components.as_slice() {
        [major, minor] => Ok(DdVersion {
            major: *major,
            minor: *minor,
            micro: 0,
        }),
        [major, minor, micro] => Ok(DdVersion {
            major: *major,
            minor: *minor,
            micro: *micro,
        }),
        _ => Err(invalid()),
    }
}
