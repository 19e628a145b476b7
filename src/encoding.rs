//! Character encoding of byte input.
//!
//! Captured pages arrive as raw bytes in whatever charset the site served.
//! The charset comes from a byte-order mark, then from the first `<meta>`
//! declaration near the top of the document, and falls back to UTF-8.
//! Anything lossy along the way is reported so [`convert_bytes`] can surface
//! it in the result's warnings.
//!
//! [`convert_bytes`]: crate::convert_bytes

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use regex::Regex;
use tracing::{debug, warn};

/// Bytes of the document inspected for a charset declaration.
const SNIFF_LEN: usize = 2048;

static META_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\b((?:"[^"]*"|'[^']*'|[^'">])*)>"#).expect("META_TAG regex")
});

static META_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([a-zA-Z-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).expect("META_ATTRIBUTE regex")
});

/// `charset=` inside a `content` value.
static CONTENT_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"';\s]+)"#).expect("CONTENT_CHARSET regex")
});

/// Where the charset of a document was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharsetSource {
    /// A UTF-8 or UTF-16 byte-order mark.
    ByteOrderMark,
    /// `<meta charset="...">`.
    MetaCharset,
    /// `<meta http-equiv="Content-Type" content="...; charset=...">`.
    HttpEquiv,
    /// Nothing usable was declared.
    Fallback,
}

/// Document bytes decoded to UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static Encoding,
    pub source: CharsetSource,
    /// Unknown declarations and replaced byte sequences.
    pub warnings: Vec<String>,
}

/// Pick the encoding of a document.
///
/// Returns the encoding, where it came from, and the declared label when it
/// named no encoding known to `encoding_rs`.
#[must_use]
pub fn sniff(bytes: &[u8]) -> (&'static Encoding, CharsetSource, Option<String>) {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return (encoding, CharsetSource::ByteOrderMark, None);
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_LEN)]);
    let Some((label, source)) = declared_charset(&head) else {
        return (UTF_8, CharsetSource::Fallback, None);
    };

    match Encoding::for_label(label.trim().as_bytes()) {
        // A page that could be read as ASCII to find its own meta tag is not
        // UTF-16, whatever it claims.
        Some(encoding) if encoding == UTF_16LE || encoding == UTF_16BE => (UTF_8, source, None),
        Some(encoding) => (encoding, source, None),
        None => (UTF_8, CharsetSource::Fallback, Some(label)),
    }
}

/// First charset declaration among the `<meta>` tags of `head`.
fn declared_charset(head: &str) -> Option<(String, CharsetSource)> {
    META_TAG.captures_iter(head).find_map(|tag| {
        let attrs: Vec<(String, &str)> = META_ATTRIBUTE
            .captures_iter(tag.get(1)?.as_str())
            .filter_map(|caps| {
                let value = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4))?;
                Some((caps[1].to_ascii_lowercase(), value.as_str()))
            })
            .collect();
        let attr = |name: &str| attrs.iter().find(|(n, _)| n == name).map(|(_, v)| *v);

        if let Some(charset) = attr("charset").filter(|c| !c.trim().is_empty()) {
            return Some((charset.to_string(), CharsetSource::MetaCharset));
        }
        if attr("http-equiv").is_some_and(|v| v.trim().eq_ignore_ascii_case("content-type")) {
            let charset = CONTENT_CHARSET.captures(attr("content")?)?;
            return Some((charset[1].to_string(), CharsetSource::HttpEquiv));
        }
        None
    })
}

/// Decode document bytes to UTF-8.
///
/// Malformed sequences become U+FFFD and are reported, never fatal.
///
/// # Examples
///
/// ```
/// use clipmark::encoding::{decode, CharsetSource};
///
/// let decoded = decode(b"<meta charset=\"latin1\"><p>Caf\xE9</p>");
/// assert_eq!(decoded.source, CharsetSource::MetaCharset);
/// assert!(decoded.text.contains("Café"));
/// assert!(decoded.warnings.is_empty());
/// ```
#[must_use]
pub fn decode(bytes: &[u8]) -> Decoded {
    let (encoding, source, unknown) = sniff(bytes);
    let mut warnings = Vec::new();

    if let Some(label) = unknown {
        warn!(%label, "unknown charset, decoding as UTF-8");
        warnings.push(format!("unknown charset `{label}`, decoded as UTF-8"));
    }

    // `decode` strips a matching BOM
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(encoding = used.name(), "malformed byte sequences replaced");
        warnings.push(format!("malformed {} byte sequences replaced", used.name()));
    }
    debug!(encoding = used.name(), ?source, "decoded input");

    Decoded {
        text: text.into_owned(),
        encoding: used,
        source,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_order_mark_wins() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(br#"<meta charset="windows-1252"><p>x</p>"#);

        let decoded = decode(&bytes);
        assert_eq!(decoded.source, CharsetSource::ByteOrderMark);
        assert_eq!(decoded.encoding, UTF_8);
        assert!(decoded.text.starts_with("<meta"));
    }

    #[test]
    fn test_meta_declarations() {
        let (encoding, source, _) = sniff(b"<META CHARSET=iso-8859-1>");
        assert_eq!((encoding.name(), source), ("windows-1252", CharsetSource::MetaCharset));

        let (encoding, source, _) =
            sniff(b"<meta content='text/html; charset=koi8-r' http-equiv='Content-Type'>");
        assert_eq!((encoding.name(), source), ("KOI8-R", CharsetSource::HttpEquiv));

        // Other meta tags are skipped
        let (encoding, _, _) = sniff(br#"<meta name="viewport" content="width=device-width"><meta charset="shift_jis">"#);
        assert_eq!(encoding.name(), "Shift_JIS");
    }

    #[test]
    fn test_fallback_to_utf8() {
        assert_eq!(sniff(b"<p>no declaration</p>"), (UTF_8, CharsetSource::Fallback, None));

        let late = format!("{}<meta charset=\"windows-1252\">", " ".repeat(SNIFF_LEN));
        assert_eq!(sniff(late.as_bytes()).1, CharsetSource::Fallback);
    }

    #[test]
    fn test_utf16_declaration_read_as_utf8() {
        let (encoding, source, _) = sniff(br#"<meta charset="utf-16">"#);
        assert_eq!((encoding, source), (UTF_8, CharsetSource::MetaCharset));
    }

    #[test]
    fn test_unknown_label_is_reported() {
        let decoded = decode(br#"<meta charset="klingon"><p>x</p>"#);
        assert_eq!(decoded.source, CharsetSource::Fallback);
        assert_eq!(decoded.encoding, UTF_8);
        assert_eq!(decoded.warnings, vec!["unknown charset `klingon`, decoded as UTF-8".to_string()]);
    }

    #[test]
    fn test_malformed_bytes_are_reported() {
        let decoded = decode(b"<p>ok \xFF\xFE</p>");
        assert!(decoded.text.contains('\u{FFFD}'));
        assert_eq!(decoded.warnings, vec!["malformed UTF-8 byte sequences replaced".to_string()]);
    }
}
