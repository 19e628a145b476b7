//! Byte input through `convert_bytes`: charset detection and lossy decoding.

use clipmark::{convert_bytes, Options};

fn convert(html: &[u8]) -> clipmark::ConversionResult {
    let options = Options {
        generate_frontmatter: false,
        ..Options::default()
    };
    convert_bytes(html, None, &options).expect("conversion failed")
}

/// UTF-8 content is handled correctly
#[test]
fn utf8_content_handled_correctly() {
    let html = "\
        <html>\
        <head><meta charset=\"utf-8\"></head>\
        <body>\
            <article>\
                <h1>Test Article</h1>\
                <p>This is UTF-8 content with special characters: é, ñ, ü, 中文</p>\
            </article>\
        </body>\
        </html>\
    ".as_bytes();

    let result = convert(html);

    assert!(result.markdown.starts_with("# Test Article"));
    assert!(result.markdown.contains("é, ñ, ü, 中文"));
}

/// ISO-8859-1 encoding is converted to UTF-8
#[test]
fn iso88591_converted_to_utf8() {
    // é = 0xE9, ñ = 0xF1, ü = 0xFC in ISO-8859-1
    let html = b"<html>\
        <head><meta charset=\"ISO-8859-1\"></head>\
        <body><article>\
            <h1>Caf\xE9 espa\xF1ol</h1>\
            <p>M\xFCnchen</p>\
        </article></body></html>";

    let result = convert(html);

    assert_eq!(result.markdown, "# Café español\n\nMünchen");
}

/// Windows-1252 declared through http-equiv is detected and converted
#[test]
fn windows1252_detected_and_converted() {
    // 0x93/0x94 are curly double quotes, 0x96 is an en-dash
    let html = b"<html>\
        <head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1252\"></head>\
        <body><article>\
            <p>\x93Smart quotes\x94 and an en\x96dash.</p>\
        </article></body></html>";

    let result = convert(html);

    assert_eq!(result.markdown, "\u{201c}Smart quotes\u{201d} and an en\u{2013}dash.");
}

/// UTF-8 is assumed when no charset is declared
#[test]
fn utf8_assumed_when_no_charset() {
    let result = convert("<html><body><p>Gr\u{fc}\u{df}e</p></body></html>".as_bytes());
    assert_eq!(result.markdown, "Grüße");
}

/// Invalid byte sequences are replaced, never fatal
#[test]
fn invalid_encoding_handled_gracefully() {
    let html = b"<html><body><article>\
        <p>Valid text</p>\
        <p>Invalid: \xFF\xFE\xFD</p>\
        <p>More valid text</p>\
        </article></body></html>";

    let result = convert(html);

    assert!(result.markdown.contains("Valid text"));
    assert!(result.markdown.contains("More valid text"));
    assert!(result.markdown.contains('\u{FFFD}'));
}

/// Charset detection is case-insensitive
#[test]
fn charset_detection_case_insensitive() {
    let html = b"<HTML><HEAD><META CHARSET=\"ISO-8859-1\"></HEAD>\
        <BODY><P>Caf\xE9</P></BODY></HTML>";

    assert_eq!(convert(html).markdown, "Café");
}

/// The first charset declaration wins
#[test]
fn multiple_charset_declarations() {
    let html = b"<html>\
        <head><meta charset=\"ISO-8859-1\"><meta charset=\"UTF-8\"></head>\
        <body><article><p>Caf\xE9</p></article></body></html>";

    assert_eq!(convert(html).markdown, "Café");
}

/// The size limit applies to the raw bytes
#[test]
fn byte_input_respects_size_limit() {
    let options = Options {
        max_input_len: 8,
        ..Options::default()
    };
    assert!(convert_bytes(b"<p>too long for the limit</p>", None, &options).is_err());
}

/// Lossy decoding is listed in the warnings
#[test]
fn replaced_bytes_are_reported() {
    let result = convert(b"<html><body><p>Broken \xFF byte</p></body></html>");
    assert_eq!(result.warnings, vec!["malformed UTF-8 byte sequences replaced".to_string()]);

    assert!(convert(b"<html><body><p>Clean</p></body></html>").warnings.is_empty());
}

/// An unknown charset label falls back to UTF-8 with a warning
#[test]
fn unknown_charset_reported() {
    let html = "<html><head><meta charset=\"x-nonsense\"></head><body><p>Grüße</p></body></html>";
    let result = convert(html.as_bytes());

    assert_eq!(result.markdown, "Grüße");
    assert_eq!(result.warnings[0], "unknown charset `x-nonsense`, decoded as UTF-8");
}

/// A byte-order mark overrides a conflicting declaration
#[test]
fn byte_order_mark_overrides_meta() {
    let mut html = vec![0xEF, 0xBB, 0xBF];
    html.extend_from_slice("<html><head><meta charset=\"windows-1252\"></head><body><p>Café</p></body></html>".as_bytes());

    assert_eq!(convert(&html).markdown, "Café");
}
