//! URL Utility Functions
//!
//! URL validation and resolution for image sources, link targets and
//! metadata URLs. Resolution never fails: when a URL cannot be made
//! absolute, the original string is kept.

use url::Url;

/// Check if a string is a valid absolute URL.
///
/// # Returns
/// * `(is_absolute, parsed_url)` - Whether URL is absolute and the parsed URL if valid
#[must_use]
pub fn is_absolute_url(s: &str) -> (bool, Option<Url>) {
    let s = s.trim();

    if s.is_empty() {
        return (false, None);
    }

    // Must start with http:// or https://
    if !s.starts_with("http://") && !s.starts_with("https://") {
        return (false, None);
    }

    match Url::parse(s) {
        Ok(url) => {
            if url.host().is_some() {
                (true, Some(url))
            } else {
                (false, None)
            }
        }
        Err(_) => (false, None),
    }
}

/// Whether the URL must be kept exactly as written.
///
/// Data URIs, script/mail/phone schemes and in-page anchors.
#[must_use]
pub fn is_special_url(url_str: &str) -> bool {
    let lower = url_str.trim_start().to_ascii_lowercase();
    lower.starts_with('#')
        || lower.starts_with("data:")
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
}

/// Convert a relative or absolute URL to absolute form.
///
/// # Arguments
/// * `url_str` - The URL to resolve (can be relative or absolute)
/// * `base` - The base URL for resolution
///
/// # Returns
/// * The absolute URL string, or the original if resolution fails
#[must_use]
pub fn create_absolute_url(url_str: &str, base: &Url) -> String {
    let url_str = url_str.trim();

    if url_str.is_empty() {
        return String::new();
    }

    if is_special_url(url_str) {
        return url_str.to_string();
    }

    let (is_abs, _) = is_absolute_url(url_str);
    if is_abs {
        return url_str.to_string();
    }

    match base.join(url_str) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => url_str.to_string(),
    }
}

/// Resolve against an optional base URL.
///
/// Without a base, the trimmed original is returned unchanged.
#[must_use]
pub fn resolve_url(url_str: &str, base: Option<&Url>) -> String {
    match base {
        Some(base) => create_absolute_url(url_str, base),
        None => url_str.trim().to_string(),
    }
}

/// Extract hostname from URL for metadata.
#[must_use]
pub fn extract_hostname(url_str: &str) -> Option<String> {
    parse_url(url_str)
        .and_then(|url| url.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .filter(|h| !h.is_empty())
}

/// Parse a URL string into a Url object.
///
/// # Returns
/// * `Some(Url)` if valid absolute URL, `None` otherwise
#[must_use]
pub fn parse_url(url_str: &str) -> Option<Url> {
    let (is_abs, parsed) = is_absolute_url(url_str);
    if is_abs {
        parsed
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/post.html").unwrap()
    }

    #[test]
    fn test_is_absolute_url_valid() {
        assert!(is_absolute_url("https://example.com").0);
        assert!(is_absolute_url("  http://example.com/path  ").0);
    }

    #[test]
    fn test_is_absolute_url_invalid() {
        assert!(!is_absolute_url("").0);
        assert!(!is_absolute_url("/relative").0);
        assert!(!is_absolute_url("ftp://example.com").0);
        assert!(!is_absolute_url("example.com").0);
    }

    #[test]
    fn test_create_absolute_url_relative() {
        let base = base();
        assert_eq!(create_absolute_url("/img/a.png", &base), "https://example.com/img/a.png");
        assert_eq!(create_absolute_url("b.png", &base), "https://example.com/blog/b.png");
        assert_eq!(create_absolute_url("../c.png", &base), "https://example.com/c.png");
    }

    #[test]
    fn test_create_absolute_url_already_absolute() {
        let base = base();
        assert_eq!(
            create_absolute_url("https://cdn.example.org/x.png", &base),
            "https://cdn.example.org/x.png"
        );
    }

    #[test]
    fn test_create_absolute_url_special() {
        let base = base();
        assert_eq!(create_absolute_url("#section", &base), "#section");
        assert_eq!(create_absolute_url("mailto:a@b.c", &base), "mailto:a@b.c");
        assert_eq!(create_absolute_url("javascript:void(0)", &base), "javascript:void(0)");
        assert_eq!(create_absolute_url("data:image/png;base64,AA", &base), "data:image/png;base64,AA");
    }

    #[test]
    fn test_resolve_without_base_keeps_original() {
        assert_eq!(resolve_url(" /a.png ", None), "/a.png");
    }

    #[test]
    fn test_extract_hostname() {
        assert_eq!(extract_hostname("https://www.example.com/a"), Some("example.com".to_string()));
        assert_eq!(extract_hostname("not a url"), None);
    }
}
