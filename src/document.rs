//! Parsed input document.

use std::fmt;

use dom_query::Document;
use tracing::debug;
use url::Url;

/// A parsed HTML document plus the URL it was captured from.
///
/// Every pipeline stage reads it; none mutates it. Content extraction works
/// on a clone of the selected subtree.
pub struct RawDocument {
    doc: Document,
    base_url: Option<Url>,
}

impl RawDocument {
    /// Parse `html`, remembering `base_url` for link and image resolution.
    ///
    /// A base URL that does not parse as an absolute URL is ignored, and
    /// relative references then keep their original strings.
    #[must_use]
    pub fn parse(html: &str, base_url: Option<&str>) -> Self {
        let base_url = base_url.and_then(|raw| match Url::parse(raw.trim()) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(base_url = raw, error = %e, "ignoring unparseable base URL");
                None
            }
        });

        Self {
            doc: Document::from(html),
            base_url,
        }
    }

    /// Wrap an already parsed document.
    #[must_use]
    pub fn from_document(doc: Document, base_url: Option<Url>) -> Self {
        Self { doc, base_url }
    }

    /// The parsed tree.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Base URL, when one was supplied and valid.
    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }
}

impl fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDocument")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}
