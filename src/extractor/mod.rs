//! Main content extraction module.
//!
//! # Module Structure
//!
//! - `locator`: picks the subtree holding the article body
//! - `sanitizer`: clones and cleans it into a [`SanitizedTree`]
//! - `assets`: images, links and counts gathered from the clean tree
//!
//! # Usage
//!
//! ```rust
//! use clipmark::extractor::{collect_images, locate, sanitize};
//! use clipmark::{Options, RawDocument};
//!
//! let raw = RawDocument::parse(r#"<main><img src="/a.png"></main>"#, Some("https://example.com/"));
//! let options = Options::default();
//!
//! let candidate = locate(&raw, &options);
//! let tree = sanitize(&candidate, raw.base_url(), &options);
//! assert_eq!(collect_images(&tree)[0].src, "https://example.com/a.png");
//! ```

pub mod assets;
pub mod locator;
pub mod sanitizer;

pub use assets::{collect_images, collect_links, content_stats};
pub use locator::{locate, score_container, CandidateStrategy, ContentCandidate};
pub use sanitizer::{sanitize, SanitizedTree};
