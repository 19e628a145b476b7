//! JSON-LD Metadata Parsing
//!
//! Extracts Schema.org metadata from `<script type="application/ld+json">`
//! blocks. Scripts that fail to parse are skipped; `@graph` arrays and
//! nested objects are walked so an article's author or publisher is found
//! wherever it sits.

use dom_query::{Document, Selection};
use serde_json::Value;
use tracing::debug;

use crate::dom;
use crate::error::Error;
use crate::result::Metadata;

use super::meta_tags::{dedupe, fill_date, parse_tag_list, validate_metadata_name};

/// One schema.org entity with its importance for field selection.
#[derive(Debug, Clone)]
struct SchemaData {
    /// Schema @type values, lowercase
    types: Vec<String>,
    data: serde_json::Map<String, Value>,
    /// Higher is more relevant
    importance: i32,
}

/// Every JSON-LD value in the document that parsed successfully.
#[must_use]
pub fn parse_scripts(doc: &Document) -> Vec<Value> {
    let mut values = Vec::new();

    for script in doc.select(r#"script[type="application/ld+json"]"#).nodes() {
        let script_sel = Selection::from(*script);
        let json_text = dom::text_content(&script_sel);
        let json_text = json_text.trim();

        if json_text.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(json_text) {
            Ok(v) => values.push(v),
            Err(e) => debug!(error = %e, "skipping malformed JSON-LD script"),
        }
    }

    values
}

/// Fill missing fields from parsed JSON-LD values.
///
/// # Arguments
/// * `values` - Output of [`parse_scripts`]
/// * `original` - Pre-existing metadata; only empty fields are filled
/// * `issues` - Collects fields skipped because of malformed values
#[must_use]
pub fn extract_json_ld(values: &[Value], original: Metadata, issues: &mut Vec<Error>) -> Metadata {
    let mut result = original;

    let (persons, organizations, articles) = categorize(values);

    for article in &articles {
        if result.title.is_none() {
            result.title = get_single_string_value(&article.data, "headline")
                .or_else(|| get_single_string_value(&article.data, "name"));
        }

        if result.description.is_none() {
            result.description = get_single_string_value(&article.data, "description");
        }

        if result.author.is_none() {
            result.author = article.data.get("author").and_then(author_name);
        }

        fill_date(
            &mut result.published_date,
            get_single_string_value(&article.data, "datePublished").as_ref(),
            "published_date",
            issues,
        );
        fill_date(
            &mut result.modified_date,
            get_single_string_value(&article.data, "dateModified").as_ref(),
            "modified_date",
            issues,
        );

        if result.site_name.is_none() {
            result.site_name = article.data.get("publisher").and_then(entity_name);
        }

        if result.image.is_none() {
            result.image = extract_schema_image(&article.data);
        }

        if result.keywords.is_empty() {
            if let Some(keywords) = get_string_values(&article.data, "keywords") {
                result.keywords = dedupe(keywords);
            }
        }
    }

    if result.author.is_none() {
        result.author = persons.iter().find_map(|p| get_schema_name(&p.data));
    }

    if result.site_name.is_none() {
        result.site_name = organizations.iter().find_map(|o| get_schema_name(&o.data));
    }

    result
}

/// Split typed schema objects into persons, organizations, and articles,
/// each sorted by importance.
fn categorize(values: &[Value]) -> (Vec<SchemaData>, Vec<SchemaData>, Vec<SchemaData>) {
    let mut persons: Vec<SchemaData> = Vec::new();
    let mut organizations: Vec<SchemaData> = Vec::new();
    let mut articles: Vec<SchemaData> = Vec::new();

    for value in values {
        process_schema_value(value, 0, &mut persons, &mut organizations, &mut articles);
    }

    // Stable sort keeps document order among equals.
    persons.sort_by(|a, b| b.importance.cmp(&a.importance));
    organizations.sort_by(|a, b| b.importance.cmp(&a.importance));
    articles.sort_by(|a, b| b.importance.cmp(&a.importance));

    (persons, organizations, articles)
}

/// Recursively process schema values.
fn process_schema_value(
    value: &Value,
    depth: i32,
    persons: &mut Vec<SchemaData>,
    organizations: &mut Vec<SchemaData>,
    articles: &mut Vec<SchemaData>,
) {
    match value {
        Value::Object(map) => {
            let types = get_schema_types(value);
            let next_depth = if types.is_empty() { depth } else { depth + 1 };

            if !types.is_empty() {
                let schema_data = SchemaData {
                    importance: calculate_importance(&types, depth),
                    types,
                    data: map.clone(),
                };

                if is_person_type(&schema_data.types) {
                    persons.push(schema_data);
                } else if is_organization_type(&schema_data.types) {
                    organizations.push(schema_data);
                } else if is_article_type(&schema_data.types) {
                    articles.push(schema_data);
                }
            }

            for val in map.values() {
                process_schema_value(val, next_depth, persons, organizations, articles);
            }
        }
        Value::Array(arr) => {
            // @graph arrays and top-level lists
            for item in arr {
                process_schema_value(item, depth, persons, organizations, articles);
            }
        }
        _ => {}
    }
}

/// Get lowercase @type values from a schema object.
fn get_schema_types(value: &Value) -> Vec<String> {
    let Some(type_val) = value.as_object().and_then(|obj| obj.get("@type")) else {
        return Vec::new();
    };

    match type_val {
        Value::String(s) => vec![s.to_lowercase()],
        Value::Array(arr) => arr
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_lowercase)
            .collect(),
        _ => Vec::new(),
    }
}

/// Name of a person, composed from given/family names when needed.
fn get_schema_name(data: &serde_json::Map<String, Value>) -> Option<String> {
    if let Some(Value::String(name)) = data.get("name") {
        let name = name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    let given = data.get("givenName").and_then(Value::as_str).unwrap_or("");
    let family = data.get("familyName").and_then(Value::as_str).unwrap_or("");

    let full_name = format!("{} {}", given.trim(), family.trim()).trim().to_string();
    (!full_name.is_empty()).then_some(full_name)
}

/// Name of an author value: a string, an object, or a list of either.
fn author_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| validate_metadata_name(s)),
        Value::Object(map) => get_schema_name(map).filter(|s| validate_metadata_name(s)),
        Value::Array(arr) => {
            let names: Vec<String> = arr.iter().filter_map(author_name).collect();
            (!names.is_empty()).then(|| names.join(", "))
        }
        _ => None,
    }
}

/// Name of an organization value (string or object).
fn entity_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(map) => get_schema_name(map),
        Value::Array(arr) => arr.iter().find_map(entity_name),
        _ => None,
    }
}

/// Get string values from an object property.
fn get_string_values(data: &serde_json::Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let result: Vec<String> = match data.get(key)? {
        Value::String(s) => parse_tag_list(s),
        Value::Array(arr) => arr
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    };

    (!result.is_empty()).then_some(result)
}

/// Get a single string value from an object property.
fn get_single_string_value(data: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    let s = match data.get(key)? {
        Value::String(s) => s.as_str(),
        Value::Array(arr) => arr.first().and_then(Value::as_str)?,
        _ => return None,
    };
    let s = dom::normalize_whitespace(s);
    (!s.is_empty()).then_some(s)
}

// === Helper Functions ===

fn is_person_type(types: &[String]) -> bool {
    types.iter().any(|t| matches!(t.as_str(), "person" | "author" | "creator"))
}

fn is_organization_type(types: &[String]) -> bool {
    types.iter().any(|t| {
        matches!(t.as_str(), "organization" | "newsmediaorganization" | "website" | "publisher")
    })
}

fn is_article_type(types: &[String]) -> bool {
    types.iter().any(|t| {
        matches!(
            t.as_str(),
            "article" | "newsarticle" | "blogposting" | "webpage" | "report" | "techarticle"
                | "scholarlyarticle" | "socialmediaposting" | "howto" | "recipe"
        )
    })
}

fn calculate_importance(types: &[String], depth: i32) -> i32 {
    let base = if is_article_type(types) { 100 } else { 50 };
    base - depth * 10
}

fn extract_schema_image(data: &serde_json::Map<String, Value>) -> Option<String> {
    fn image_url(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj.get("url").and_then(Value::as_str).map(str::to_string),
            Value::Array(arr) => arr.first().and_then(image_url),
            _ => None,
        }
    }
    data.get("image").and_then(image_url).filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Metadata {
        let doc = Document::from(html);
        let values = parse_scripts(&doc);
        extract_json_ld(&values, Metadata::default(), &mut Vec::new())
    }

    #[test]
    fn test_simple_article_schema() {
        let metadata = extract(
            r#"<script type="application/ld+json">
            {
                "@type": "Article",
                "headline": "Test Article Title",
                "description": "This is the article description.",
                "datePublished": "2024-01-15T10:30:00Z",
                "author": {"@type": "Person", "name": "John Doe"},
                "publisher": {"@type": "Organization", "name": "Daily Bugle"}
            }
            </script>"#,
        );

        assert_eq!(metadata.title, Some("Test Article Title".to_string()));
        assert_eq!(metadata.description, Some("This is the article description.".to_string()));
        assert_eq!(metadata.author, Some("John Doe".to_string()));
        assert_eq!(metadata.site_name, Some("Daily Bugle".to_string()));
        assert!(metadata.published_date.is_some());
    }

    #[test]
    fn test_graph_array_schema() {
        let metadata = extract(
            r#"<script type="application/ld+json">
            {"@graph": [
                {"@type": "WebSite", "name": "Example Site"},
                {"@type": "NewsArticle", "headline": "Breaking News"}
            ]}
            </script>"#,
        );

        assert_eq!(metadata.site_name, Some("Example Site".to_string()));
        assert_eq!(metadata.title, Some("Breaking News".to_string()));
    }

    #[test]
    fn test_person_name_composition() {
        let metadata = extract(
            r#"<script type="application/ld+json">
            {"@type": "Person", "givenName": "Jane", "familyName": "Smith"}
            </script>"#,
        );
        assert_eq!(metadata.author, Some("Jane Smith".to_string()));
    }

    #[test]
    fn test_image_extraction_formats() {
        let m1 = extract(r#"<script type="application/ld+json">{"@type":"Article","image":"https://example.com/image.jpg"}</script>"#);
        assert_eq!(m1.image, Some("https://example.com/image.jpg".to_string()));

        let m2 = extract(r#"<script type="application/ld+json">{"@type":"Article","image":{"@type":"ImageObject","url":"https://example.com/image2.jpg"}}</script>"#);
        assert_eq!(m2.image, Some("https://example.com/image2.jpg".to_string()));
    }

    #[test]
    fn test_keywords_extraction() {
        let metadata = extract(
            r#"<script type="application/ld+json">
            {"@type": "Article", "keywords": ["technology", "innovation", "technology"]}
            </script>"#,
        );
        assert_eq!(metadata.keywords, vec!["technology", "innovation"]);

        let metadata = extract(
            r#"<script type="application/ld+json">{"@type": "Article", "keywords": "a, b"}</script>"#,
        );
        assert_eq!(metadata.keywords, vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_json_skipped() {
        let doc = Document::from(
            r#"<script type="application/ld+json">{ invalid json here }</script>
            <script type="application/ld+json">{"@type": "Article", "headline": "Valid Article"}</script>"#,
        );
        let values = parse_scripts(&doc);
        assert_eq!(values.len(), 1);

        let metadata = extract_json_ld(&values, Metadata::default(), &mut Vec::new());
        assert_eq!(metadata.title, Some("Valid Article".to_string()));
    }

    #[test]
    fn test_preserves_original_metadata() {
        let doc = Document::from(r#"<script type="application/ld+json">{"@type":"Article","headline":"New Title","author":"Someone Else"}</script>"#);
        let original = Metadata {
            author: Some("Original Author".to_string()),
            ..Metadata::default()
        };

        let metadata = extract_json_ld(&parse_scripts(&doc), original, &mut Vec::new());

        assert_eq!(metadata.author, Some("Original Author".to_string()));
        assert_eq!(metadata.title, Some("New Title".to_string()));
    }

    #[test]
    fn bad_date_reports_issue() {
        let doc = Document::from(r#"<script type="application/ld+json">{"@type":"Article","datePublished":"soon"}</script>"#);
        let mut issues = Vec::new();
        let metadata = extract_json_ld(&parse_scripts(&doc), Metadata::default(), &mut issues);
        assert!(metadata.published_date.is_none());
        assert_eq!(issues.len(), 1);
    }
}
