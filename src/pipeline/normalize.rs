use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::constants::{GOOGLE_RSS_SOURCE, NEWSAPI_SOURCE};
use crate::error::{PipelineError, Result};
use crate::types::{CanonicalItem, RawItem};

/// Maps one provider's raw record to exactly one canonical item
pub trait SourceNormalizer: Send + Sync {
    fn normalize(&self, raw: &RawItem) -> Result<CanonicalItem>;

    fn source_id(&self) -> &str;
}

/// Field names a provider uses for each canonical field
struct FieldMap {
    title: &'static str,
    link: &'static str,
    published_at: &'static str,
    image: &'static str,
}

/// Field mapping plus the shared null policy
pub struct MappedNormalizer {
    source_id: &'static str,
    fields: FieldMap,
    placeholder_image: String,
}

impl MappedNormalizer {
    /// NewsAPI `/everything` article shape
    pub fn newsapi(placeholder_image: &str) -> Self {
        Self {
            source_id: NEWSAPI_SOURCE,
            fields: FieldMap {
                title: "title",
                link: "url",
                published_at: "publishedAt",
                image: "urlToImage",
            },
            placeholder_image: placeholder_image.to_string(),
        }
    }

    /// Flattened feed entry as produced by the RSS adapter
    pub fn rss(placeholder_image: &str) -> Self {
        Self {
            source_id: GOOGLE_RSS_SOURCE,
            fields: FieldMap {
                title: "title",
                link: "link",
                published_at: "published",
                image: "image",
            },
            placeholder_image: placeholder_image.to_string(),
        }
    }
}

impl SourceNormalizer for MappedNormalizer {
    fn normalize(&self, raw: &RawItem) -> Result<CanonicalItem> {
        let title = non_empty_str(raw, self.fields.title)
            .ok_or_else(|| PipelineError::malformed(self.source_id, "title missing"))?;

        let link = non_empty_str(raw, self.fields.link).and_then(|link| {
            if is_absolute_url(link) {
                Some(link.to_string())
            } else {
                debug!("Dropping non-absolute link '{}' from {}", link, self.source_id);
                None
            }
        });

        let published_at = non_empty_str(raw, self.fields.published_at).map(canonical_timestamp);

        let image = non_empty_str(raw, self.fields.image)
            .unwrap_or(&self.placeholder_image)
            .to_string();

        Ok(CanonicalItem {
            title: title.to_string(),
            link,
            published_at,
            image,
        })
    }

    fn source_id(&self) -> &str {
        self.source_id
    }
}

fn non_empty_str<'a>(raw: &'a Value, field: &str) -> Option<&'a str> {
    raw.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn is_absolute_url(link: &str) -> bool {
    Url::parse(link).map(|u| u.has_host()).unwrap_or(false)
}

/// RFC 3339 and RFC 2822 timestamps are rewritten to `YYYY-MM-DDTHH:MM:SSZ`
/// so string order is chronological across providers. Anything else passes
/// through untouched.
pub fn canonical_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|_| raw.to_string())
}

/// Registry of source-specific normalizers
pub struct NormalizationRegistry {
    normalizers: HashMap<String, Box<dyn SourceNormalizer>>,
}

impl NormalizationRegistry {
    /// Registry with the built-in provider mappings
    pub fn new(placeholder_image: &str) -> Self {
        let mut registry = Self {
            normalizers: HashMap::new(),
        };
        registry.register(Box::new(MappedNormalizer::newsapi(placeholder_image)));
        registry.register(Box::new(MappedNormalizer::rss(placeholder_image)));
        registry
    }

    pub fn register(&mut self, normalizer: Box<dyn SourceNormalizer>) {
        self.normalizers.insert(normalizer.source_id().to_string(), normalizer);
    }

    pub fn normalize(&self, source_id: &str, raw: &RawItem) -> Result<CanonicalItem> {
        match self.normalizers.get(source_id) {
            Some(normalizer) => normalizer.normalize(raw),
            None => Err(PipelineError::Config(format!(
                "No normalizer registered for source: {source_id}"
            ))),
        }
    }

    pub fn list_sources(&self) -> Vec<&str> {
        self.normalizers.keys().map(|k| k.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PLACEHOLDER: &str = "https://img.example/placeholder.jpg";

    #[test]
    fn test_newsapi_field_mapping() {
        let normalizer = MappedNormalizer::newsapi(PLACEHOLDER);
        let item = normalizer
            .normalize(&json!({
                "source": {"id": null, "name": "Example"},
                "title": "Drone corridor approved",
                "url": "https://news.example/corridor",
                "urlToImage": "https://img.example/corridor.jpg",
                "publishedAt": "2024-01-02T08:15:00Z"
            }))
            .unwrap();

        assert_eq!(item.title, "Drone corridor approved");
        assert_eq!(item.link.as_deref(), Some("https://news.example/corridor"));
        assert_eq!(item.image, "https://img.example/corridor.jpg");
        assert_eq!(item.published_at.as_deref(), Some("2024-01-02T08:15:00Z"));
    }

    #[test]
    fn test_missing_or_empty_image_gets_placeholder() {
        let normalizer = MappedNormalizer::newsapi(PLACEHOLDER);
        let null_image = normalizer
            .normalize(&json!({"title": "A", "url": "https://a.example", "urlToImage": null}))
            .unwrap();
        let empty_image = normalizer
            .normalize(&json!({"title": "B", "url": "https://b.example", "urlToImage": ""}))
            .unwrap();

        assert_eq!(null_image.image, PLACEHOLDER);
        assert_eq!(empty_image.image, PLACEHOLDER);
    }

    #[test]
    fn test_missing_timestamp_passes_through_as_null() {
        let normalizer = MappedNormalizer::rss(PLACEHOLDER);
        let item = normalizer
            .normalize(&json!({"title": "A", "link": "https://a.example/1", "published": null}))
            .unwrap();
        assert!(item.published_at.is_none());
        assert_eq!(item.image, PLACEHOLDER);
    }

    #[test]
    fn test_missing_title_is_malformed() {
        let normalizer = MappedNormalizer::newsapi(PLACEHOLDER);
        for raw in [json!({"url": "https://a.example"}), json!({"title": "   "}), json!({"title": null})] {
            let err = normalizer.normalize(&raw).unwrap_err();
            assert!(matches!(err, PipelineError::MalformedSourceRecord { .. }));
        }
    }

    #[test]
    fn test_relative_link_is_dropped() {
        let normalizer = MappedNormalizer::rss(PLACEHOLDER);
        let item = normalizer
            .normalize(&json!({"title": "A", "link": "/articles/1"}))
            .unwrap();
        assert!(item.link.is_none());
    }

    #[test]
    fn test_timestamps_are_canonicalized() {
        assert_eq!(canonical_timestamp("Tue, 02 Jan 2024 10:30:00 GMT"), "2024-01-02T10:30:00Z");
        assert_eq!(canonical_timestamp("2024-01-02T16:00:00+05:30"), "2024-01-02T10:30:00Z");
        assert_eq!(canonical_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn test_registry_dispatches_by_source() {
        let registry = NormalizationRegistry::new(PLACEHOLDER);
        let mut sources = registry.list_sources();
        sources.sort();
        let mut supported = crate::constants::get_supported_sources();
        supported.sort();
        assert_eq!(sources, supported);

        let item = registry
            .normalize(GOOGLE_RSS_SOURCE, &json!({"title": "A", "link": "https://a.example/1"}))
            .unwrap();
        assert_eq!(item.link.as_deref(), Some("https://a.example/1"));

        assert!(matches!(
            registry.normalize("unknown", &json!({"title": "A"})),
            Err(PipelineError::Config(_))
        ));
    }
}
