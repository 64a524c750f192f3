use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;

/// Write one stage's output as a pretty-printed JSON array, creating the
/// parent directory when needed.
pub fn write_stage<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)?;
    info!("💾 Saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read a stage's output. A missing file is an empty array; a file that
/// exists but does not parse is an error.
pub fn read_stage<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        warn!("{} not found, treating as empty. Run the upstream stage first.", path.display());
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::types::{CanonicalItem, SocialPost};

    #[test]
    fn test_round_trip_preserves_order_and_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("articles.json");
        let items = vec![
            CanonicalItem {
                title: "ड्रोन नीति नई".to_string(),
                link: Some("https://a.example/1".to_string()),
                published_at: Some("2024-01-02T00:00:00Z".to_string()),
                image: "https://img.example/1.jpg".to_string(),
            },
            CanonicalItem {
                title: "Second".to_string(),
                link: None,
                published_at: None,
                image: "https://img.example/2.jpg".to_string(),
            },
        ];

        write_stage(&path, &items).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("ड्रोन"));
        assert!(raw.contains("\"publishedAt\""));

        let back: Vec<CanonicalItem> = read_stage(&path).unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let posts: Vec<SocialPost> = read_stage(&dir.path().join("social_posts.json")).unwrap();
        assert!(posts.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summaries.json");
        std::fs::write(&path, "{not json").unwrap();
        let result: Result<Vec<SocialPost>> = read_stage(&path);
        assert!(matches!(result, Err(PipelineError::Json(_))));
    }
}
