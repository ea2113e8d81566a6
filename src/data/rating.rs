//! Scraped rating values and the records built from them.

use serde::{Deserialize, Deserializer, Serialize};

/// Metric labels a scrape can produce.
pub mod labels {
    pub const QUALITY: &str = "Quality";
    pub const DIFFICULTY: &str = "Difficulty";
    pub const WOULD_TAKE_AGAIN: &str = "Would Take Again";
}

/// A single scraped metric. `content` is the page text as-is, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingValue {
    pub name: String,
    pub content: String,
}

impl RatingValue {
    pub fn new(name: &str, content: impl Into<String>) -> Self {
        Self {
            name: name.to_owned(),
            content: content.into(),
        }
    }
}

/// Metrics for one professor, in extraction order. Empty means nothing was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub values: Vec<RatingValue>,
}

impl RatingRecord {
    pub fn new(values: Vec<RatingValue>) -> Self {
        Self { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Content of the first value with the given label.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.content.as_str())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RatingValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RatingValue>>::deserialize(deserializer)?.unwrap_or_default())
}
