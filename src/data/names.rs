//! Professor name keys and listing-name matching.
//!
//! A [`NameKey`] is decoded verbatim from the request and used as-is for the
//! cache; only the listing comparison works on the lowercased/trimmed form.

use serde::{Deserialize, Serialize};

use crate::data::json::parse_json_with_context;

/// First/last name pair identifying a professor lookup.
///
/// Equality is exact on both fields, so `"Jane"` and `"jane"` are distinct keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameKey {
    #[serde(rename = "FirstName", alias = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "LastName", alias = "lastName", default)]
    pub last_name: String,
}

/// Returned when no form key in a request decodes into a [`NameKey`].
#[derive(Debug, thiserror::Error)]
pub enum NameKeyError {
    #[error("request body contains no form keys")]
    Empty,
    #[error("none of {count} form keys is a valid name object")]
    Undecodable { count: usize },
}

impl NameKey {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Lowercased, trimmed copy used when comparing against scraped listings.
    pub fn normalized(&self) -> NameKey {
        NameKey {
            first_name: normalize(&self.first_name),
            last_name: normalize(&self.last_name),
        }
    }

    /// Search-query fragment: `first+last`, each half percent-encoded.
    pub fn query_fragment(&self) -> String {
        format!(
            "{}+{}",
            urlencoding::encode(&self.first_name),
            urlencoding::encode(&self.last_name)
        )
    }

    /// Decode a name key from form keys, where each key is itself a JSON object.
    ///
    /// Keys are tried in order and the last one that decodes wins. Keys that
    /// fail to decode are logged and skipped.
    pub fn from_form_keys<'a, I>(keys: I) -> Result<NameKey, NameKeyError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut count = 0;
        let mut decoded = None;

        for key in keys {
            count += 1;
            tracing::debug!(key, "rateProf form key");
            match parse_json_with_context::<NameKey>(key) {
                Ok(name) => decoded = Some(name),
                Err(e) => tracing::debug!(error = %e, "Skipping undecodable form key"),
            }
        }

        match decoded {
            Some(name) => Ok(name),
            None if count == 0 => Err(NameKeyError::Empty),
            None => Err(NameKeyError::Undecodable { count }),
        }
    }
}

impl std::fmt::Display for NameKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Split a search-result listing of the form `"Last, First"` into a normalized key.
///
/// Anything after a second comma is ignored. Returns `None` when the text has
/// no comma at all.
pub fn parse_listing_name(listing: &str) -> Option<NameKey> {
    let mut parts = listing.split(',');
    let last = parts.next()?;
    let first = parts.next()?;
    Some(NameKey {
        first_name: normalize(first),
        last_name: normalize(last),
    })
}
